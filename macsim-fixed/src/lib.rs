// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Exact fixed-point arithmetic for the MACSIM pipeline models.
//!
//! Values are arbitrary precision integers tagged with a bit width. Widths
//! only shrink through [`FixedPoint::resize`](fixed::FixedPoint::resize),
//! which reports overflow and optionally saturates, or through
//! [`FixedPoint::shift_right_round`](fixed::FixedPoint::shift_right_round),
//! which applies one of the [`RoundingPolicy`](rounding::RoundingPolicy)
//! variants.
//!
//! The [`AccumulatorConfig`](accumulator::AccumulatorConfig) describes the
//! final accumulation of a chain and must be validated into an
//! [`Accumulator`](accumulator::Accumulator) before use. Validation makes
//! sure enough [guard bits](guard::guard_bits) are available.
//!
//! # Example
//!
//! ```rust
//! use macsim_fixed::fixed::FixedPoint;
//! use macsim_fixed::rounding::RoundingPolicy;
//!
//! let five = FixedPoint::from_i64(5, 4).unwrap();
//! let rounded = five.shift_right_round(1, RoundingPolicy::Nearest);
//! assert_eq!(rounded.to_i64(), Some(3));
//! ```

pub mod accumulator;
pub mod fixed;
pub mod guard;
pub mod rounding;
pub mod unsigned;
