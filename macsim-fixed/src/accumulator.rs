// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Accumulator configuration and the final rounding/resize step.

use macsim_engine::types::ConfigError;
use num::BigInt;

use crate::fixed::FixedPoint;
use crate::guard::{guard_bits, required_guard_bits};
use crate::rounding::RoundingPolicy;

/// The widest accumulator assumed when none is given.
pub const DEFAULT_MAX_ACCUMULATOR_WIDTH: u32 = 80;

/// Clipping or overflow reporting needs at least a sign and a value bit.
pub const MIN_REPORTED_OUTPUT_WIDTH: u32 = 2;

/// Configuration of the accumulation performed at the end of a chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccumulatorConfig {
    /// Width of each product entering the accumulator.
    pub product_width: u32,

    /// Number of products summed between clears. Zero means unknown.
    pub num_summands: u64,

    /// Upper limit on the accumulator width.
    pub max_accumulator_width: u32,

    /// Width of the visible result.
    pub output_width: u32,

    /// Number of low-order bits discarded before resizing the result.
    pub shift_right: u32,

    /// How the discarded bits are rounded.
    pub rounding: RoundingPolicy,

    /// Saturate the result instead of wrapping.
    pub clip_enabled: bool,

    /// Report overflow of the result.
    pub overflow_report_enabled: bool,
}

impl AccumulatorConfig {
    #[must_use]
    pub fn new(product_width: u32, num_summands: u64, output_width: u32) -> Self {
        Self {
            product_width,
            num_summands,
            max_accumulator_width: DEFAULT_MAX_ACCUMULATOR_WIDTH,
            output_width,
            shift_right: 0,
            rounding: RoundingPolicy::default(),
            clip_enabled: false,
            overflow_report_enabled: false,
        }
    }

    /// Check the construction invariants and build the [`Accumulator`].
    pub fn validate(&self) -> Result<Accumulator, ConfigError> {
        if self.product_width == 0 {
            return Err(ConfigError::ZeroWidth {
                what: "product_width",
            });
        }
        if self.output_width == 0 {
            return Err(ConfigError::ZeroWidth {
                what: "output_width",
            });
        }
        if self.max_accumulator_width == 0 {
            return Err(ConfigError::ZeroWidth {
                what: "max_accumulator_width",
            });
        }

        let insufficient = || ConfigError::InsufficientGuardBits {
            product_width: self.product_width,
            guard_bits: required_guard_bits(self.num_summands).unwrap_or(0),
            max_accumulator_width: self.max_accumulator_width,
        };
        if self.product_width > self.max_accumulator_width {
            return Err(insufficient());
        }
        let guard = guard_bits(
            self.num_summands,
            self.max_accumulator_width - self.product_width,
        );
        if guard.clamped {
            return Err(insufficient());
        }

        let accumulator_width = self.product_width + guard.bits;
        if self.shift_right > accumulator_width {
            return Err(ConfigError::ShiftTooLarge {
                shift_right: self.shift_right,
                accumulator_width,
            });
        }
        if (self.clip_enabled || self.overflow_report_enabled)
            && self.output_width < MIN_REPORTED_OUTPUT_WIDTH
        {
            return Err(ConfigError::OutputWidthTooSmall {
                output_width: self.output_width,
                minimum: MIN_REPORTED_OUTPUT_WIDTH,
            });
        }

        Ok(Accumulator {
            config: self.clone(),
            guard_bits: guard.bits,
            accumulator_width,
        })
    }
}

/// A validated [`AccumulatorConfig`].
///
/// This is the only way to obtain the accumulator width used by the stages of
/// a chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Accumulator {
    config: AccumulatorConfig,
    guard_bits: u32,
    accumulator_width: u32,
}

impl Accumulator {
    #[must_use]
    pub fn config(&self) -> &AccumulatorConfig {
        &self.config
    }

    #[must_use]
    pub fn guard_bits(&self) -> u32 {
        self.guard_bits
    }

    /// Width of the running sum and of every chain link.
    #[must_use]
    pub fn accumulator_width(&self) -> u32 {
        self.accumulator_width
    }

    #[must_use]
    pub fn product_width(&self) -> u32 {
        self.config.product_width
    }

    /// Keep the low bits of an exact sum as an accumulator value.
    #[must_use]
    pub fn wrap_sum(&self, sum: BigInt) -> FixedPoint {
        FixedPoint::wrapping(sum, self.accumulator_width)
    }

    /// Shift, round and resize a raw accumulator value into the visible
    /// result.
    ///
    /// The overflow flag is only ever set when overflow reporting is enabled.
    /// Without clipping a reported overflow means the result has wrapped.
    #[must_use]
    pub fn finalize(&self, raw: &FixedPoint) -> (FixedPoint, bool) {
        let shifted = raw.shift_right_round(self.config.shift_right, self.config.rounding);
        let (result, overflow) = shifted.resize(self.config.output_width, self.config.clip_enabled);
        (result, overflow && self.config.overflow_report_enabled)
    }
}
