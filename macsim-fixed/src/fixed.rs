// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Signed fixed-point values.
//!
//! A [`FixedPoint`] is an exact integer tagged with the number of two's
//! complement bits it occupies. Operations that can grow a value return a
//! wider result, so nothing is ever lost implicitly. The only operations that
//! drop bits are [`FixedPoint::resize`] and [`FixedPoint::shift_right_round`],
//! and both report or define exactly what happens to the discarded bits.

use std::fmt;

use macsim_engine::sim_error;
use macsim_engine::types::SimError;
use num::{BigInt, Integer};
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::rounding::RoundingPolicy;

/// An immutable signed integer that always fits in `width` bits.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FixedPoint {
    value: BigInt,
    width: u32,
}

/// Number of bits needed to hold `value` as a two's complement number.
#[must_use]
pub fn signed_bits(value: &BigInt) -> u32 {
    let magnitude = if value.is_negative() {
        -(value + BigInt::one())
    } else {
        value.clone()
    };
    (magnitude.bits() as u32).saturating_add(1)
}

fn pow2(n: u32) -> BigInt {
    BigInt::one() << n
}

fn max_for(width: u32) -> BigInt {
    pow2(width - 1) - 1
}

fn min_for(width: u32) -> BigInt {
    -pow2(width - 1)
}

/// Reduce `value` modulo `2^width` into the signed range.
fn wrap(value: &BigInt, width: u32) -> BigInt {
    let modulus = pow2(width);
    let reduced = value.mod_floor(&modulus);
    if reduced >= pow2(width - 1) {
        reduced - modulus
    } else {
        reduced
    }
}

impl FixedPoint {
    /// Create a value, checking that it fits in `width` signed bits.
    pub fn new(value: impl Into<BigInt>, width: u32) -> Result<Self, SimError> {
        let value = value.into();
        if width == 0 {
            return sim_error!("fixed-point width must be at least 1 bit");
        }
        if signed_bits(&value) > width {
            return sim_error!(format!("{value} does not fit in {width} signed bits"));
        }
        Ok(Self { value, width })
    }

    /// Create a value from an `i64`, checking that it fits in `width` bits.
    pub fn from_i64(value: i64, width: u32) -> Result<Self, SimError> {
        Self::new(value, width)
    }

    /// Create a value by keeping only the low `width` bits of `value`.
    ///
    /// A `width` of zero is treated as one bit.
    #[must_use]
    pub fn wrapping(value: impl Into<BigInt>, width: u32) -> Self {
        let width = width.max(1);
        Self {
            value: wrap(&value.into(), width),
            width,
        }
    }

    /// Create a zero of the given width.
    #[must_use]
    pub fn zero(width: u32) -> Self {
        Self {
            value: BigInt::zero(),
            width: width.max(1),
        }
    }

    /// The most positive value representable in `width` bits (`0111…1`).
    #[must_use]
    pub fn max_value(width: u32) -> Self {
        let width = width.max(1);
        Self {
            value: max_for(width),
            width,
        }
    }

    /// The most negative value representable in `width` bits (`1000…0`).
    #[must_use]
    pub fn min_value(width: u32) -> Self {
        let width = width.max(1);
        Self {
            value: min_for(width),
            width,
        }
    }

    #[must_use]
    pub fn value(&self) -> &BigInt {
        &self.value
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The value as an `i64` if it fits.
    #[must_use]
    pub fn to_i64(&self) -> Option<i64> {
        self.value.to_i64()
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Convert to `target_width` bits.
    ///
    /// Widening sign-extends and never overflows. Narrowing overflows when a
    /// discarded bit differs from the new sign bit. On overflow the result
    /// saturates towards the sign of the original value if `clip` is set,
    /// otherwise the high bits are dropped.
    ///
    /// A `target_width` of zero is treated as one bit.
    #[must_use]
    pub fn resize(&self, target_width: u32, clip: bool) -> (Self, bool) {
        let target_width = target_width.max(1);
        if signed_bits(&self.value) <= target_width {
            return (
                Self {
                    value: self.value.clone(),
                    width: target_width,
                },
                false,
            );
        }

        let value = if clip {
            if self.value.is_negative() {
                min_for(target_width)
            } else {
                max_for(target_width)
            }
        } else {
            wrap(&self.value, target_width)
        };
        (
            Self {
                value,
                width: target_width,
            },
            true,
        )
    }

    /// Discard the low `n` bits, rounding according to `policy`.
    ///
    /// `n = 0` returns the value unchanged. Otherwise the result is
    /// `max(width - n, 1) + 1` bits wide: the remaining integer bits plus one
    /// for a rounding carry. Shifting out every bit (`n >= width`) still
    /// leaves two bits, the sign and the carry, rather than a single bit.
    #[must_use]
    pub fn shift_right_round(&self, n: u32, policy: RoundingPolicy) -> Self {
        if n == 0 {
            return self.clone();
        }
        Self {
            value: policy.round_shift(&self.value, n),
            width: self.width.saturating_sub(n).max(1) + 1,
        }
    }

    fn exact_width(&self, other: &Self) -> u32 {
        self.width.max(other.width) + 1
    }

    /// Add `other` exactly then resize the sum to `target_width`.
    #[must_use]
    pub fn add(&self, other: &Self, target_width: u32, clip: bool) -> (Self, bool) {
        let exact = Self {
            value: &self.value + &other.value,
            width: self.exact_width(other),
        };
        exact.resize(target_width, clip)
    }

    /// Subtract `other` exactly then resize the difference to `target_width`.
    #[must_use]
    pub fn sub(&self, other: &Self, target_width: u32, clip: bool) -> (Self, bool) {
        let exact = Self {
            value: &self.value - &other.value,
            width: self.exact_width(other),
        };
        exact.resize(target_width, clip)
    }

    /// Full-precision product, `width_l + width_r` bits wide.
    #[must_use]
    pub fn mul(&self, other: &Self) -> Self {
        Self {
            value: &self.value * &other.value,
            width: self.width + other.width,
        }
    }

    /// Negation, one bit wider so that negating the minimum value is exact.
    #[must_use]
    pub fn neg(&self) -> Self {
        Self {
            value: -&self.value,
            width: self.width + 1,
        }
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:s{}", self.value, self.width)
    }
}
