// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Unsigned fixed-point values.
//!
//! These behave like [`FixedPoint`](crate::fixed::FixedPoint) except that a
//! subtraction can underflow. An underflow saturates to zero when clipping
//! and otherwise wraps modulo `2^target_width`.

use std::fmt;

use macsim_engine::sim_error;
use macsim_engine::types::SimError;
use num::{BigInt, BigUint, Integer};
use num_traits::{One, ToPrimitive, Zero};

use crate::fixed::FixedPoint;

/// An immutable unsigned integer that always fits in `width` bits.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UnsignedFixed {
    value: BigUint,
    width: u32,
}

fn unsigned_bits(value: &BigUint) -> u32 {
    value.bits() as u32
}

fn modulus(width: u32) -> BigUint {
    BigUint::one() << width
}

impl UnsignedFixed {
    /// Create a value, checking that it fits in `width` unsigned bits.
    pub fn new(value: impl Into<BigUint>, width: u32) -> Result<Self, SimError> {
        let value = value.into();
        if width == 0 {
            return sim_error!("fixed-point width must be at least 1 bit");
        }
        if unsigned_bits(&value) > width {
            return sim_error!(format!("{value} does not fit in {width} unsigned bits"));
        }
        Ok(Self { value, width })
    }

    /// Create a value from a `u64`, checking that it fits in `width` bits.
    pub fn from_u64(value: u64, width: u32) -> Result<Self, SimError> {
        Self::new(value, width)
    }

    #[must_use]
    pub fn value(&self) -> &BigUint {
        &self.value
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The value as a `u64` if it fits.
    #[must_use]
    pub fn to_u64(&self) -> Option<u64> {
        self.value.to_u64()
    }

    /// Convert to `target_width` bits, saturating to all ones or wrapping on
    /// overflow.
    #[must_use]
    pub fn resize(&self, target_width: u32, clip: bool) -> (Self, bool) {
        let target_width = target_width.max(1);
        if unsigned_bits(&self.value) <= target_width {
            return (
                Self {
                    value: self.value.clone(),
                    width: target_width,
                },
                false,
            );
        }
        let value = if clip {
            modulus(target_width) - 1u32
        } else {
            &self.value % modulus(target_width)
        };
        (
            Self {
                value,
                width: target_width,
            },
            true,
        )
    }

    /// Add `other` exactly then resize the sum to `target_width`.
    #[must_use]
    pub fn add(&self, other: &Self, target_width: u32, clip: bool) -> (Self, bool) {
        let exact = Self {
            value: &self.value + &other.value,
            width: self.width.max(other.width) + 1,
        };
        exact.resize(target_width, clip)
    }

    /// Subtract `other` then resize the difference to `target_width`.
    ///
    /// A negative difference is an underflow and is reported as overflow.
    #[must_use]
    pub fn sub(&self, other: &Self, target_width: u32, clip: bool) -> (Self, bool) {
        let target_width = target_width.max(1);
        if other.value <= self.value {
            let exact = Self {
                value: &self.value - &other.value,
                width: self.width.max(other.width),
            };
            return exact.resize(target_width, clip);
        }

        let value = if clip {
            BigUint::zero()
        } else {
            let difference = BigInt::from(self.value.clone()) - BigInt::from(other.value.clone());
            let wrapped = difference.mod_floor(&BigInt::from(modulus(target_width)));
            wrapped.to_biguint().unwrap_or_default()
        };
        (
            Self {
                value,
                width: target_width,
            },
            true,
        )
    }

    /// Reinterpret as a signed value one bit wider.
    #[must_use]
    pub fn to_signed(&self) -> FixedPoint {
        FixedPoint::wrapping(BigInt::from(self.value.clone()), self.width + 1)
    }
}

impl fmt::Display for UnsignedFixed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:u{}", self.value, self.width)
    }
}
