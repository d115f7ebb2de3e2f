// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Rounding policies applied when low-order bits are discarded.

use std::fmt;
use std::str::FromStr;

use num::{BigInt, Integer};
use num_traits::{One, Signed};
use serde::{Deserialize, Serialize};

/// How to round when shifting a value right.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingPolicy {
    /// Round towards minus infinity (drop the low bits).
    #[default]
    Floor,

    /// Round half up: add half an output LSB then drop the low bits.
    Nearest,

    /// Round towards plus infinity.
    Ceiling,

    /// Round towards zero.
    Truncate,

    /// Round away from zero.
    AwayFromZero,
}

fn floor_shift(value: &BigInt, n: u32) -> BigInt {
    value.div_floor(&(BigInt::one() << n))
}

fn ceiling_shift(value: &BigInt, n: u32) -> BigInt {
    -floor_shift(&-value, n)
}

impl RoundingPolicy {
    /// All policies, in declaration order.
    pub const ALL: [RoundingPolicy; 5] = [
        RoundingPolicy::Floor,
        RoundingPolicy::Nearest,
        RoundingPolicy::Ceiling,
        RoundingPolicy::Truncate,
        RoundingPolicy::AwayFromZero,
    ];

    /// Divide `value` by `2^n` and round the quotient.
    ///
    /// This is the exact integer result. Callers are responsible for the
    /// width of the result.
    #[must_use]
    pub fn round_shift(self, value: &BigInt, n: u32) -> BigInt {
        if n == 0 {
            return value.clone();
        }
        match self {
            RoundingPolicy::Floor => floor_shift(value, n),
            RoundingPolicy::Nearest => floor_shift(&(value + (BigInt::one() << (n - 1))), n),
            RoundingPolicy::Ceiling => ceiling_shift(value, n),
            RoundingPolicy::Truncate => {
                if value.is_negative() {
                    ceiling_shift(value, n)
                } else {
                    floor_shift(value, n)
                }
            }
            RoundingPolicy::AwayFromZero => {
                if value.is_negative() {
                    floor_shift(value, n)
                } else {
                    ceiling_shift(value, n)
                }
            }
        }
    }
}

impl fmt::Display for RoundingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RoundingPolicy::Floor => write!(f, "floor"),
            RoundingPolicy::Nearest => write!(f, "nearest"),
            RoundingPolicy::Ceiling => write!(f, "ceiling"),
            RoundingPolicy::Truncate => write!(f, "truncate"),
            RoundingPolicy::AwayFromZero => write!(f, "away_from_zero"),
        }
    }
}

impl FromStr for RoundingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoundingPolicy::ALL
            .into_iter()
            .find(|policy| policy.to_string() == s)
            .ok_or_else(|| {
                format!(
                    "unknown rounding policy '{s}', expected one of floor, nearest, ceiling, truncate, away_from_zero"
                )
            })
    }
}
