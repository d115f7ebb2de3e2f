// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Guard bit calculation.
//!
//! Summing `N` values of `w` bits needs at most `w + ceil(log2(N))` bits. The
//! extra high-order bits are the guard bits.

use log::warn;

/// The result of a guard bit calculation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GuardBits {
    /// Number of guard bits to reserve.
    pub bits: u32,

    /// Set when fewer bits were available than required.
    pub clamped: bool,
}

/// `ceil(log2(num_summands))`, or `None` when the count is unknown (zero).
#[must_use]
pub fn required_guard_bits(num_summands: u64) -> Option<u32> {
    match num_summands {
        0 => None,
        1 => Some(0),
        n => Some(u64::BITS - (n - 1).leading_zeros()),
    }
}

/// Compute the guard bits for `num_summands`, limited to `max_available`.
///
/// An unknown number of summands (zero) takes every available bit.
#[must_use]
pub fn guard_bits(num_summands: u64, max_available: u32) -> GuardBits {
    match required_guard_bits(num_summands) {
        None => GuardBits {
            bits: max_available,
            clamped: false,
        },
        Some(required) if required > max_available => {
            warn!(
                "{num_summands} summands need {required} guard bits but only {max_available} are available; accumulation may wrap"
            );
            GuardBits {
                bits: max_available,
                clamped: true,
            }
        }
        Some(required) => GuardBits {
            bits: required,
            clamped: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil_log2() {
        assert_eq!(required_guard_bits(0), None);
        assert_eq!(required_guard_bits(1), Some(0));
        assert_eq!(required_guard_bits(2), Some(1));
        assert_eq!(required_guard_bits(3), Some(2));
        assert_eq!(required_guard_bits(4), Some(2));
        assert_eq!(required_guard_bits(5), Some(3));
        assert_eq!(required_guard_bits(1024), Some(10));
        assert_eq!(required_guard_bits(1025), Some(11));
        assert_eq!(required_guard_bits(u64::MAX), Some(64));
    }

    #[test]
    fn unknown_count_uses_everything() {
        assert_eq!(
            guard_bits(0, 12),
            GuardBits {
                bits: 12,
                clamped: false
            }
        );
    }

    #[test]
    fn clamped() {
        assert_eq!(
            guard_bits(1000, 8),
            GuardBits {
                bits: 8,
                clamped: true
            }
        );
        assert_eq!(
            guard_bits(256, 8),
            GuardBits {
                bits: 8,
                clamped: false
            }
        );
    }
}
