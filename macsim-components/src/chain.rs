// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The partial sum handed from one stage to the next.

use std::fmt;

use macsim_fixed::fixed::FixedPoint;

/// A partial sum and whether it carries data this tick.
///
/// The partial sum is always the width of the chain's accumulator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainLink {
    pub partial_sum: FixedPoint,
    pub valid: bool,
}

impl ChainLink {
    #[must_use]
    pub fn new(partial_sum: FixedPoint, valid: bool) -> Self {
        Self { partial_sum, valid }
    }

    /// A link carrying no data.
    #[must_use]
    pub fn invalid(width: u32) -> Self {
        Self {
            partial_sum: FixedPoint::zero(width),
            valid: false,
        }
    }
}

impl fmt::Display for ChainLink {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.valid {
            write!(f, "{}", self.partial_sum)
        } else {
            write!(f, "-")
        }
    }
}
