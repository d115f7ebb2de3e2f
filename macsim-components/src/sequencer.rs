// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The clear/accumulate state machine.
//!
//! Only the node at the root of a pipeline keeps a running sum. Every other
//! node passes this tick's partial sum straight on.

use macsim_fixed::fixed::FixedPoint;
use num::BigInt;

use crate::chain::ChainLink;

/// Whether a sequencer keeps history between ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequencerMode {
    /// Sum across ticks until the next clear.
    Accumulate,

    /// Each tick is a fresh partial sum.
    PassThrough,
}

/// The running sum owned by an accumulating node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccumulatorState {
    pub running_sum: FixedPoint,

    /// Set once any data has been summed since the last clear.
    pub running_valid: bool,
}

pub struct AccumulatorSequencer {
    mode: SequencerMode,
    width: u32,
    state: AccumulatorState,
}

impl AccumulatorSequencer {
    #[must_use]
    pub fn new(mode: SequencerMode, width: u32) -> Self {
        Self {
            mode,
            width,
            state: AccumulatorState {
                running_sum: FixedPoint::zero(width),
                running_valid: false,
            },
        }
    }

    #[must_use]
    pub fn mode(&self) -> SequencerMode {
        self.mode
    }

    #[must_use]
    pub fn state(&self) -> &AccumulatorState {
        &self.state
    }

    /// Advance one tick.
    ///
    /// `contribution` is the exact sum of everything valid arriving this
    /// tick, or `None` when nothing valid arrived. A clear restarts the sum
    /// from this tick's contribution alone. The returned link is valid only
    /// when something was summed this tick.
    pub fn step(&mut self, clear: bool, contribution: Option<BigInt>) -> ChainLink {
        let valid = contribution.is_some();
        match self.mode {
            SequencerMode::PassThrough => {
                let sum = contribution.unwrap_or_default();
                ChainLink::new(FixedPoint::wrapping(sum, self.width), valid)
            }
            SequencerMode::Accumulate => {
                let base = if clear {
                    BigInt::default()
                } else {
                    self.state.running_sum.value().clone()
                };
                if clear {
                    self.state.running_valid = false;
                }
                if let Some(contribution) = contribution {
                    self.state.running_sum = FixedPoint::wrapping(base + contribution, self.width);
                    self.state.running_valid = true;
                } else if clear {
                    self.state.running_sum = FixedPoint::zero(self.width);
                }
                ChainLink::new(self.state.running_sum.clone(), valid)
            }
        }
    }
}
