// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Building blocks of a multiply-accumulate pipeline.
//!
//! Everything here is advanced explicitly, one call to `tick` per clock tick.
//! The [`MacStage`](mac_stage::MacStage) is the main component. It is built
//! from [`DelayLine`](delay::DelayLine)s for its registers and an
//! [`AccumulatorSequencer`](sequencer::AccumulatorSequencer) for the
//! clear/accumulate behaviour, and passes partial sums to its neighbour as a
//! [`ChainLink`](chain::ChainLink).

pub mod chain;
pub mod clear;
pub mod delay;
pub mod mac_stage;
pub mod sequencer;
pub mod skew;
