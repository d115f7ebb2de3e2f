// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Sums the outputs of two branches of a tree.
//!
//! The faster branch is delayed by compensation registers so that the two
//! partial sums being added come from the same logical input tick. A combiner
//! at the root of a pipeline keeps the running sum and sees the `clear` flag
//! delayed to the same point.

use std::rc::Rc;

use macsim_components::chain::ChainLink;
use macsim_components::delay::DelayLine;
use macsim_components::mac_stage::MacResult;
use macsim_components::sequencer::{AccumulatorSequencer, SequencerMode};
use macsim_fixed::accumulator::Accumulator;
use macsim_track::entity::{Entity, GetEntity};
use macsim_track::{debug, trace};
use num::BigInt;

/// Static configuration of a [`Combiner`].
pub struct CombinerConfig {
    pub left_latency: usize,
    pub right_latency: usize,
    pub left_compensation: usize,
    pub right_compensation: usize,
    pub output_delay: usize,
}

impl CombinerConfig {
    /// Latency of both branches after compensation.
    #[must_use]
    pub fn aligned_latency(&self) -> usize {
        (self.left_latency + self.left_compensation)
            .max(self.right_latency + self.right_compensation)
    }

    /// Ticks from a logical input to the combiner output.
    #[must_use]
    pub fn latency(&self) -> usize {
        self.aligned_latency() + self.output_delay
    }
}

pub struct Combiner {
    pub entity: Rc<Entity>,
    accumulator: Accumulator,
    root: bool,

    left: DelayLine<ChainLink>,
    right: DelayLine<ChainLink>,
    clear: DelayLine<bool>,

    sequencer: AccumulatorSequencer,
    output: DelayLine<ChainLink>,
}

impl GetEntity for Combiner {
    fn entity(&self) -> &Rc<Entity> {
        &self.entity
    }
}

impl Combiner {
    #[must_use]
    pub fn new(
        parent: &Rc<Entity>,
        name: &str,
        config: &CombinerConfig,
        accumulator: &Accumulator,
        root: bool,
    ) -> Self {
        let entity = Rc::new(Entity::new(parent, name));
        let width = accumulator.accumulator_width();
        let mode = if root {
            SequencerMode::Accumulate
        } else {
            SequencerMode::PassThrough
        };

        debug!(entity ; "compensation left {}, right {}, latency {}, {mode:?}",
            config.left_compensation, config.right_compensation, config.latency());

        Self {
            entity,
            accumulator: accumulator.clone(),
            root,
            left: DelayLine::new(config.left_compensation, ChainLink::invalid(width)),
            right: DelayLine::new(config.right_compensation, ChainLink::invalid(width)),
            clear: DelayLine::new(config.aligned_latency(), false),
            sequencer: AccumulatorSequencer::new(mode, width),
            output: DelayLine::new(config.output_delay, ChainLink::invalid(width)),
        }
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.root
    }

    /// Advance one tick.
    ///
    /// `left` and `right` are this tick's branch outputs and `clear` is the
    /// logical clear flag presented to the pipeline this tick.
    pub fn tick(
        &mut self,
        left: &ChainLink,
        right: &ChainLink,
        clear: bool,
    ) -> (ChainLink, Option<MacResult>) {
        let left = self.left.tick(left.clone());
        let right = self.right.tick(right.clone());
        let clear = self.clear.tick(clear);

        let mut contribution: Option<BigInt> = None;
        for link in [&left, &right] {
            if link.valid {
                contribution =
                    Some(contribution.unwrap_or_default() + link.partial_sum.value());
            }
        }

        if clear && self.root {
            debug!(self.entity ; "clear");
        }
        let link = self.sequencer.step(clear, contribution);
        let link = self.output.tick(link);
        trace!(self.entity ; "{left} + {right} -> {link}");

        let result = if self.root {
            Some(MacResult::from_link(&self.accumulator, link.clone()))
        } else {
            None
        };
        (link, result)
    }
}
