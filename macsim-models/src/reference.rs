// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! A register-free model of a pipeline's arithmetic.
//!
//! The reference sums every lane of a logical tick at once with exact
//! integers and applies the same clear, wrap, round and resize rules as the
//! root of a pipeline. Its result for tick `t` should equal the pipeline's
//! result for tick `t + pipeline_latency`.

use macsim_components::chain::ChainLink;
use macsim_components::mac_stage::{ExtraMode, MacResult, MacStageConfig, ProductMode};
use macsim_fixed::accumulator::Accumulator;
use macsim_fixed::fixed::FixedPoint;
use num::BigInt;

use crate::pipeline::TickInput;
use crate::topology::Topology;

pub struct ReferenceModel {
    accumulator: Accumulator,
    lanes: Vec<MacStageConfig>,
    running_sum: BigInt,
}

impl ReferenceModel {
    #[must_use]
    pub fn new(accumulator: &Accumulator, topology: &Topology) -> Self {
        Self {
            accumulator: accumulator.clone(),
            lanes: topology.lane_configs().into_iter().cloned().collect(),
            running_sum: BigInt::default(),
        }
    }

    /// The result for one logical tick.
    ///
    /// Lanes beyond those of the topology are ignored.
    pub fn step(&mut self, input: &TickInput) -> MacResult {
        let mut contribution: Option<BigInt> = None;
        for (config, lane) in self.lanes.iter().zip(&input.lanes) {
            if let (Some(a), Some(b)) = (&lane.a, &lane.b) {
                let factor = match (config.product_mode, &lane.d) {
                    (ProductMode::PreAdd, Some(d)) => a.value() + d.value(),
                    (ProductMode::PreSub, Some(d)) => a.value() - d.value(),
                    _ => a.value().clone(),
                };
                let product = factor * b.value();
                let term = if lane.negate { -product } else { product };
                contribution = Some(contribution.unwrap_or_default() + term);
            }
            if let Some(extra) = &lane.extra {
                let term = match config.extra_mode {
                    ExtraMode::Add => extra.value().clone(),
                    ExtraMode::Subtract => -extra.value(),
                };
                contribution = Some(contribution.unwrap_or_default() + term);
            }
        }

        if input.clear {
            self.running_sum = BigInt::default();
        }
        let valid = contribution.is_some();
        if let Some(contribution) = contribution {
            self.running_sum = &self.running_sum + contribution;
        }
        let raw: FixedPoint = self.accumulator.wrap_sum(self.running_sum.clone());
        self.running_sum = raw.value().clone();
        MacResult::from_link(&self.accumulator, ChainLink::new(raw, valid))
    }
}
