// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Pipeline topologies and their static latency.
//!
//! A topology is either a path of stages, each feeding the chain input of the
//! next, or a tree whose two branches are summed by a combiner. The latency of
//! a stage is its largest input delay plus its output delay. A path adds the
//! latencies of its stages and a tree takes the slower branch plus the
//! combiner's output delay.

use macsim_components::mac_stage::MacStageConfig;
use macsim_engine::types::ConfigError;

/// How a combiner aligns its two branches.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Compensation {
    /// Insert registers on the faster branch.
    #[default]
    Auto,

    /// Use the given registers, which must align the branches exactly.
    Explicit { left: usize, right: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Topology {
    Path(Vec<MacStageConfig>),
    Tree {
        left: Box<Topology>,
        right: Box<Topology>,
        output_delay: usize,
        compensation: Compensation,
    },
}

impl Topology {
    #[must_use]
    pub fn path(stages: Vec<MacStageConfig>) -> Self {
        Topology::Path(stages)
    }

    /// A tree with automatic latency compensation.
    #[must_use]
    pub fn tree(left: Topology, right: Topology, output_delay: usize) -> Self {
        Topology::Tree {
            left: Box::new(left),
            right: Box::new(right),
            output_delay,
            compensation: Compensation::Auto,
        }
    }

    /// Number of input lanes, one per stage.
    #[must_use]
    pub fn num_lanes(&self) -> usize {
        match self {
            Topology::Path(stages) => stages.len(),
            Topology::Tree { left, right, .. } => left.num_lanes() + right.num_lanes(),
        }
    }

    /// The stage configurations in lane order.
    #[must_use]
    pub fn lane_configs(&self) -> Vec<&MacStageConfig> {
        match self {
            Topology::Path(stages) => stages.iter().collect(),
            Topology::Tree { left, right, .. } => {
                let mut configs = left.lane_configs();
                configs.extend(right.lane_configs());
                configs
            }
        }
    }
}

/// The compensation registers to insert on each branch of a combiner.
///
/// Automatic compensation delays the faster branch by the difference. With
/// explicit compensation the two branches must line up exactly.
pub fn compensation(
    left_latency: usize,
    right_latency: usize,
    compensation: &Compensation,
) -> Result<(usize, usize), ConfigError> {
    match compensation {
        Compensation::Auto => Ok((
            right_latency.saturating_sub(left_latency),
            left_latency.saturating_sub(right_latency),
        )),
        Compensation::Explicit { left, right } => {
            let aligned_left = left_latency + left;
            let aligned_right = right_latency + right;
            if aligned_left == aligned_right {
                Ok((*left, *right))
            } else {
                Err(ConfigError::MisalignedLatency {
                    left: aligned_left,
                    right: aligned_right,
                })
            }
        }
    }
}

/// Ticks from a logical input to the output of `topology`.
pub fn total_latency(topology: &Topology) -> Result<usize, ConfigError> {
    match topology {
        Topology::Path(stages) => {
            if stages.is_empty() {
                return Err(ConfigError::EmptyChain);
            }
            Ok(stages.iter().map(MacStageConfig::latency).sum())
        }
        Topology::Tree {
            left,
            right,
            output_delay,
            compensation: comp,
        } => {
            let left_latency = total_latency(left)?;
            let right_latency = total_latency(right)?;
            let (left_comp, _) = compensation(left_latency, right_latency, comp)?;
            Ok(left_latency + left_comp + output_delay)
        }
    }
}
