// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use macsim_components::mac_stage::{ExtraMode, MacStageConfig, ProductMode};
use macsim_engine::sim_error;
use macsim_engine::types::SimError;
use macsim_fixed::accumulator::{AccumulatorConfig, DEFAULT_MAX_ACCUMULATOR_WIDTH};
use macsim_models::topology::{Compensation, Topology};

use crate::types::{
    AccumulatorSection, ExtraModeKind, ProductModeKind, StageSection, TopologySection,
};

pub const DEFAULT_PRODUCT_WIDTH: u32 = 16;
pub const DEFAULT_NUM_SUMMANDS: u64 = 64;
pub const DEFAULT_OUTPUT_WIDTH: u32 = 16;
pub const DEFAULT_STAGE_OUTPUT_DELAY: usize = 1;
pub const DEFAULT_COMBINER_OUTPUT_DELAY: usize = 1;

#[must_use]
pub fn build_accumulator_config(cfg: Option<&AccumulatorSection>) -> AccumulatorConfig {
    let default_section = AccumulatorSection::default();
    let cfg = cfg.unwrap_or(&default_section);

    let mut config = AccumulatorConfig::new(
        cfg.product_width.unwrap_or(DEFAULT_PRODUCT_WIDTH),
        cfg.num_summands.unwrap_or(DEFAULT_NUM_SUMMANDS),
        cfg.output_width.unwrap_or(DEFAULT_OUTPUT_WIDTH),
    );
    config.max_accumulator_width = cfg
        .max_accumulator_width
        .unwrap_or(DEFAULT_MAX_ACCUMULATOR_WIDTH);
    config.shift_right = cfg.shift_right.unwrap_or(0);
    config.rounding = cfg.rounding.unwrap_or_default();
    config.clip_enabled = cfg.clip.unwrap_or(false);
    config.overflow_report_enabled = cfg.overflow_report.unwrap_or(false);
    config
}

#[must_use]
pub fn build_stage_config(cfg: &StageSection) -> MacStageConfig {
    let product_mode = match cfg.product_mode {
        None | Some(ProductModeKind::Single) => ProductMode::Single,
        Some(ProductModeKind::PreAdd) => ProductMode::PreAdd,
        Some(ProductModeKind::PreSub) => ProductMode::PreSub,
    };
    let extra_mode = match cfg.extra_mode {
        None | Some(ExtraModeKind::Add) => ExtraMode::Add,
        Some(ExtraModeKind::Subtract) => ExtraMode::Subtract,
    };

    MacStageConfig {
        input_delay_a: cfg.input_delay_a.unwrap_or(0),
        input_delay_b: cfg.input_delay_b.unwrap_or(0),
        input_delay_extra: cfg.input_delay_extra.unwrap_or(0),
        output_delay: cfg.output_delay.unwrap_or(DEFAULT_STAGE_OUTPUT_DELAY),
        accepts_chain_input: cfg.accepts_chain_input.unwrap_or(true),
        product_mode,
        extra_mode,
    }
}

/// Convert a topology section into a [`Topology`].
///
/// `location` names the section in error messages, for example
/// `topology.tree.left`.
pub fn build_topology(cfg: &TopologySection, location: &str) -> Result<Topology, SimError> {
    match (&cfg.path, &cfg.tree) {
        (Some(stages), None) => Ok(Topology::path(
            stages.iter().map(build_stage_config).collect(),
        )),
        (None, Some(tree)) => {
            let left = build_topology(&tree.left, &format!("{location}.tree.left"))?;
            let right = build_topology(&tree.right, &format!("{location}.tree.right"))?;
            let compensation = match &tree.compensation {
                None => Compensation::Auto,
                Some(c) => Compensation::Explicit {
                    left: c.left,
                    right: c.right,
                },
            };
            Ok(Topology::Tree {
                left: Box::new(left),
                right: Box::new(right),
                output_delay: tree.output_delay.unwrap_or(DEFAULT_COMBINER_OUTPUT_DELAY),
                compensation,
            })
        }
        (Some(_), Some(_)) => sim_error!(format!("{location}: both 'path' and 'tree' given")),
        (None, None) => sim_error!(format!("{location}: one of 'path' or 'tree' is required")),
    }
}

#[cfg(test)]
mod tests {
    use macsim_fixed::rounding::RoundingPolicy;

    use super::*;

    #[test]
    fn accumulator_defaults() {
        let config = build_accumulator_config(None);
        assert_eq!(config.product_width, DEFAULT_PRODUCT_WIDTH);
        assert_eq!(config.num_summands, DEFAULT_NUM_SUMMANDS);
        assert_eq!(config.max_accumulator_width, DEFAULT_MAX_ACCUMULATOR_WIDTH);
        assert_eq!(config.output_width, DEFAULT_OUTPUT_WIDTH);
        assert_eq!(config.shift_right, 0);
        assert_eq!(config.rounding, RoundingPolicy::Floor);
        assert!(!config.clip_enabled);
        assert!(!config.overflow_report_enabled);
    }

    #[test]
    fn stage_defaults() {
        assert_eq!(
            build_stage_config(&StageSection::default()),
            MacStageConfig::default()
        );
    }

    #[test]
    fn topology_needs_one_kind() {
        let empty = TopologySection {
            path: None,
            tree: None,
        };
        let err = build_topology(&empty, "topology").unwrap_err();
        assert!(err.to_string().contains("topology: one of"), "{err}");
    }
}
