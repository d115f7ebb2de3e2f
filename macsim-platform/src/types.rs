// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The sections of a platform file.
//!
//! Every optional field falls back to the default documented on it.

use macsim_fixed::rounding::RoundingPolicy;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformConfig {
    /// Name of the pipeline entity. Default `pipe`.
    pub name: Option<String>,
    pub accumulator: Option<AccumulatorSection>,
    pub topology: TopologySection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccumulatorSection {
    /// Default 16.
    pub product_width: Option<u32>,

    /// Default 64. Zero uses every available guard bit.
    pub num_summands: Option<u64>,

    /// Default 80.
    pub max_accumulator_width: Option<u32>,

    /// Default 16.
    pub output_width: Option<u32>,

    /// Default 0.
    pub shift_right: Option<u32>,

    /// Default `floor`.
    pub rounding: Option<RoundingPolicy>,

    /// Default `false`.
    pub clip: Option<bool>,

    /// Default `false`.
    pub overflow_report: Option<bool>,
}

/// Exactly one of `path` and `tree` must be given.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopologySection {
    pub path: Option<Vec<StageSection>>,
    pub tree: Option<Box<TreeSection>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageSection {
    pub input_delay_a: Option<usize>,
    pub input_delay_b: Option<usize>,
    pub input_delay_extra: Option<usize>,

    /// Default 1.
    pub output_delay: Option<usize>,

    /// Default `true`.
    pub accepts_chain_input: Option<bool>,

    /// Default `single`.
    pub product_mode: Option<ProductModeKind>,

    /// Default `add`.
    pub extra_mode: Option<ExtraModeKind>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TreeSection {
    pub left: TopologySection,
    pub right: TopologySection,

    /// Default 1.
    pub output_delay: Option<usize>,

    /// Registers on each branch. Computed automatically when missing.
    pub compensation: Option<CompensationSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompensationSection {
    pub left: usize,
    pub right: usize,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductModeKind {
    Single,
    PreAdd,
    PreSub,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraModeKind {
    Add,
    Subtract,
}
