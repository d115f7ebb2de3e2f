// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Drive random dot products through a multiply-accumulate pipeline.
//!
//! The pipeline is described by a platform file. Each logical tick the same
//! inputs are given to the pipeline and to a reference model, and every result
//! leaving the pipeline `pipeline_latency` ticks later is compared against the
//! reference.

pub mod config;
pub mod stimulus;
