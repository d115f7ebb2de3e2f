// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Shared building blocks for the MACSIM pipeline models.
//!
//! The models are fully synchronous: a single [`Clock`](time::clock::Clock)
//! is advanced once per call to a pipeline's `advance` and all errors are
//! reported through [`SimError`](types::SimError). Errors found while building
//! a pipeline are reported as a [`ConfigError`](types::ConfigError) which
//! names the violated construction invariant.

pub mod test_helpers;
pub mod time;
pub mod types;
