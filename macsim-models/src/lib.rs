// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Multiply-accumulate pipelines.
//!
//! A [`Topology`](topology::Topology) describes how stages are chained and
//! combined, the [`PipelineBuilder`](pipeline::PipelineBuilder) validates it
//! against an accumulator configuration and the resulting
//! [`Pipeline`](pipeline::Pipeline) is advanced one tick at a time. The
//! [`ReferenceModel`](reference::ReferenceModel) computes the same results
//! without any registers, for checking.

pub mod combiner;
pub mod pipeline;
pub mod reference;
pub mod topology;
