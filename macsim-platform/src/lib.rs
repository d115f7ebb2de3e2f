// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Build a pipeline described by a YAML file.
//!
//! # Example
//!
//! ```rust
//! use macsim_engine::test_helpers::start_test;
//! use macsim_platform::Platform;
//!
//! let top = start_test(file!());
//! let platform = Platform::from_string(
//!     &top,
//!     "
//! accumulator:
//!   product_width: 16
//!   num_summands: 8
//! topology:
//!   path:
//!     - { input_delay_a: 1, input_delay_b: 1 }
//!     - { output_delay: 2 }
//! ",
//! )
//! .unwrap();
//! assert_eq!(platform.pipeline().pipeline_latency(), 4);
//! ```

use std::fmt;
use std::path::Path;
use std::rc::Rc;

use macsim_engine::types::SimError;
use macsim_fixed::accumulator::Accumulator;
use macsim_models::pipeline::Pipeline;
use macsim_models::reference::ReferenceModel;
use macsim_models::topology::Topology;
use macsim_track::entity::{Entity, GetEntity};
use macsim_track::info;

use crate::builder::{build_accumulator_config, build_topology};
use crate::types::PlatformConfig;

pub mod builder;
pub mod types;

const DEFAULT_PIPELINE_NAME: &str = "pipe";

pub struct Platform {
    entity: Rc<Entity>,
    accumulator: Accumulator,
    topology: Topology,
    pipeline: Pipeline,
}

impl GetEntity for Platform {
    fn entity(&self) -> &Rc<Entity> {
        &self.entity
    }
}

impl Platform {
    pub fn from_file(parent: &Rc<Entity>, platform_path: &Path) -> Result<Self, SimError> {
        let s = std::fs::read_to_string(platform_path)
            .map_err(|e| SimError(format!("Unable to read {}: {e}", platform_path.display())))?;
        Platform::from_string(parent, &s)
    }

    pub fn from_string(parent: &Rc<Entity>, platform_config: &str) -> Result<Self, SimError> {
        let cfg: PlatformConfig = serde_yaml::from_str(platform_config)
            .map_err(|e| SimError(format!("serde_yaml::from_str failed: {e}")))?;
        Platform::build(parent, &cfg)
    }

    fn build(parent: &Rc<Entity>, cfg: &PlatformConfig) -> Result<Self, SimError> {
        let accumulator = build_accumulator_config(cfg.accumulator.as_ref()).validate()?;
        let topology = build_topology(&cfg.topology, "topology")?;

        let entity = Rc::new(Entity::new(parent, "platform"));
        let name = cfg.name.as_deref().unwrap_or(DEFAULT_PIPELINE_NAME);
        let pipeline = Pipeline::new(&entity, name, &accumulator, &topology)?;
        info!(entity ; "built {} with {} lanes", pipeline.entity(), pipeline.num_lanes());

        Ok(Self {
            entity,
            accumulator,
            topology,
            pipeline,
        })
    }

    #[must_use]
    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut Pipeline {
        &mut self.pipeline
    }

    /// A fresh reference model with the same arithmetic as the pipeline.
    #[must_use]
    pub fn reference_model(&self) -> ReferenceModel {
        ReferenceModel::new(&self.accumulator, &self.topology)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.accumulator.config();
        writeln!(f, "Pipeline: {}", self.pipeline.entity())?;
        writeln!(f, "  lanes: {}", self.pipeline.num_lanes())?;
        writeln!(f, "  latency: {}", self.pipeline.pipeline_latency())?;
        writeln!(
            f,
            "  accumulator: {} bits ({} product + {} guard)",
            self.accumulator.accumulator_width(),
            config.product_width,
            self.accumulator.guard_bits()
        )?;
        writeln!(
            f,
            "  output: {} bits, shift {}, {}, clip {}, overflow report {}",
            config.output_width,
            config.shift_right,
            config.rounding,
            config.clip_enabled,
            config.overflow_report_enabled
        )?;

        let compensations = self.pipeline.compensations();
        if !compensations.is_empty() {
            writeln!(f, "\nCompensation:")?;
            for c in compensations {
                writeln!(f, "  {}: left {}, right {}", c.name, c.left, c.right)?;
            }
        }
        Ok(())
    }
}
