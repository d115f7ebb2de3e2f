// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! A complete multiply-accumulate pipeline.
//!
//! The pipeline owns its stages and combiners in an arena. Nodes are stored
//! upstream first so that a single pass over the arena each tick evaluates
//! every node after the nodes feeding it. A zero output delay is therefore
//! visible downstream in the same tick.
//!
//! Every stage has one input lane. The inputs of all lanes given to
//! [`Pipeline::advance`] form one logical tick: input skew registers delay
//! each lane so that its contribution meets the partial sum from upstream.
//! Only the root node (the last stage of a path or the final combiner of a
//! tree) keeps a running sum and produces the result, which appears
//! [`Pipeline::pipeline_latency`] ticks after the logical input.
//!
//! # Example
//!
//! ```rust
//! use macsim_components::mac_stage::{MacStageConfig, StageInput};
//! use macsim_engine::test_helpers::start_test;
//! use macsim_fixed::accumulator::AccumulatorConfig;
//! use macsim_fixed::fixed::FixedPoint;
//! use macsim_models::pipeline::{PipelineBuilder, TickInput};
//! use macsim_models::topology::Topology;
//!
//! let top = start_test(file!());
//! let topology = Topology::path(vec![MacStageConfig::new(1, 1, 1)]);
//! let mut pipeline = PipelineBuilder::new(AccumulatorConfig::new(8, 4, 10))
//!     .topology(topology)
//!     .build(&top, "pipe")
//!     .unwrap();
//! assert_eq!(pipeline.pipeline_latency(), 2);
//!
//! let fp = |v| FixedPoint::from_i64(v, 4).unwrap();
//! let input = TickInput::new(true, vec![StageInput::factors(fp(3), fp(2))]);
//! pipeline.advance(&input).unwrap();
//! pipeline.advance(&TickInput::idle(1)).unwrap();
//! let result = pipeline.advance(&TickInput::idle(1)).unwrap();
//! assert_eq!(result.raw.to_i64(), Some(6));
//! ```

use std::rc::Rc;

use macsim_components::chain::ChainLink;
use macsim_components::mac_stage::{MacResult, MacStage, StageInput};
use macsim_components::skew::InputSkew;
use macsim_engine::sim_error;
use macsim_engine::time::clock::Clock;
use macsim_engine::types::{ConfigError, SimError};
use macsim_fixed::accumulator::{Accumulator, AccumulatorConfig};
use macsim_track::entity::{Entity, GetEntity};
use macsim_track::{connect, info, set_tick};

use crate::combiner::{Combiner, CombinerConfig};
use crate::topology::{Topology, compensation, total_latency};

/// The inputs presented to a pipeline for one logical tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Start a new accumulation with this tick's contributions.
    pub clear: bool,

    /// One input per stage, in lane order.
    pub lanes: Vec<StageInput>,
}

impl TickInput {
    #[must_use]
    pub fn new(clear: bool, lanes: Vec<StageInput>) -> Self {
        Self { clear, lanes }
    }

    /// A tick with nothing valid on any lane.
    #[must_use]
    pub fn idle(num_lanes: usize) -> Self {
        Self {
            clear: false,
            lanes: vec![StageInput::idle(); num_lanes],
        }
    }
}

/// The compensation registers inserted by one combiner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CombinerCompensation {
    /// Full name of the combiner.
    pub name: String,
    pub left: usize,
    pub right: usize,
}

enum Node {
    Stage {
        stage: MacStage,
        skew: InputSkew,
        lane: usize,
        chain_from: Option<usize>,
    },
    Combiner {
        combiner: Combiner,
        left: usize,
        right: usize,
    },
}

impl Node {
    fn entity(&self) -> &Rc<Entity> {
        match self {
            Node::Stage { stage, .. } => stage.entity(),
            Node::Combiner { combiner, .. } => combiner.entity(),
        }
    }
}

pub struct Pipeline {
    pub entity: Rc<Entity>,
    clock: Clock,
    accumulator: Accumulator,
    nodes: Vec<Node>,
    links: Vec<ChainLink>,
    root: usize,
    num_lanes: usize,
    latency: usize,
    compensations: Vec<CombinerCompensation>,
}

impl GetEntity for Pipeline {
    fn entity(&self) -> &Rc<Entity> {
        &self.entity
    }
}

/// Builds a [`Pipeline`] from an accumulator configuration and a topology.
pub struct PipelineBuilder {
    accumulator: AccumulatorConfig,
    topology: Option<Topology>,
}

impl PipelineBuilder {
    #[must_use]
    pub fn new(accumulator: AccumulatorConfig) -> Self {
        Self {
            accumulator,
            topology: None,
        }
    }

    #[must_use]
    pub fn topology(mut self, topology: Topology) -> Self {
        self.topology = Some(topology);
        self
    }

    /// Validate the configuration and build the pipeline.
    pub fn build(self, parent: &Rc<Entity>, name: &str) -> Result<Pipeline, SimError> {
        let Some(topology) = self.topology else {
            return sim_error!("no topology given to the pipeline builder");
        };
        let accumulator = self.accumulator.validate()?;
        Pipeline::new(parent, name, &accumulator, &topology)
    }
}

/// State used while laying out the arena.
struct Layout<'a> {
    accumulator: &'a Accumulator,
    nodes: Vec<Node>,
    num_lanes: usize,
    compensations: Vec<CombinerCompensation>,
}

impl Layout<'_> {
    /// Add the nodes of `topology`, returning the index of its output node
    /// and its latency.
    fn add(
        &mut self,
        parent: &Rc<Entity>,
        topology: &Topology,
        root: bool,
    ) -> Result<(usize, usize), ConfigError> {
        match topology {
            Topology::Path(stages) => {
                if stages.is_empty() {
                    return Err(ConfigError::EmptyChain);
                }

                let mut upstream_latency = 0;
                let mut chain_from = None;
                for (i, config) in stages.iter().enumerate() {
                    let lane = self.num_lanes;
                    if i > 0 && !config.accepts_chain_input {
                        return Err(ConfigError::InvalidTopology(format!(
                            "stage{lane} follows another stage but does not accept a chain input"
                        )));
                    }

                    let terminal = root && i + 1 == stages.len();
                    let name = format!("stage{lane}");
                    let stage = MacStage::new(parent, &name, config, self.accumulator, terminal);
                    if let Some(from) = chain_from {
                        let from: &Node = &self.nodes[from];
                        connect!(from.entity() ; stage.entity);
                    }

                    self.nodes.push(Node::Stage {
                        stage,
                        skew: InputSkew::new(config, upstream_latency),
                        lane,
                        chain_from,
                    });
                    chain_from = Some(self.nodes.len() - 1);
                    self.num_lanes += 1;
                    upstream_latency += config.latency();
                }
                Ok((self.nodes.len() - 1, upstream_latency))
            }
            Topology::Tree {
                left,
                right,
                output_delay,
                compensation: comp,
            } => {
                let left_entity = Rc::new(Entity::new(parent, "left"));
                let (left_node, left_latency) = self.add(&left_entity, left, false)?;
                let right_entity = Rc::new(Entity::new(parent, "right"));
                let (right_node, right_latency) = self.add(&right_entity, right, false)?;

                let (left_compensation, right_compensation) =
                    compensation(left_latency, right_latency, comp)?;
                let config = CombinerConfig {
                    left_latency,
                    right_latency,
                    left_compensation,
                    right_compensation,
                    output_delay: *output_delay,
                };
                let combiner = Combiner::new(parent, "combiner", &config, self.accumulator, root);
                connect!(self.nodes[left_node].entity() ; combiner.entity);
                connect!(self.nodes[right_node].entity() ; combiner.entity);

                self.compensations.push(CombinerCompensation {
                    name: combiner.entity.full_name(),
                    left: left_compensation,
                    right: right_compensation,
                });
                self.nodes.push(Node::Combiner {
                    combiner,
                    left: left_node,
                    right: right_node,
                });
                Ok((self.nodes.len() - 1, config.latency()))
            }
        }
    }
}

impl Pipeline {
    /// Build a pipeline for a validated accumulator.
    pub fn new(
        parent: &Rc<Entity>,
        name: &str,
        accumulator: &Accumulator,
        topology: &Topology,
    ) -> Result<Self, SimError> {
        let entity = Rc::new(Entity::new(parent, name));
        let expected_latency = total_latency(topology)?;

        let mut layout = Layout {
            accumulator,
            nodes: Vec::new(),
            num_lanes: 0,
            compensations: Vec::new(),
        };
        let (root, latency) = layout.add(&entity, topology, true)?;
        if latency != expected_latency {
            return sim_error!(format!(
                "{entity}: built latency {latency} differs from the topology latency {expected_latency}"
            ));
        }

        info!(entity ; "{} lanes, latency {latency}, accumulator {} bits ({} guard)",
            layout.num_lanes, accumulator.accumulator_width(), accumulator.guard_bits());

        let width = accumulator.accumulator_width();
        Ok(Self {
            entity,
            clock: Clock::new(),
            accumulator: accumulator.clone(),
            links: vec![ChainLink::invalid(width); layout.nodes.len()],
            nodes: layout.nodes,
            root,
            num_lanes: layout.num_lanes,
            latency,
            compensations: layout.compensations,
        })
    }

    /// Ticks between a logical input and the result it contributes to.
    #[must_use]
    pub fn pipeline_latency(&self) -> usize {
        self.latency
    }

    #[must_use]
    pub fn num_lanes(&self) -> usize {
        self.num_lanes
    }

    /// Compensation registers inserted by each combiner, innermost first.
    #[must_use]
    pub fn compensations(&self) -> &[CombinerCompensation] {
        &self.compensations
    }

    #[must_use]
    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Advance the whole pipeline by one tick and return the result leaving
    /// the root this tick.
    ///
    /// An input that does not fit its lane is an error and leaves the
    /// pipeline exactly as it was.
    pub fn advance(&mut self, input: &TickInput) -> Result<MacResult, SimError> {
        if input.lanes.len() != self.num_lanes {
            return sim_error!(format!(
                "{}: {} lanes given, expected {}",
                self.entity,
                input.lanes.len(),
                self.num_lanes
            ));
        }

        // Reject the tick before any register moves
        for node in &self.nodes {
            if let Node::Stage { stage, lane, .. } = node {
                stage.check_input(&input.lanes[*lane])?;
            }
        }

        let width = self.accumulator.accumulator_width();
        let mut result = None;
        for (i, node) in self.nodes.iter_mut().enumerate() {
            let (link, node_result) = match node {
                Node::Stage {
                    stage,
                    skew,
                    lane,
                    chain_from,
                } => {
                    let chain_in = match chain_from {
                        Some(from) => self.links[*from].clone(),
                        None => ChainLink::invalid(width),
                    };
                    let (stage_input, clear) = skew.tick(&input.lanes[*lane], input.clear);
                    let out = stage.tick(&stage_input, clear, &chain_in)?;
                    (out.chain, out.result)
                }
                Node::Combiner {
                    combiner,
                    left,
                    right,
                } => combiner.tick(&self.links[*left], &self.links[*right], input.clear),
            };
            self.links[i] = link;
            if i == self.root {
                result = node_result;
            }
        }

        let now = self.clock.advance();
        set_tick!(self.entity ; now.tick());

        match result {
            Some(result) => Ok(result),
            None => sim_error!(format!("{}: root produced no result", self.entity)),
        }
    }
}
