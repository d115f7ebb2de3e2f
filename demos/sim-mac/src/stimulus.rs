// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Random inputs for a pipeline.

use macsim_components::clear::ClearGenerator;
use macsim_components::mac_stage::{MacStageConfig, ProductMode, StageInput};
use macsim_engine::sim_error;
use macsim_engine::types::SimError;
use macsim_fixed::accumulator::Accumulator;
use macsim_fixed::fixed::FixedPoint;
use macsim_models::pipeline::TickInput;
use macsim_models::topology::Topology;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Widest operand the generator produces.
pub const MAX_OPERAND_WIDTH: u32 = 32;

#[derive(Clone, Debug)]
pub struct StimulusConfig {
    pub seed: u64,
    pub dot_product_length: u64,
    pub operand_width: u32,
    pub valid_probability: f64,
    pub extra_probability: f64,
    pub extra_width: u32,
    pub negate_probability: f64,
}

/// One logical tick of stimulus.
pub struct Stimulus {
    pub input: TickInput,

    /// Set on the last valid tick of a dot product.
    pub last: bool,
}

pub struct StimulusGenerator {
    config: StimulusConfig,
    rng: StdRng,
    lanes: Vec<ProductMode>,
    clear: ClearGenerator,
    num_valid: u64,
}

fn check_probability(name: &str, p: f64) -> Result<(), SimError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        sim_error!(format!("{name} must be between 0 and 1, got {p}"))
    }
}

fn check_width(name: &str, width: u32) -> Result<(), SimError> {
    if (1..=MAX_OPERAND_WIDTH).contains(&width) {
        Ok(())
    } else {
        sim_error!(format!(
            "{name} must be between 1 and {MAX_OPERAND_WIDTH}, got {width}"
        ))
    }
}

impl StimulusGenerator {
    /// Create a generator whose values always fit the pipeline.
    pub fn new(
        config: &StimulusConfig,
        accumulator: &Accumulator,
        topology: &Topology,
    ) -> Result<Self, SimError> {
        check_width("operand_width", config.operand_width)?;
        check_width("extra_width", config.extra_width)?;
        check_probability("valid_probability", config.valid_probability)?;
        check_probability("extra_probability", config.extra_probability)?;
        check_probability("negate_probability", config.negate_probability)?;

        let lanes: Vec<ProductMode> = topology
            .lane_configs()
            .into_iter()
            .map(|c: &MacStageConfig| c.product_mode)
            .collect();
        let pre_adder = lanes.iter().any(|mode| *mode != ProductMode::Single);
        let product_width = 2 * config.operand_width + u32::from(pre_adder);
        if product_width > accumulator.product_width() {
            return sim_error!(format!(
                "operands of {} bits give {product_width} bit products, the accumulator takes {}",
                config.operand_width,
                accumulator.product_width()
            ));
        }
        if config.extra_width > accumulator.accumulator_width() {
            return sim_error!(format!(
                "extra summands of {} bits exceed the accumulator width {}",
                config.extra_width,
                accumulator.accumulator_width()
            ));
        }

        let dot_product_length = match config.dot_product_length {
            0 => accumulator.config().num_summands,
            n => n,
        };
        Ok(Self {
            config: StimulusConfig {
                dot_product_length,
                ..config.clone()
            },
            rng: StdRng::seed_from_u64(config.seed),
            lanes,
            clear: ClearGenerator::new(dot_product_length),
            num_valid: 0,
        })
    }

    #[must_use]
    pub fn num_lanes(&self) -> usize {
        self.lanes.len()
    }

    /// Valid ticks in each dot product. Zero means a single unbounded sum.
    #[must_use]
    pub fn dot_product_length(&self) -> u64 {
        self.config.dot_product_length
    }

    fn value(&mut self, width: u32) -> FixedPoint {
        let half = 1i64 << (width - 1);
        FixedPoint::wrapping(self.rng.gen_range(-half..half), width)
    }

    fn lane(&mut self, mode: ProductMode) -> StageInput {
        let width = self.config.operand_width;
        let a = self.value(width);
        let b = self.value(width);
        let d = match mode {
            ProductMode::Single => None,
            ProductMode::PreAdd | ProductMode::PreSub => Some(self.value(width)),
        };
        let extra = if self.rng.gen_bool(self.config.extra_probability) {
            Some(self.value(self.config.extra_width))
        } else {
            None
        };
        StageInput {
            a: Some(a),
            b: Some(b),
            d,
            extra,
            negate: self.rng.gen_bool(self.config.negate_probability),
        }
    }

    /// Produce the next logical tick.
    pub fn next_tick(&mut self) -> Stimulus {
        let valid = self.rng.gen_bool(self.config.valid_probability);
        let clear = self.clear.next_clear(valid);
        if !valid {
            return Stimulus {
                input: TickInput::idle(self.num_lanes()),
                last: false,
            };
        }

        let lanes = self.lanes.clone();
        let inputs = lanes.into_iter().map(|mode| self.lane(mode)).collect();
        self.num_valid += 1;
        let last = match self.config.dot_product_length {
            0 => false,
            n => self.num_valid % n == 0,
        };
        Stimulus {
            input: TickInput::new(clear, inputs),
            last,
        }
    }
}

#[cfg(test)]
mod tests {
    use macsim_fixed::accumulator::AccumulatorConfig;

    use super::*;

    fn config() -> StimulusConfig {
        StimulusConfig {
            seed: 1,
            dot_product_length: 4,
            operand_width: 8,
            valid_probability: 0.5,
            extra_probability: 0.5,
            extra_width: 10,
            negate_probability: 0.5,
        }
    }

    fn topology() -> Topology {
        Topology::path(vec![
            MacStageConfig::default(),
            MacStageConfig {
                product_mode: ProductMode::PreAdd,
                ..MacStageConfig::default()
            },
        ])
    }

    #[test]
    fn dot_products() {
        let accumulator = AccumulatorConfig::new(17, 4, 16).validate().unwrap();
        let mut generator = StimulusGenerator::new(&config(), &accumulator, &topology()).unwrap();

        let ticks: Vec<Stimulus> = (0..200).map(|_| generator.next_tick()).collect();
        let valid: Vec<&Stimulus> = ticks
            .iter()
            .filter(|t| t.input.lanes[0].a.is_some())
            .collect();
        assert!(valid.len() > 50);
        for (i, tick) in valid.iter().enumerate() {
            assert_eq!(tick.input.clear, i % 4 == 0, "valid tick {i}");
            assert_eq!(tick.last, i % 4 == 3, "valid tick {i}");
            assert!(tick.input.lanes[0].d.is_none());
            assert!(tick.input.lanes[1].d.is_some());
            assert!(tick.input.lanes.iter().all(|l| l.a.as_ref().unwrap().width() == 8));
        }
        assert!(ticks.iter().all(|t| t.input.lanes.len() == 2));
    }

    #[test]
    fn deterministic() {
        let accumulator = AccumulatorConfig::new(17, 4, 16).validate().unwrap();
        let mut first = StimulusGenerator::new(&config(), &accumulator, &topology()).unwrap();
        let mut second = StimulusGenerator::new(&config(), &accumulator, &topology()).unwrap();
        for _ in 0..50 {
            assert_eq!(first.next_tick().input, second.next_tick().input);
        }
    }

    #[test]
    fn operands_must_fit() {
        let accumulator = AccumulatorConfig::new(16, 4, 16).validate().unwrap();
        assert!(StimulusGenerator::new(&config(), &accumulator, &topology()).is_err());

        let mut bad = config();
        bad.valid_probability = 1.5;
        let accumulator = AccumulatorConfig::new(17, 4, 16).validate().unwrap();
        assert!(StimulusGenerator::new(&bad, &accumulator, &topology()).is_err());
    }
}
