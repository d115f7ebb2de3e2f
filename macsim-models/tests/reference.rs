// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use macsim_components::clear::ClearGenerator;
use macsim_components::mac_stage::{ExtraMode, MacResult, MacStageConfig, ProductMode, StageInput};
use macsim_engine::test_helpers::start_test;
use macsim_fixed::accumulator::AccumulatorConfig;
use macsim_fixed::fixed::FixedPoint;
use macsim_fixed::rounding::RoundingPolicy;
use macsim_models::pipeline::{PipelineBuilder, TickInput};
use macsim_models::reference::ReferenceModel;
use macsim_models::topology::Topology;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const NUM_TICKS: usize = 400;

fn accumulator_config(rounding: RoundingPolicy, clip: bool) -> AccumulatorConfig {
    let mut config = AccumulatorConfig::new(17, 16, 12);
    config.shift_right = 6;
    config.rounding = rounding;
    config.clip_enabled = clip;
    config.overflow_report_enabled = true;
    config
}

fn topology() -> Topology {
    let pre_add = MacStageConfig {
        input_delay_a: 2,
        input_delay_b: 1,
        output_delay: 1,
        product_mode: ProductMode::PreAdd,
        ..MacStageConfig::default()
    };
    let pre_sub = MacStageConfig {
        input_delay_extra: 3,
        output_delay: 0,
        product_mode: ProductMode::PreSub,
        extra_mode: ExtraMode::Subtract,
        ..MacStageConfig::default()
    };
    let left = Topology::path(vec![
        MacStageConfig::new(1, 1, 1),
        pre_add,
        MacStageConfig::new(0, 2, 1),
    ]);
    let right = Topology::tree(
        Topology::path(vec![pre_sub]),
        Topology::path(vec![MacStageConfig::new(1, 0, 2), MacStageConfig::new(0, 0, 0)]),
        1,
    );
    Topology::tree(left, right, 1)
}

fn random_factor(rng: &mut StdRng) -> Option<FixedPoint> {
    rng.gen_bool(0.9)
        .then(|| FixedPoint::from_i64(rng.gen_range(-128..128), 8).unwrap())
}

fn random_inputs(seed: u64, num_lanes: usize, num_summands: u64) -> Vec<TickInput> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut clear = ClearGenerator::new(num_summands);
    (0..NUM_TICKS)
        .map(|_| {
            let lanes: Vec<StageInput> = (0..num_lanes)
                .map(|_| StageInput {
                    a: random_factor(&mut rng),
                    b: random_factor(&mut rng),
                    d: random_factor(&mut rng),
                    extra: rng
                        .gen_bool(0.3)
                        .then(|| FixedPoint::from_i64(rng.gen_range(-1000..1000), 11).unwrap()),
                    negate: rng.gen_bool(0.25),
                })
                .collect();
            let valid = rng.gen_bool(0.8);
            let lanes = if valid {
                lanes
            } else {
                vec![StageInput::idle(); num_lanes]
            };
            TickInput::new(clear.next_clear(valid), lanes)
        })
        .collect()
}

fn run(config: AccumulatorConfig, seed: u64) -> (Vec<MacResult>, Vec<MacResult>, usize) {
    let top = start_test(file!());
    let topology = topology();
    let num_summands = config.num_summands;
    let accumulator = config.validate().unwrap();
    let mut pipeline = PipelineBuilder::new(config)
        .topology(topology.clone())
        .build(&top, "pipe")
        .unwrap();
    let mut reference = ReferenceModel::new(&accumulator, &topology);

    let inputs = random_inputs(seed, pipeline.num_lanes(), num_summands);
    let idle = TickInput::idle(pipeline.num_lanes());
    let latency = pipeline.pipeline_latency();

    let mut actual = Vec::new();
    for tick in 0..NUM_TICKS + latency {
        let result = pipeline.advance(inputs.get(tick).unwrap_or(&idle)).unwrap();
        if tick >= latency {
            actual.push(result);
        }
    }
    let expected = inputs.iter().map(|input| reference.step(input)).collect();
    (actual, expected, latency)
}

#[test]
fn matches_reference() {
    for (i, rounding) in RoundingPolicy::ALL.into_iter().enumerate() {
        for clip in [false, true] {
            let (actual, expected, latency) = run(accumulator_config(rounding, clip), i as u64);
            assert_eq!(latency, 9);
            assert_eq!(actual.len(), expected.len());
            for (tick, (a, e)) in actual.iter().zip(&expected).enumerate() {
                assert_eq!(a, e, "tick {tick} with {rounding}, clip {clip}");
            }
        }
    }
}

#[test]
fn reports_overflow() {
    let mut config = accumulator_config(RoundingPolicy::Floor, true);
    config.shift_right = 0;
    let (actual, expected, _) = run(config, 99);
    assert_eq!(actual, expected);
    assert!(actual.iter().any(|r| r.overflow));
    assert!(actual.iter().all(|r| r.result.width() == 12));
}

#[test]
fn deterministic() {
    let config = accumulator_config(RoundingPolicy::Nearest, false);
    let (first, _, _) = run(config.clone(), 7);
    let (second, _, _) = run(config, 7);
    assert_eq!(first, second);
}
