// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use macsim_components::mac_stage::{MacStageConfig, StageInput};
use macsim_engine::test_helpers::start_test;
use macsim_fixed::accumulator::AccumulatorConfig;
use macsim_fixed::fixed::FixedPoint;
use macsim_models::pipeline::{PipelineBuilder, TickInput};
use macsim_models::topology::{Topology, total_latency};
use proptest::prelude::*;

const CASES: u32 = 256;

fn stage_config() -> impl Strategy<Value = MacStageConfig> {
    (0usize..4, 0usize..4, 0usize..4, 0usize..3).prop_map(|(a, b, extra, out)| MacStageConfig {
        input_delay_extra: extra,
        ..MacStageConfig::new(a, b, out)
    })
}

fn path() -> impl Strategy<Value = Topology> {
    prop::collection::vec(stage_config(), 1..4).prop_map(Topology::path)
}

fn topology() -> impl Strategy<Value = Topology> {
    path().prop_recursive(2, 12, 2, |inner| {
        (inner.clone(), inner, 0usize..3).prop_map(|(l, r, out)| Topology::tree(l, r, out))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(CASES))]

    #[test]
    fn pulse_arrives_after_latency(
        topology in topology(),
        lane_seed in any::<usize>(),
        a in -128i64..128,
        b in -128i64..128,
    ) {
        let top = start_test(file!());
        let num_lanes = topology.num_lanes();
        let lane = lane_seed % num_lanes;
        let expected_latency = total_latency(&topology).unwrap();
        let mut pipeline = PipelineBuilder::new(AccumulatorConfig::new(16, 32, 16))
            .topology(topology)
            .build(&top, "pipe")
            .unwrap();
        prop_assert_eq!(pipeline.pipeline_latency(), expected_latency);

        let mut pulse = TickInput::idle(num_lanes);
        pulse.clear = true;
        pulse.lanes[lane] = StageInput::factors(
            FixedPoint::from_i64(a, 8).unwrap(),
            FixedPoint::from_i64(b, 8).unwrap(),
        );
        let idle = TickInput::idle(num_lanes);

        for tick in 0..=expected_latency + 2 {
            let input = if tick == 0 { &pulse } else { &idle };
            let result = pipeline.advance(input).unwrap();
            prop_assert_eq!(result.result_valid, tick == expected_latency, "tick {}", tick);
            if tick == expected_latency {
                prop_assert_eq!(result.raw.to_i64(), Some(a * b));
            }
        }
    }
}
