// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use macsim_components::chain::ChainLink;
use macsim_components::mac_stage::{
    ExtraMode, MacStage, MacStageConfig, ProductMode, StageInput, StageOutput,
};
use macsim_components::sequencer::SequencerMode;
use macsim_components::skew::InputSkew;
use macsim_engine::test_helpers::start_test;
use macsim_fixed::accumulator::{Accumulator, AccumulatorConfig};
use macsim_fixed::fixed::FixedPoint;
use macsim_track::entity::toplevel;
use macsim_track::test_helpers::check_and_clear;
use macsim_track::test_init;

fn fp(value: i64, width: u32) -> FixedPoint {
    FixedPoint::from_i64(value, width).unwrap()
}

fn accumulator() -> Accumulator {
    AccumulatorConfig::new(8, 16, 12).validate().unwrap()
}

fn raw(output: &StageOutput) -> (i64, bool) {
    let result = output.result.as_ref().unwrap();
    (result.raw.to_i64().unwrap(), result.result_valid)
}

#[test]
fn clear_then_accumulate() {
    let top = start_test(file!());
    let acc = accumulator();
    let config = MacStageConfig::new(0, 0, 1);
    let mut stage = MacStage::new(&top, "mac", &config, &acc, true);
    let no_chain = ChainLink::invalid(acc.accumulator_width());

    let first = StageInput::factors(fp(3, 4), fp(2, 4));
    let second = StageInput::factors(fp(4, 4), fp(5, 4));

    let out = stage.tick(&first, true, &no_chain).unwrap();
    assert!(!out.result.unwrap().result_valid);
    let out = stage.tick(&second, false, &no_chain).unwrap();
    assert_eq!(raw(&out), (6, true));
    let out = stage.tick(&StageInput::idle(), false, &no_chain).unwrap();
    assert_eq!(raw(&out), (26, true));

    // Nothing valid: the sum is held but not flagged valid
    let out = stage.tick(&StageInput::idle(), false, &no_chain).unwrap();
    assert_eq!(raw(&out), (26, false));
}

#[test]
fn clear_discards_history() {
    let top = start_test(file!());
    let acc = accumulator();
    let config = MacStageConfig::new(0, 0, 0);
    let mut stage = MacStage::new(&top, "mac", &config, &acc, true);
    let no_chain = ChainLink::invalid(acc.accumulator_width());

    stage
        .tick(&StageInput::factors(fp(7, 4), fp(7, 4)), true, &no_chain)
        .unwrap();
    let out = stage
        .tick(&StageInput::factors(fp(1, 4), fp(2, 4)), true, &no_chain)
        .unwrap();
    assert_eq!(raw(&out), (2, true));
}

#[test]
fn invalid_factor_contributes_nothing() {
    let top = start_test(file!());
    let acc = accumulator();
    let config = MacStageConfig::new(0, 0, 0);
    let mut stage = MacStage::new(&top, "mac", &config, &acc, true);
    let no_chain = ChainLink::invalid(acc.accumulator_width());

    stage
        .tick(&StageInput::factors(fp(5, 4), fp(3, 4)), true, &no_chain)
        .unwrap();
    let half = StageInput {
        a: Some(fp(5, 4)),
        ..StageInput::default()
    };
    let out = stage.tick(&half, false, &no_chain).unwrap();
    assert_eq!(raw(&out), (15, false));
}

#[test]
fn negate_and_extra() {
    let top = start_test(file!());
    let acc = accumulator();
    let config = MacStageConfig {
        extra_mode: ExtraMode::Subtract,
        output_delay: 0,
        ..MacStageConfig::default()
    };
    let mut stage = MacStage::new(&top, "mac", &config, &acc, true);
    let no_chain = ChainLink::invalid(acc.accumulator_width());

    let input = StageInput {
        a: Some(fp(3, 4)),
        b: Some(fp(-4, 4)),
        extra: Some(fp(5, 8)),
        negate: true,
        ..StageInput::default()
    };
    // -(3 * -4) - 5
    let out = stage.tick(&input, true, &no_chain).unwrap();
    assert_eq!(raw(&out), (7, true));

    // extra alone is still a valid contribution
    let input = StageInput {
        extra: Some(fp(-2, 8)),
        ..StageInput::default()
    };
    let out = stage.tick(&input, false, &no_chain).unwrap();
    assert_eq!(raw(&out), (9, true));
}

#[test]
fn pre_adder() {
    let top = start_test(file!());
    let acc = accumulator();
    let no_chain = ChainLink::invalid(acc.accumulator_width());
    let input = StageInput {
        a: Some(fp(3, 3)),
        d: Some(fp(-2, 3)),
        b: Some(fp(5, 4)),
        ..StageInput::default()
    };

    let expected = [
        (ProductMode::Single, 15),
        (ProductMode::PreAdd, 5),
        (ProductMode::PreSub, 25),
    ];
    for (product_mode, value) in expected {
        let config = MacStageConfig {
            product_mode,
            output_delay: 0,
            ..MacStageConfig::default()
        };
        let mut stage = MacStage::new(&top, "mac", &config, &acc, true);
        let out = stage.tick(&input, true, &no_chain).unwrap();
        assert_eq!(raw(&out), (value, true), "{product_mode:?}");
    }
}

#[test]
fn product_too_wide() {
    let top = start_test(file!());
    let acc = accumulator();
    let config = MacStageConfig::new(0, 0, 0);
    let mut stage = MacStage::new(&top, "mac", &config, &acc, true);
    let no_chain = ChainLink::invalid(acc.accumulator_width());

    let input = StageInput::factors(fp(3, 5), fp(2, 4));
    assert!(stage.check_input(&input).is_err());
    assert!(stage.tick(&input, true, &no_chain).is_err());

    let input = StageInput {
        extra: Some(fp(0, acc.accumulator_width() + 1)),
        ..StageInput::default()
    };
    assert!(stage.check_input(&input).is_err());
    assert!(stage.tick(&input, true, &no_chain).is_err());

    // Nothing was registered by the rejected ticks
    let input = StageInput::factors(fp(3, 4), fp(2, 4));
    assert!(stage.check_input(&input).is_ok());
    let out = stage.tick(&input, false, &no_chain).unwrap();
    assert_eq!(raw(&out), (6, true));
}

#[test]
fn only_terminal_stage_accumulates() {
    let top = start_test(file!());
    let acc = accumulator();
    let config = MacStageConfig::new(1, 2, 1);

    let terminal = MacStage::new(&top, "end", &config, &acc, true);
    assert!(terminal.is_terminal());
    assert_eq!(terminal.latency(), 3);
    assert_eq!(terminal.sequencer().mode(), SequencerMode::Accumulate);

    let inner = MacStage::new(&top, "inner", &config, &acc, false);
    assert!(!inner.is_terminal());
    assert_eq!(inner.sequencer().mode(), SequencerMode::PassThrough);
    assert!(!inner.sequencer().state().running_valid);
}

#[test]
fn intermediate_stage_forwards_partial_sums() {
    let top = start_test(file!());
    let acc = accumulator();
    let config = MacStageConfig::new(0, 0, 1);
    let mut stage = MacStage::new(&top, "mac", &config, &acc, false);
    let width = acc.accumulator_width();

    let chain = ChainLink::new(fp(100, width), true);
    let out = stage
        .tick(&StageInput::factors(fp(2, 4), fp(3, 4)), true, &chain)
        .unwrap();
    assert!(out.result.is_none());
    assert!(!out.chain.valid);

    let out = stage
        .tick(&StageInput::factors(fp(1, 4), fp(1, 4)), false, &chain)
        .unwrap();
    assert_eq!(out.chain, ChainLink::new(fp(106, width), true));

    let out = stage
        .tick(&StageInput::idle(), false, &ChainLink::invalid(width))
        .unwrap();
    assert_eq!(out.chain, ChainLink::new(fp(101, width), true));

    let out = stage
        .tick(&StageInput::idle(), false, &ChainLink::invalid(width))
        .unwrap();
    assert!(!out.chain.valid);
}

#[test]
fn chain_input_ignored_when_not_accepted() {
    let top = start_test(file!());
    let acc = accumulator();
    let config = MacStageConfig {
        accepts_chain_input: false,
        output_delay: 0,
        ..MacStageConfig::default()
    };
    let mut stage = MacStage::new(&top, "mac", &config, &acc, true);
    let chain = ChainLink::new(fp(100, acc.accumulator_width()), true);

    let out = stage
        .tick(&StageInput::factors(fp(2, 4), fp(3, 4)), true, &chain)
        .unwrap();
    assert_eq!(raw(&out), (6, true));
}

#[test]
fn skewed_inputs_meet_after_latency() {
    let top = start_test(file!());
    let acc = accumulator();
    let config = MacStageConfig {
        input_delay_a: 3,
        input_delay_b: 1,
        input_delay_extra: 2,
        output_delay: 2,
        ..MacStageConfig::default()
    };
    assert_eq!(config.latency(), 5);
    let mut skew = InputSkew::new(&config, 0);
    let mut stage = MacStage::new(&top, "mac", &config, &acc, true);
    let no_chain = ChainLink::invalid(acc.accumulator_width());

    let input = StageInput {
        a: Some(fp(6, 4)),
        b: Some(fp(7, 4)),
        extra: Some(fp(1, 4)),
        ..StageInput::default()
    };
    let mut valid_ticks = Vec::new();
    for tick in 0..10 {
        let logical = if tick == 0 {
            input.clone()
        } else {
            StageInput::idle()
        };
        let (skewed, clear) = skew.tick(&logical, tick == 0);
        let out = stage.tick(&skewed, clear, &no_chain).unwrap();
        let (value, valid) = raw(&out);
        if valid {
            valid_ticks.push((tick, value));
        }
    }
    assert_eq!(valid_ticks, vec![(5, 43)]);
}

#[test]
fn trace_output() {
    let (test_tracker, tracker) = test_init!(1);
    let top = toplevel(&tracker, "top");
    let acc = accumulator();
    let config = MacStageConfig::new(0, 0, 1);
    let mut stage = MacStage::new(&top, "mac", &config, &acc, true);
    check_and_clear(
        &test_tracker,
        &[
            "0: created 1, top",
            "1: created 2, top::mac",
            r"2:DEBUG: latency 1 \(0 in, 1 out\), Accumulate",
        ],
    );

    let no_chain = ChainLink::invalid(acc.accumulator_width());
    stage
        .tick(&StageInput::factors(fp(3, 4), fp(2, 4)), true, &no_chain)
        .unwrap();
    check_and_clear(
        &test_tracker,
        &["2:TRACE: product 6:s8", "2:DEBUG: clear", "2:TRACE: chain out -"],
    );
}
