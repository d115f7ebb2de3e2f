// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Input skew registers.
//!
//! A pipeline presents the inputs of every stage on the same logical tick.
//! Stages further down the chain must see them later, by the latency of the
//! stages before them, and each operand must be delayed up to the stage's
//! largest input delay. An [`InputSkew`] sits in front of a stage and
//! provides both.

use macsim_fixed::fixed::FixedPoint;

use crate::delay::DelayLine;
use crate::mac_stage::{MacStageConfig, StageInput};

pub struct InputSkew {
    a: DelayLine<Option<FixedPoint>>,
    d: DelayLine<Option<FixedPoint>>,
    b: DelayLine<Option<FixedPoint>>,
    extra: DelayLine<Option<FixedPoint>>,
    control: DelayLine<(bool, bool)>,
}

impl InputSkew {
    /// Skew for a stage whose chain input arrives `upstream_latency` ticks
    /// after the logical input tick.
    #[must_use]
    pub fn new(config: &MacStageConfig, upstream_latency: usize) -> Self {
        let in_max = config.input_delay_max();
        let operand = |own_delay: usize| upstream_latency + in_max - own_delay;
        Self {
            a: DelayLine::new(operand(config.input_delay_a), None),
            d: DelayLine::new(operand(config.input_delay_a), None),
            b: DelayLine::new(operand(config.input_delay_b), None),
            extra: DelayLine::new(operand(config.input_delay_extra), None),
            control: DelayLine::new(upstream_latency, (false, false)),
        }
    }

    /// Accept this tick's logical input and return what the stage should see
    /// this tick, with the clear flag.
    pub fn tick(&mut self, input: &StageInput, clear: bool) -> (StageInput, bool) {
        let (clear, negate) = self.control.tick((clear, input.negate));
        let skewed = StageInput {
            a: self.a.tick(input.a.clone()),
            b: self.b.tick(input.b.clone()),
            d: self.d.tick(input.d.clone()),
            extra: self.extra.tick(input.extra.clone()),
            negate,
        };
        (skewed, clear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(value: i64) -> Option<FixedPoint> {
        Some(FixedPoint::from_i64(value, 8).unwrap())
    }

    #[test]
    fn operands_align_to_largest_delay() {
        let config = MacStageConfig {
            input_delay_a: 1,
            input_delay_b: 3,
            ..MacStageConfig::default()
        };
        let mut skew = InputSkew::new(&config, 2);

        let input = StageInput {
            a: fp(1),
            b: fp(2),
            negate: true,
            ..StageInput::default()
        };
        let (first, clear) = skew.tick(&input, true);
        assert_eq!(first, StageInput::default());
        assert!(!clear);

        // a is held for 2 + 3 - 1 = 4 ticks, b for 2, control for 2
        let idle = StageInput::idle();
        let (out, clear) = skew.tick(&idle, false);
        assert_eq!(out, StageInput::default());
        assert!(!clear);

        let (out, clear) = skew.tick(&idle, false);
        assert_eq!(out.b, fp(2));
        assert!(out.negate);
        assert!(clear);
        assert_eq!(out.a, None);

        skew.tick(&idle, false);
        let (out, _) = skew.tick(&idle, false);
        assert_eq!(out.a, fp(1));
    }
}
