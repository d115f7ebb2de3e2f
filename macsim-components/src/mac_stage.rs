// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! One multiply-accumulate stage.
//!
//! A stage multiplies two factors, optionally through a pre-adder, optionally
//! negates the product and adds or subtracts an extra summand. The result is
//! added to the partial sum arriving on the chain input and leaves on the
//! chain output after `output_delay` registers.
//!
//! Operand `a` (and the pre-adder operand `d`) pass through `input_delay_a`
//! registers, `b` through `input_delay_b` and `extra` through
//! `input_delay_extra`. The control flags and the chain input pass through
//! the largest of the three, so a caller that skews its operands by the
//! difference sees every input of one logical tick meet in the same tick.
//!
//! The terminal stage of a chain keeps the running sum and produces the
//! visible [`MacResult`]. Every other stage only forwards raw partial sums.

use std::fmt;
use std::rc::Rc;

use macsim_engine::sim_error;
use macsim_engine::types::SimError;
use macsim_fixed::accumulator::Accumulator;
use macsim_fixed::fixed::FixedPoint;
use macsim_track::entity::{Entity, GetEntity};
use macsim_track::{debug, trace};
use num::BigInt;

use crate::chain::ChainLink;
use crate::delay::DelayLine;
use crate::sequencer::{AccumulatorSequencer, SequencerMode};

/// How the factors are combined into a product.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProductMode {
    /// `a * b`
    #[default]
    Single,

    /// `(a + d) * b`
    PreAdd,

    /// `(a - d) * b`
    PreSub,
}

/// Whether the extra summand is added or subtracted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExtraMode {
    #[default]
    Add,
    Subtract,
}

/// Static configuration of a [`MacStage`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MacStageConfig {
    pub input_delay_a: usize,
    pub input_delay_b: usize,
    pub input_delay_extra: usize,
    pub output_delay: usize,
    pub accepts_chain_input: bool,
    pub product_mode: ProductMode,
    pub extra_mode: ExtraMode,
}

impl Default for MacStageConfig {
    fn default() -> Self {
        Self {
            input_delay_a: 0,
            input_delay_b: 0,
            input_delay_extra: 0,
            output_delay: 1,
            accepts_chain_input: true,
            product_mode: ProductMode::Single,
            extra_mode: ExtraMode::Add,
        }
    }
}

impl MacStageConfig {
    #[must_use]
    pub fn new(input_delay_a: usize, input_delay_b: usize, output_delay: usize) -> Self {
        Self {
            input_delay_a,
            input_delay_b,
            output_delay,
            ..Self::default()
        }
    }

    /// Delay applied to the control flags and the chain input.
    #[must_use]
    pub fn input_delay_max(&self) -> usize {
        self.input_delay_a
            .max(self.input_delay_b)
            .max(self.input_delay_extra)
    }

    /// Ticks from a logical input to the chain output.
    #[must_use]
    pub fn latency(&self) -> usize {
        self.input_delay_max() + self.output_delay
    }
}

/// The lane inputs of one stage for one tick. `None` marks an invalid value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StageInput {
    pub a: Option<FixedPoint>,
    pub b: Option<FixedPoint>,
    pub d: Option<FixedPoint>,
    pub extra: Option<FixedPoint>,
    pub negate: bool,
}

impl StageInput {
    /// A pair of valid factors.
    #[must_use]
    pub fn factors(a: FixedPoint, b: FixedPoint) -> Self {
        Self {
            a: Some(a),
            b: Some(b),
            ..Self::default()
        }
    }

    /// A lane with nothing valid on it.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }
}

/// The visible result of a chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MacResult {
    /// Shifted, rounded and resized to the output width.
    pub result: FixedPoint,

    /// Set on ticks where the running sum was updated.
    pub result_valid: bool,

    /// Only reported when enabled. Without clipping the result has wrapped.
    pub overflow: bool,

    /// The running sum before shifting, rounding or resizing.
    pub raw: FixedPoint,
}

impl MacResult {
    /// Produce the visible result of the link leaving the root of a chain.
    #[must_use]
    pub fn from_link(accumulator: &Accumulator, link: ChainLink) -> Self {
        let (result, overflow) = accumulator.finalize(&link.partial_sum);
        Self {
            result,
            result_valid: link.valid,
            overflow: overflow && link.valid,
            raw: link.partial_sum,
        }
    }
}

impl fmt::Display for MacResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.result_valid {
            write!(f, "{} (raw {})", self.result, self.raw)?;
            if self.overflow {
                write!(f, " overflow")?;
            }
            Ok(())
        } else {
            write!(f, "-")
        }
    }
}

/// The outputs of one stage for one tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageOutput {
    pub chain: ChainLink,

    /// Only produced by the terminal stage.
    pub result: Option<MacResult>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Control {
    clear: bool,
    negate: bool,
}

pub struct MacStage {
    pub entity: Rc<Entity>,
    config: MacStageConfig,
    accumulator: Accumulator,
    terminal: bool,

    a: DelayLine<Option<FixedPoint>>,
    d: DelayLine<Option<FixedPoint>>,
    b: DelayLine<Option<FixedPoint>>,
    extra: DelayLine<Option<FixedPoint>>,
    control: DelayLine<Control>,
    chain_in: DelayLine<ChainLink>,

    sequencer: AccumulatorSequencer,
    output: DelayLine<ChainLink>,
}

impl GetEntity for MacStage {
    fn entity(&self) -> &Rc<Entity> {
        &self.entity
    }
}

impl MacStage {
    /// Create a stage. A `terminal` stage keeps the running sum.
    #[must_use]
    pub fn new(
        parent: &Rc<Entity>,
        name: &str,
        config: &MacStageConfig,
        accumulator: &Accumulator,
        terminal: bool,
    ) -> Self {
        let entity = Rc::new(Entity::new(parent, name));
        let width = accumulator.accumulator_width();
        let in_max = config.input_delay_max();
        let mode = if terminal {
            SequencerMode::Accumulate
        } else {
            SequencerMode::PassThrough
        };

        debug!(entity ; "latency {} ({} in, {} out), {mode:?}", config.latency(), in_max, config.output_delay);

        Self {
            entity,
            config: config.clone(),
            accumulator: accumulator.clone(),
            terminal,
            a: DelayLine::new(config.input_delay_a, None),
            d: DelayLine::new(config.input_delay_a, None),
            b: DelayLine::new(config.input_delay_b, None),
            extra: DelayLine::new(config.input_delay_extra, None),
            control: DelayLine::new(in_max, Control::default()),
            chain_in: DelayLine::new(in_max, ChainLink::invalid(width)),
            sequencer: AccumulatorSequencer::new(mode, width),
            output: DelayLine::new(config.output_delay, ChainLink::invalid(width)),
        }
    }

    #[must_use]
    pub fn config(&self) -> &MacStageConfig {
        &self.config
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    #[must_use]
    pub fn latency(&self) -> usize {
        self.config.latency()
    }

    #[must_use]
    pub fn sequencer(&self) -> &AccumulatorSequencer {
        &self.sequencer
    }

    fn product(
        &self,
        a: &FixedPoint,
        b: &FixedPoint,
        d: Option<&FixedPoint>,
    ) -> Result<FixedPoint, SimError> {
        let factor = match (self.config.product_mode, d) {
            (ProductMode::Single, _) | (_, None) => a.clone(),
            (ProductMode::PreAdd, Some(d)) => a.add(d, a.width().max(d.width()) + 1, false).0,
            (ProductMode::PreSub, Some(d)) => a.sub(d, a.width().max(d.width()) + 1, false).0,
        };
        let product = factor.mul(b);
        let product_width = self.accumulator.product_width();
        if product.width() > product_width {
            return sim_error!(format!(
                "{}: product of {} bits exceeds product width {}",
                self.entity,
                product.width(),
                product_width
            ));
        }
        Ok(product)
    }

    fn check_extra(&self, extra: Option<&FixedPoint>) -> Result<(), SimError> {
        let accumulator_width = self.accumulator.accumulator_width();
        match extra {
            Some(extra) if extra.width() > accumulator_width => sim_error!(format!(
                "{}: extra summand of {} bits exceeds accumulator width {accumulator_width}",
                self.entity,
                extra.width()
            )),
            _ => Ok(()),
        }
    }

    /// Check that the operands of one logical input fit the accumulator.
    ///
    /// `input` holds operands that meet in the multiplier, as a pipeline
    /// presents them before any skew. A product wider than the product width
    /// or an extra summand wider than the accumulator is an error.
    pub fn check_input(&self, input: &StageInput) -> Result<(), SimError> {
        self.check_extra(input.extra.as_ref())?;
        if let (Some(a), Some(b)) = (&input.a, &input.b) {
            self.product(a, b, input.d.as_ref())?;
        }
        Ok(())
    }

    /// Advance the stage by one tick.
    ///
    /// `input` and `clear` are the values presented to the stage's input
    /// registers this tick and `chain_in` is the link arriving from the
    /// previous stage. An extra summand that is too wide is rejected before
    /// anything is registered. Products are checked once their operands
    /// meet, so callers that need an input rejected on the tick it is given
    /// use [`MacStage::check_input`] first.
    pub fn tick(
        &mut self,
        input: &StageInput,
        clear: bool,
        chain_in: &ChainLink,
    ) -> Result<StageOutput, SimError> {
        self.check_extra(input.extra.as_ref())?;

        let a = self.a.tick(input.a.clone());
        let d = self.d.tick(input.d.clone());
        let b = self.b.tick(input.b.clone());
        let extra = self.extra.tick(input.extra.clone());
        let control = self.control.tick(Control {
            clear,
            negate: input.negate,
        });
        let chain = self.chain_in.tick(chain_in.clone());

        let mut contribution: Option<BigInt> = None;
        let mut add = |value: BigInt| {
            contribution = Some(contribution.take().unwrap_or_default() + value);
        };

        if let (Some(a), Some(b)) = (&a, &b) {
            let product = self.product(a, b, d.as_ref())?;
            trace!(self.entity ; "product {product}");
            if control.negate {
                add(-product.value());
            } else {
                add(product.value().clone());
            }
        }
        if let Some(extra) = &extra {
            match self.config.extra_mode {
                ExtraMode::Add => add(extra.value().clone()),
                ExtraMode::Subtract => add(-extra.value()),
            }
        }
        if self.config.accepts_chain_input && chain.valid {
            add(chain.partial_sum.value().clone());
        }

        if control.clear && self.terminal {
            debug!(self.entity ; "clear");
        }
        let link = self.sequencer.step(control.clear, contribution);
        let link = self.output.tick(link);
        trace!(self.entity ; "chain out {link}");

        let result = if self.terminal {
            Some(MacResult::from_link(&self.accumulator, link.clone()))
        } else {
            None
        };
        Ok(StageOutput {
            chain: link,
            result,
        })
    }
}
