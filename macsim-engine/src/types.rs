// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Shared types.

use std::error::Error;
use std::fmt;

// Simulation errors

#[macro_export]
/// Build a [SimError] from a message that supports `to_string`
macro_rules! sim_error {
    ($msg:expr) => {
        Err($crate::types::SimError($msg.to_string()))
    };
}

/// The `SimError` is what should be returned in the case of an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimError(pub String);

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Error: {}", self.0)
    }
}

impl Error for SimError {}

/// The SimResult is the return type for most simulation functions
pub type SimResult = Result<(), SimError>;

/// Errors detected while building a pipeline.
///
/// Each variant names the construction invariant that was violated. These are
/// never produced once a pipeline is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A width that must be at least one bit was zero.
    ZeroWidth { what: &'static str },

    /// The product plus its guard bits does not fit in the accumulator.
    InsufficientGuardBits {
        product_width: u32,
        guard_bits: u32,
        max_accumulator_width: u32,
    },

    /// Clipping or overflow reporting needs a sign bit and a value bit.
    OutputWidthTooSmall { output_width: u32, minimum: u32 },

    /// The output shift discards more bits than the accumulator holds.
    ShiftTooLarge {
        shift_right: u32,
        accumulator_width: u32,
    },

    /// Two recombined branches do not arrive on the same tick.
    MisalignedLatency { left: usize, right: usize },

    /// A path was built without any stages.
    EmptyChain,

    /// Any other topology problem.
    InvalidTopology(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::ZeroWidth { what } => write!(f, "{what} must be at least 1 bit"),
            ConfigError::InsufficientGuardBits {
                product_width,
                guard_bits,
                max_accumulator_width,
            } => write!(
                f,
                "product width {product_width} + {guard_bits} guard bits exceeds maximum accumulator width {max_accumulator_width}"
            ),
            ConfigError::OutputWidthTooSmall {
                output_width,
                minimum,
            } => write!(
                f,
                "output width {output_width} is below the minimum of {minimum} bits for clip/overflow reporting"
            ),
            ConfigError::ShiftTooLarge {
                shift_right,
                accumulator_width,
            } => write!(
                f,
                "shift right of {shift_right} exceeds accumulator width {accumulator_width}"
            ),
            ConfigError::MisalignedLatency { left, right } => write!(
                f,
                "misaligned branch latencies after compensation: left {left}, right {right}"
            ),
            ConfigError::EmptyChain => write!(f, "a chain must contain at least one stage"),
            ConfigError::InvalidTopology(msg) => write!(f, "invalid topology: {msg}"),
        }
    }
}

impl Error for ConfigError {}

impl From<ConfigError> for SimError {
    fn from(e: ConfigError) -> Self {
        SimError(format!("configuration: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing() -> Result<u32, SimError> {
        sim_error!(format!("bad value {}", 3))
    }

    #[test]
    fn sim_error_display() {
        let err = failing().unwrap_err();
        assert_eq!(err.to_string(), "Error: bad value 3");
    }

    #[test]
    fn config_error_converts() {
        let err: SimError = ConfigError::MisalignedLatency { left: 5, right: 3 }.into();
        assert_eq!(
            err.to_string(),
            "Error: configuration: misaligned branch latencies after compensation: left 5, right 3"
        );
    }
}
