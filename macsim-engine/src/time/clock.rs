// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Simulation time.
//!
//! Time is a count of synchronous clock ticks. Every register in a pipeline
//! advances on the same tick.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// A point in simulation time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTick(u64);

impl ClockTick {
    #[must_use]
    pub fn tick(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn next(self) -> ClockTick {
        ClockTick(self.0 + 1)
    }
}

impl fmt::Display for ClockTick {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The time seen by every part of a pipeline.
///
/// Clones share one time.
#[derive(Clone, Default)]
pub struct Clock {
    now: Rc<Cell<ClockTick>>,
}

impl Clock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn time_now(&self) -> ClockTick {
        self.now.get()
    }

    /// Move on by one tick and return the new time.
    pub fn advance(&self) -> ClockTick {
        let next = self.now.get().next();
        self.now.set(next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_time() {
        let clock = Clock::new();
        let other = clock.clone();
        assert_eq!(clock.time_now(), ClockTick::default());
        clock.advance();
        assert_eq!(clock.advance().tick(), 2);
        assert_eq!(other.time_now().tick(), 2);
        assert_eq!(other.time_now().to_string(), "2");
    }
}
