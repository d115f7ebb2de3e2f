// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! A bank of registers that delays everything passing through it by
//! `delay_ticks`.
//!
//! The line is filled with a reset value at construction so that the first
//! `delay_ticks` outputs are the reset value. A delay of zero passes the input
//! straight through in the same tick.
//!
//! # Example
//!
//! ```rust
//! use macsim_components::delay::DelayLine;
//!
//! let mut delay = DelayLine::new(2, 0);
//! assert_eq!(delay.tick(5), 0);
//! assert_eq!(delay.tick(6), 0);
//! assert_eq!(delay.tick(7), 5);
//! ```

use std::collections::VecDeque;

#[derive(Clone, Debug)]
pub struct DelayLine<T> {
    delay_ticks: usize,
    reset: T,
    pending: VecDeque<T>,
}

impl<T> DelayLine<T>
where
    T: Clone,
{
    #[must_use]
    pub fn new(delay_ticks: usize, reset: T) -> Self {
        let mut pending = VecDeque::with_capacity(delay_ticks);
        pending.extend(std::iter::repeat_n(reset.clone(), delay_ticks));
        Self {
            delay_ticks,
            reset,
            pending,
        }
    }

    #[must_use]
    pub fn delay_ticks(&self) -> usize {
        self.delay_ticks
    }

    /// Advance one tick: accept `value` and return the value that entered
    /// `delay_ticks` ticks ago.
    pub fn tick(&mut self, value: T) -> T {
        if self.delay_ticks == 0 {
            return value;
        }
        let out = self
            .pending
            .pop_front()
            .unwrap_or_else(|| self.reset.clone());
        self.pending.push_back(value);
        out
    }

    /// Return every register to the reset value.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.pending
            .extend(std::iter::repeat_n(self.reset.clone(), self.delay_ticks));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_delay_passes_through() {
        let mut delay = DelayLine::new(0, -1);
        for i in 0..4 {
            assert_eq!(delay.tick(i), i);
        }
    }

    #[test]
    fn values_emerge_after_delay() {
        let delay_ticks = 3;
        let mut delay = DelayLine::new(delay_ticks, None);
        assert_eq!(delay.delay_ticks(), delay_ticks);
        let outputs: Vec<_> = (0..8).map(|i| delay.tick(Some(i))).collect();
        assert_eq!(
            outputs,
            vec![None, None, None, Some(0), Some(1), Some(2), Some(3), Some(4)]
        );
    }

    #[test]
    fn reset_refills() {
        let mut delay = DelayLine::new(1, 0);
        delay.tick(9);
        delay.reset();
        assert_eq!(delay.tick(1), 0);
        assert_eq!(delay.tick(2), 1);
    }
}
