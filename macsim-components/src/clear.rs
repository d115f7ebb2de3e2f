// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

/// Generates the `clear` flag for dot products of a fixed length.
///
/// The clear is raised on the first valid tick of every group of
/// `num_summands` valid ticks. With `num_summands` of zero the clear is only
/// raised on the very first valid tick.
pub struct ClearGenerator {
    num_summands: u64,
    num_valid: u64,
}

impl ClearGenerator {
    #[must_use]
    pub fn new(num_summands: u64) -> Self {
        Self {
            num_summands,
            num_valid: 0,
        }
    }

    /// Return the clear flag for a tick whose data is `valid`.
    pub fn next_clear(&mut self, valid: bool) -> bool {
        if !valid {
            return false;
        }
        let clear = match self.num_summands {
            0 => self.num_valid == 0,
            n => self.num_valid % n == 0,
        };
        self.num_valid += 1;
        clear
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups() {
        let mut clear = ClearGenerator::new(3);
        let valid = [true, false, true, true, true, false, true, true];
        let clears: Vec<_> = valid.iter().map(|v| clear.next_clear(*v)).collect();
        assert_eq!(
            clears,
            vec![true, false, false, false, true, false, false, false]
        );
    }

    #[test]
    fn unknown_length() {
        let mut clear = ClearGenerator::new(0);
        assert!(!clear.next_clear(false));
        assert!(clear.next_clear(true));
        for _ in 0..10 {
            assert!(!clear.next_clear(true));
        }
    }
}
