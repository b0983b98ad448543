//! The memory tape: a fixed number of byte cells arranged in a ring, plus the
//! cursor addressing the current cell.

use std::fmt;

use crate::config::ConfigError;

/// Default number of cells on a freshly constructed tape.
pub const DEFAULT_TAPE_SIZE: usize = 30_000;

/// How `+` and `-` behave at the edges of a cell's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellArithmetic {
    /// Clamp to `0..=255`: incrementing 255 stays 255, decrementing 0 stays 0.
    #[default]
    Saturating,
    /// Wrap modulo 256.
    Wrapping,
}

impl CellArithmetic {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "saturating" | "saturate" | "clamp" => Some(Self::Saturating),
            "wrapping" | "wrap" => Some(Self::Wrapping),
            _ => None,
        }
    }
}

impl fmt::Display for CellArithmetic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellArithmetic::Saturating => write!(f, "saturating"),
            CellArithmetic::Wrapping => write!(f, "wrapping"),
        }
    }
}

/// A circular tape of `u8` cells.
///
/// The cursor is always a valid index: moving past the last cell lands on
/// cell 0, and moving back from cell 0 lands on the last cell.
#[derive(Debug, Clone)]
pub struct Tape {
    cells: Vec<u8>,
    cursor: usize,
    arithmetic: CellArithmetic,
}

impl Tape {
    /// Create a zeroed tape with `size` cells.
    pub fn new(size: usize, arithmetic: CellArithmetic) -> Result<Self, ConfigError> {
        if size == 0 {
            return Err(ConfigError::ZeroTapeSize);
        }
        Ok(Self {
            cells: vec![0; size],
            cursor: 0,
            arithmetic,
        })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn arithmetic(&self) -> CellArithmetic {
        self.arithmetic
    }

    /// Zero every cell and return the cursor to cell 0.
    pub fn reset(&mut self) {
        self.cells.fill(0);
        self.cursor = 0;
    }

    pub fn move_forward(&mut self) {
        self.cursor += 1;
        if self.cursor == self.cells.len() {
            self.cursor = 0;
        }
    }

    pub fn move_backward(&mut self) {
        self.cursor = self.cursor.checked_sub(1).unwrap_or(self.cells.len() - 1);
    }

    #[inline]
    pub fn current_value(&self) -> u8 {
        self.cells[self.cursor]
    }

    #[inline]
    pub fn set_current_value(&mut self, value: u8) {
        self.cells[self.cursor] = value;
    }

    pub fn increment(&mut self) {
        let cell = &mut self.cells[self.cursor];
        *cell = match self.arithmetic {
            CellArithmetic::Saturating => cell.saturating_add(1),
            CellArithmetic::Wrapping => cell.wrapping_add(1),
        };
    }

    pub fn decrement(&mut self) {
        let cell = &mut self.cells[self.cursor];
        *cell = match self.arithmetic {
            CellArithmetic::Saturating => cell.saturating_sub(1),
            CellArithmetic::Wrapping => cell.wrapping_sub(1),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tape(size: usize) -> Tape {
        Tape::new(size, CellArithmetic::Saturating).unwrap()
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(matches!(
            Tape::new(0, CellArithmetic::Saturating),
            Err(ConfigError::ZeroTapeSize)
        ));
    }

    #[test]
    fn forward_from_last_cell_wraps_to_zero() {
        let mut t = tape(3);
        t.move_forward();
        t.move_forward();
        assert_eq!(t.cursor(), 2);
        t.move_forward();
        assert_eq!(t.cursor(), 0);
    }

    #[test]
    fn backward_from_zero_wraps_to_last_cell() {
        let mut t = tape(3);
        t.move_backward();
        assert_eq!(t.cursor(), 2);
    }

    #[test]
    fn single_cell_tape_stays_put() {
        let mut t = tape(1);
        t.move_forward();
        assert_eq!(t.cursor(), 0);
        t.move_backward();
        assert_eq!(t.cursor(), 0);
    }

    #[test]
    fn saturating_increment_stops_at_255() {
        let mut t = tape(1);
        t.set_current_value(255);
        for _ in 0..10 {
            t.increment();
        }
        assert_eq!(t.current_value(), 255);
    }

    #[test]
    fn saturating_decrement_stops_at_zero() {
        let mut t = tape(1);
        for _ in 0..10 {
            t.decrement();
        }
        assert_eq!(t.current_value(), 0);
    }

    #[test]
    fn wrapping_policy_wraps_both_ways() {
        let mut t = Tape::new(1, CellArithmetic::Wrapping).unwrap();
        t.decrement();
        assert_eq!(t.current_value(), 255);
        t.increment();
        assert_eq!(t.current_value(), 0);
    }

    #[test]
    fn reset_zeroes_cells_and_cursor() {
        let mut t = tape(4);
        t.move_forward();
        t.increment();
        t.reset();
        assert_eq!(t.cursor(), 0);
        assert_eq!(t.cells(), &[0, 0, 0, 0]);
        assert_eq!(t.len(), 4);
    }

    #[test]
    fn arithmetic_names_parse() {
        assert_eq!(CellArithmetic::parse("wrap"), Some(CellArithmetic::Wrapping));
        assert_eq!(CellArithmetic::parse(" Saturating "), Some(CellArithmetic::Saturating));
        assert_eq!(CellArithmetic::parse("modular"), None);
    }

    proptest! {
        #[test]
        fn cursor_tracks_net_moves(size in 1usize..64, moves in prop::collection::vec(any::<bool>(), 0..512)) {
            let mut t = tape(size);
            let mut net: i64 = 0;
            for forward in moves {
                if forward {
                    t.move_forward();
                    net += 1;
                } else {
                    t.move_backward();
                    net -= 1;
                }
            }
            let expected = net.rem_euclid(size as i64) as usize;
            prop_assert_eq!(t.cursor(), expected);
        }

        #[test]
        fn saturating_cells_never_leave_range(start in any::<u8>(), ups in 0usize..600, downs in 0usize..600) {
            let mut t = tape(1);
            t.set_current_value(start);
            for _ in 0..ups {
                t.increment();
            }
            prop_assert_eq!(t.current_value() as usize, (start as usize + ups).min(255));
            let before = t.current_value() as usize;
            for _ in 0..downs {
                t.decrement();
            }
            prop_assert_eq!(t.current_value() as usize, before.saturating_sub(downs));
        }
    }
}
