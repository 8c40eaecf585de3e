use serde::{Deserialize, Serialize};

/// Which side of a two-sided futures position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionSide {
    Long,
    Short,
}

/// Two-sided position in one symbol.
///
/// Futures accounts hold long and short quantities separately; both are
/// non-negative and the symbol is flat when both are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub long: u64,
    pub short: u64,
}

impl Position {
    pub fn new(long: u64, short: u64) -> Self {
        Self { long, short }
    }

    pub fn is_flat(&self) -> bool {
        self.long == 0 && self.short == 0
    }

    pub fn get(&self, side: PositionSide) -> u64 {
        match side {
            PositionSide::Long => self.long,
            PositionSide::Short => self.short,
        }
    }

    /// Add to one side.
    pub fn increase(&mut self, side: PositionSide, qty: u64) {
        match side {
            PositionSide::Long => self.long += qty,
            PositionSide::Short => self.short += qty,
        }
    }

    /// Reduce one side, saturating at zero. Returns the quantity actually removed.
    pub fn decrease(&mut self, side: PositionSide, qty: u64) -> u64 {
        let slot = match side {
            PositionSide::Long => &mut self.long,
            PositionSide::Short => &mut self.short,
        };
        let removed = qty.min(*slot);
        *slot -= removed;
        removed
    }

    /// Signed net exposure (long − short).
    pub fn net(&self) -> i128 {
        self.long as i128 - self.short as i128
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_when_both_sides_zero() {
        assert!(Position::default().is_flat());
        assert!(!Position::new(0, 1).is_flat());
    }

    #[test]
    fn decrease_saturates() {
        let mut pos = Position::new(3, 2);
        assert_eq!(pos.decrease(PositionSide::Long, 5), 3);
        assert_eq!(pos.long, 0);
        assert_eq!(pos.decrease(PositionSide::Short, 1), 1);
        assert_eq!(pos.short, 1);
    }

    #[test]
    fn net_exposure() {
        let mut pos = Position::default();
        pos.increase(PositionSide::Long, 5);
        pos.increase(PositionSide::Short, 8);
        assert_eq!(pos.net(), -3);
        assert_eq!(pos.get(PositionSide::Short), 8);
    }
}
