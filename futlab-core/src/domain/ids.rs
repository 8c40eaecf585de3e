use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the strategy that sent a signal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrategyId(pub String);

impl StrategyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StrategyId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for StrategyId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Globally unique order index. Issued in strictly increasing order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct OrderIndex(pub u64);

impl fmt::Display for OrderIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for OrderIndex {
    fn from(index: u64) -> Self {
        Self(index)
    }
}

/// Monotonic order index generator.
///
/// The first index handed out is 1. The generator is part of the checkpoint
/// so a restored session never reissues an index that may still be in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexGen {
    next: u64,
}

impl IndexGen {
    /// Resume from a saved position. `next` is the index the next call returns.
    pub fn starting_at(next: u64) -> Self {
        Self { next: next.max(1) }
    }

    pub fn next_index(&mut self) -> OrderIndex {
        let index = OrderIndex(self.next);
        self.next += 1;
        index
    }

    /// The index the next call to `next_index` will return.
    pub fn peek(&self) -> OrderIndex {
        OrderIndex(self.next)
    }
}

impl Default for IndexGen {
    fn default() -> Self {
        Self { next: 1 }
    }
}
