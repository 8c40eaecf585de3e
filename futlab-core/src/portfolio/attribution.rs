//! Order attribution: which strategy asked for which order.
//!
//! An entry is written when the signal processor emits an order and retired
//! when the order reaches a terminal state (fully filled or cancelled), so
//! the map only ever holds orders that are still in flight.

use crate::domain::{OrderIndex, StrategyId};
use crate::error::PortfolioError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// In-flight order owned by a strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    pub strategy: StrategyId,
    pub symbol: String,
    /// Quantity not yet reported filled.
    pub remaining: u64,
}

/// Outcome of booking a fill against an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillAttribution {
    pub strategy: StrategyId,
    pub remaining: u64,
    /// The entry reached zero remaining and was removed.
    pub retired: bool,
    /// Quantity reported beyond what the order still had open.
    pub overfill: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionMap {
    entries: BTreeMap<OrderIndex, Attribution>,
}

impl AttributionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute a freshly issued order. Never overwrites: a collision means the
    /// index generator handed out the same index twice.
    pub fn register(
        &mut self,
        index: OrderIndex,
        strategy: &StrategyId,
        symbol: &str,
        quantity: u64,
    ) -> Result<(), PortfolioError> {
        if let Some(existing) = self.entries.get(&index) {
            return Err(PortfolioError::DuplicateOrderIndex {
                index,
                existing: existing.strategy.clone(),
                incoming: strategy.clone(),
            });
        }
        self.entries.insert(
            index,
            Attribution {
                strategy: strategy.clone(),
                symbol: symbol.to_string(),
                remaining: quantity,
            },
        );
        Ok(())
    }

    pub fn resolve(&self, index: OrderIndex) -> Option<&StrategyId> {
        self.entries.get(&index).map(|a| &a.strategy)
    }

    pub fn get(&self, index: OrderIndex) -> Option<&Attribution> {
        self.entries.get(&index)
    }

    /// Book `quantity` filled against `index`, retiring the entry once nothing
    /// remains. Returns `None` if the index is not in flight.
    pub fn record_fill(&mut self, index: OrderIndex, quantity: u64) -> Option<FillAttribution> {
        let entry = self.entries.get_mut(&index)?;
        let overfill = quantity.saturating_sub(entry.remaining);
        entry.remaining = entry.remaining.saturating_sub(quantity);

        let strategy = entry.strategy.clone();
        let remaining = entry.remaining;
        let retired = remaining == 0;
        if retired {
            self.entries.remove(&index);
        }

        Some(FillAttribution {
            strategy,
            remaining,
            retired,
            overfill,
        })
    }

    /// Remove an entry (order cancelled or otherwise terminal).
    pub fn retire(&mut self, index: OrderIndex) -> Option<Attribution> {
        self.entries.remove(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// In-flight entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = (OrderIndex, &Attribution)> {
        self.entries.iter().map(|(i, a)| (*i, a))
    }

    /// Highest index currently in flight.
    pub fn max_index(&self) -> Option<OrderIndex> {
        self.entries.keys().next_back().copied()
    }
}
