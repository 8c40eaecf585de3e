//! In-memory reference ledger.
//!
//! Tracks quantities only: per-strategy, per-symbol long/short positions,
//! pending orders with their unfilled remainder, and a settlement history.
//! PnL and margin arithmetic belong to the accounting layer, not here.

use super::{PositionLedger, PriceSnapshot};
use crate::domain::{Action, Fill, Order, OrderIndex, Position, PositionSide, Signal, StrategyId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A pending order and its unfilled quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub order: Order,
    pub remaining: u64,
}

/// Everything the ledger knows about one strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyBook {
    pub positions: BTreeMap<String, Position>,
    pub pending: BTreeMap<OrderIndex, PendingOrder>,
    pub signal_count: u64,
    pub fill_count: u64,
    pub commission: f64,
}

impl StrategyBook {
    pub fn position(&self, symbol: &str) -> Position {
        self.positions.get(symbol).copied().unwrap_or_default()
    }
}

/// Prices and aggregate positions at one settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub trading_day: NaiveDate,
    pub prices: PriceSnapshot,
    pub positions: BTreeMap<String, Position>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryLedger {
    books: BTreeMap<StrategyId, StrategyBook>,
    symbols: BTreeSet<String>,
    settlements: Vec<SettlementRecord>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a position directly, e.g. when restoring from an external source.
    pub fn set_position(&mut self, strategy: &StrategyId, symbol: &str, position: Position) {
        self.symbols.insert(symbol.to_string());
        self.books
            .entry(strategy.clone())
            .or_default()
            .positions
            .insert(symbol.to_string(), position);
    }

    pub fn book(&self, strategy: &StrategyId) -> Option<&StrategyBook> {
        self.books.get(strategy)
    }

    pub fn strategies(&self) -> impl Iterator<Item = &StrategyId> {
        self.books.keys()
    }

    /// Aggregate position across all strategies.
    pub fn aggregate(&self, symbol: &str) -> Position {
        self.books.values().fold(Position::default(), |mut acc, book| {
            let pos = book.position(symbol);
            acc.long += pos.long;
            acc.short += pos.short;
            acc
        })
    }

    pub fn settlements(&self) -> &[SettlementRecord] {
        &self.settlements
    }

    pub fn pending_count(&self) -> usize {
        self.books.values().map(|b| b.pending.len()).sum()
    }
}

impl PositionLedger for MemoryLedger {
    fn deal_signal(&mut self, signal: &Signal) {
        self.symbols.insert(signal.symbol.clone());
        self.books
            .entry(signal.strategy.clone())
            .or_default()
            .signal_count += 1;
    }

    fn deal_order(&mut self, strategy: &StrategyId, order: &Order) {
        self.symbols.insert(order.symbol.clone());
        self.books.entry(strategy.clone()).or_default().pending.insert(
            order.index,
            PendingOrder {
                order: order.clone(),
                remaining: order.quantity,
            },
        );
    }

    fn deal_fill(&mut self, strategy: &StrategyId, fill: &Fill) {
        self.symbols.insert(fill.symbol.clone());
        let book = self.books.entry(strategy.clone()).or_default();
        book.fill_count += 1;
        book.commission += fill.commission;

        if let Some(pending) = book.pending.get_mut(&fill.order_index) {
            pending.remaining = pending.remaining.saturating_sub(fill.quantity);
            if pending.remaining == 0 {
                book.pending.remove(&fill.order_index);
            }
        }

        let side = fill.direction.affected_side(fill.action);
        let position = book.positions.entry(fill.symbol.clone()).or_default();
        match fill.action {
            Action::Open => position.increase(side, fill.quantity),
            Action::Close => {
                let removed = position.decrease(side, fill.quantity);
                if removed < fill.quantity {
                    tracing::warn!(
                        %strategy,
                        symbol = %fill.symbol,
                        index = %fill.order_index,
                        requested = fill.quantity,
                        removed,
                        "close fill exceeds held quantity"
                    );
                }
            }
        }
    }

    fn deal_settlement(&mut self, trading_day: NaiveDate, prices: &PriceSnapshot) {
        let positions = self
            .symbols
            .iter()
            .map(|s| (s.clone(), self.aggregate(s)))
            .filter(|(_, p)| !p.is_flat())
            .collect();
        self.settlements.push(SettlementRecord {
            trading_day,
            prices: prices.clone(),
            positions,
        });
    }

    fn deal_cancel(&mut self, strategy: &StrategyId, index: OrderIndex) {
        if let Some(book) = self.books.get_mut(strategy) {
            book.pending.remove(&index);
        }
    }

    fn position(&self, symbol: &str, side: PositionSide) -> u64 {
        self.aggregate(symbol).get(side)
    }

    fn symbols(&self) -> Vec<String> {
        self.symbols.iter().cloned().collect()
    }
}
