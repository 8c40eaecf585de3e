//! Position ledger collaborator.
//!
//! The ledger is the authoritative store of positions, pending orders, fills
//! and settlements. The portfolio never caches quantities itself: every
//! netting decision reads the ledger, and every order, fill and settlement is
//! posted back to it.

pub mod memory;

pub use memory::{MemoryLedger, PendingOrder, SettlementRecord, StrategyBook};

use crate::domain::{Fill, Order, OrderIndex, PositionSide, Signal, StrategyId};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Settlement prices for one trading day, keyed by symbol.
pub type PriceSnapshot = BTreeMap<String, f64>;

pub trait PositionLedger {
    /// Record that a strategy sent a signal.
    fn deal_signal(&mut self, signal: &Signal);

    /// Record a pending order on behalf of a strategy.
    fn deal_order(&mut self, strategy: &StrategyId, order: &Order);

    /// Apply an execution to the strategy that owns the order.
    fn deal_fill(&mut self, strategy: &StrategyId, fill: &Fill);

    /// Mark every position to the given prices in one update.
    fn deal_settlement(&mut self, trading_day: NaiveDate, prices: &PriceSnapshot);

    /// Notification that a pending order was cancelled. Ledgers that do not
    /// track pending orders can ignore it.
    fn deal_cancel(&mut self, _strategy: &StrategyId, _index: OrderIndex) {}

    /// Quantity held on one side of `symbol`, aggregated across strategies.
    fn position(&self, symbol: &str, side: PositionSide) -> u64;

    /// Every symbol the ledger knows about.
    fn symbols(&self) -> Vec<String>;
}
