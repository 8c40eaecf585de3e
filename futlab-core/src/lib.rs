//! FutLab Core: order and position reconciliation for a futures trading engine.
//!
//! This crate sits between strategies and execution:
//! - Domain types (signals, orders, fills, positions, bars, instruments)
//! - Directional netting of a signal into the minimal order set
//! - Order attribution so fills land in the right strategy's book
//! - End-of-day settlement against a price provider, with per-symbol failures
//! - Checkpoint/restore of in-flight attribution state
//! - Point-value table and futures symbol grammar

pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod portfolio;

pub use config::{ConfigError, PortfolioConfig};
pub use error::{PortfolioError, PriceLookupFailure, PriceLookupReason, SettlementFailures};
pub use portfolio::{Engine, Portfolio, SessionClock};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: domain and state types can cross threads.
    ///
    /// The portfolio itself is only `Send`: the market data hook is `&mut`
    /// state owned by one event loop.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Signal>();
        require_sync::<domain::Signal>();
        require_send::<domain::Order>();
        require_sync::<domain::Order>();
        require_send::<domain::Fill>();
        require_sync::<domain::Fill>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::PointValueTable>();
        require_sync::<domain::PointValueTable>();

        // ID types
        require_send::<domain::StrategyId>();
        require_sync::<domain::StrategyId>();
        require_send::<domain::OrderIndex>();
        require_sync::<domain::OrderIndex>();

        // State
        require_send::<portfolio::AttributionMap>();
        require_sync::<portfolio::AttributionMap>();
        require_send::<portfolio::PortfolioCheckpoint>();
        require_sync::<portfolio::PortfolioCheckpoint>();
        require_send::<ledger::MemoryLedger>();
        require_sync::<ledger::MemoryLedger>();
        require_send::<Portfolio<ledger::MemoryLedger, data::InMemoryPrices>>();

        // Errors
        require_send::<PortfolioError>();
        require_sync::<PortfolioError>();
        require_send::<SettlementFailures>();
        require_sync::<SettlementFailures>();
    }

    /// Netting reads positions through the ledger trait, never a cache.
    #[test]
    fn portfolio_reads_positions_through_the_ledger() {
        use domain::{Position, Signal, StrategyId};
        use ledger::{MemoryLedger, PositionLedger};

        let mut pf = Portfolio::new(
            MemoryLedger::new(),
            data::InMemoryPrices::new(),
            &PortfolioConfig::default(),
        );
        let clock = SessionClock::new(
            chrono::NaiveDate::from_ymd_opt(2017, 6, 1).unwrap(),
            chrono::DateTime::<chrono::Utc>::from_timestamp(1_496_300_000, 0).unwrap(),
        );
        pf.ledger_mut()
            .set_position(&StrategyId::new("other"), "rb1710", Position::new(3, 0));
        assert_eq!(pf.ledger().position("rb1710", domain::PositionSide::Long), 3);

        let orders = pf
            .process_signal(&Signal::long("rb1710", "trend", 3.0), clock)
            .unwrap();
        assert!(orders.is_empty());
    }
}
