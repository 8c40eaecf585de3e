//! Portfolio core: turns signals into orders, attributes fills, settles.
//!
//! Event flow, one event at a time:
//!
//! 1. Signal: validate, net against the ledger's aggregate position, index
//!    and attribute each order, post every order to the ledger, then emit.
//! 2. Fill: resolve the owning strategy via the attribution map, post to the
//!    ledger, retire the entry once the order is complete.
//! 3. Settlement: price every held symbol, collect failures per symbol,
//!    post the snapshot to the ledger in one update.
//! 4. Market data: forwarded to the market data hook.
//!
//! The portfolio takes `&mut self` for every event, so signals, fills and a
//! settlement pass can never interleave.

pub mod attribution;
pub mod checkpoint;
pub mod fills;
pub mod hook;
pub mod netting;
pub mod settlement;
pub mod signals;

pub use attribution::{Attribution, AttributionMap, FillAttribution};
pub use checkpoint::{CheckpointEntry, CheckpointError, PortfolioCheckpoint};
pub use hook::{MarketDataHook, NoOpMarketHook};
pub use netting::{net_signal, OrderIntent};

use crate::config::PortfolioConfig;
use crate::data::PriceProvider;
use crate::domain::{IndexGen, Order, PointValueTable};
use crate::ledger::PositionLedger;
use chrono::{DateTime, NaiveDate, Utc};

/// The hosting engine, as seen by the portfolio.
pub trait Engine {
    /// Current trading day.
    fn trading_day(&self) -> NaiveDate;

    /// Current event time.
    fn timestamp(&self) -> DateTime<Utc>;

    /// Send an order toward execution. One-way.
    fn submit(&mut self, order: Order);
}

/// Trading-day and time context stamped onto generated orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClock {
    pub trading_day: NaiveDate,
    pub timestamp: DateTime<Utc>,
}

impl SessionClock {
    pub fn new(trading_day: NaiveDate, timestamp: DateTime<Utc>) -> Self {
        Self {
            trading_day,
            timestamp,
        }
    }

    pub fn of<E: Engine + ?Sized>(engine: &E) -> Self {
        Self::new(engine.trading_day(), engine.timestamp())
    }
}

pub struct Portfolio<L, P> {
    ledger: L,
    prices: P,
    point_values: PointValueTable,
    attribution: AttributionMap,
    index_gen: IndexGen,
    settlement_field: String,
    hook: Box<dyn MarketDataHook>,
}

impl<L: PositionLedger, P: PriceProvider> Portfolio<L, P> {
    pub fn new(ledger: L, prices: P, config: &PortfolioConfig) -> Self {
        Self {
            ledger,
            prices,
            point_values: config.point_value_table(),
            attribution: AttributionMap::new(),
            index_gen: IndexGen::default(),
            settlement_field: config.settlement_field.clone(),
            hook: Box::new(NoOpMarketHook),
        }
    }

    /// Replace the market data hook.
    pub fn with_hook(mut self, hook: impl MarketDataHook + 'static) -> Self {
        self.hook = Box::new(hook);
        self
    }

    /// Replace the point-value table.
    pub fn with_point_values(mut self, point_values: PointValueTable) -> Self {
        self.point_values = point_values;
        self
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn prices(&self) -> &P {
        &self.prices
    }

    pub fn attribution(&self) -> &AttributionMap {
        &self.attribution
    }

    pub fn point_values(&self) -> &PointValueTable {
        &self.point_values
    }

    pub fn settlement_field(&self) -> &str {
        &self.settlement_field
    }

    /// Index the next generated order will receive.
    pub fn next_order_index(&self) -> crate::domain::OrderIndex {
        self.index_gen.peek()
    }

    pub fn into_ledger(self) -> L {
        self.ledger
    }
}
