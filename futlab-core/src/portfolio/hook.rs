//! Market data extension point.

use super::Portfolio;
use crate::data::PriceProvider;
use crate::domain::Bar;
use crate::ledger::PositionLedger;

/// Receives every bar delivered to the portfolio. Does nothing by default.
pub trait MarketDataHook: Send {
    fn on_market_data(&mut self, _symbol: &str, _bar: &Bar) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMarketHook;

impl MarketDataHook for NoOpMarketHook {}

impl<L: PositionLedger, P: PriceProvider> Portfolio<L, P> {
    pub fn on_market_data(&mut self, symbol: &str, bar: &Bar) {
        tracing::trace!(symbol, trading_day = %bar.trading_day, close = bar.close, "market data");
        self.hook.on_market_data(symbol, bar);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PortfolioConfig;
    use crate::data::InMemoryPrices;
    use crate::ledger::MemoryLedger;
    use chrono::NaiveDate;
    use std::sync::{Arc, Mutex};

    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl MarketDataHook for Recorder {
        fn on_market_data(&mut self, symbol: &str, _bar: &Bar) {
            self.0.lock().unwrap().push(symbol.to_string());
        }
    }

    fn bar() -> Bar {
        Bar {
            symbol: "rb1710".into(),
            trading_day: NaiveDate::from_ymd_opt(2017, 6, 1).unwrap(),
            open: 3100.0,
            high: 3130.0,
            low: 3090.0,
            close: 3120.0,
            volume: 1000,
            open_interest: 0,
        }
    }

    #[test]
    fn default_hook_leaves_state_alone() {
        let mut pf = Portfolio::new(
            MemoryLedger::new(),
            InMemoryPrices::new(),
            &PortfolioConfig::default(),
        );
        pf.on_market_data("rb1710", &bar());
        assert!(pf.ledger().symbols().is_empty());
        assert!(pf.attribution().is_empty());
    }

    #[test]
    fn custom_hook_sees_each_bar() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut pf = Portfolio::new(
            MemoryLedger::new(),
            InMemoryPrices::new(),
            &PortfolioConfig::default(),
        )
        .with_hook(Recorder(Arc::clone(&seen)));
        pf.on_market_data("rb1710", &bar());
        pf.on_market_data("hc1710", &bar());
        assert_eq!(*seen.lock().unwrap(), vec!["rb1710", "hc1710"]);
    }
}
