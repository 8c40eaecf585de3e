//! In-memory price table, used by tests and for pre-loaded sessions.

use super::provider::{PriceError, PriceProvider, PriceSeries};
use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct InMemoryPrices {
    series: HashMap<(NaiveDate, String), PriceSeries>,
}

impl InMemoryPrices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, trading_day: NaiveDate, symbol: &str, series: PriceSeries) {
        self.series.insert((trading_day, symbol.to_string()), series);
    }

    /// Convenience: store a single value for one field.
    pub fn set_price(&mut self, trading_day: NaiveDate, symbol: &str, field: &str, price: f64) {
        self.series
            .entry((trading_day, symbol.to_string()))
            .or_default()
            .set(field, vec![price]);
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl PriceProvider for InMemoryPrices {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch(&self, trading_day: NaiveDate, symbol: &str) -> Result<PriceSeries, PriceError> {
        self.series
            .get(&(trading_day, symbol.to_string()))
            .cloned()
            .ok_or_else(|| PriceError::NotFound {
                symbol: symbol.to_string(),
                trading_day,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_hits_and_misses() {
        let day = NaiveDate::from_ymd_opt(2017, 6, 1).unwrap();
        let mut prices = InMemoryPrices::new();
        prices.set_price(day, "rb1710", "closeprice", 3120.0);

        let series = prices.fetch(day, "rb1710").unwrap();
        assert_eq!(series.latest("closeprice"), Some(3120.0));

        let err = prices.fetch(day, "hc1710").unwrap_err();
        assert!(matches!(err, PriceError::NotFound { .. }));

        let next_day = day.succ_opt().unwrap();
        assert!(prices.fetch(next_day, "rb1710").is_err());
    }
}
