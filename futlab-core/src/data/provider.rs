//! Price provider trait and structured error types.
//!
//! The PriceProvider trait abstracts over settlement price sources (in-memory
//! tables, CSV exports, remote services) so the settlement engine can be
//! driven by real data or mocked in tests.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;

/// Structured error types for price lookups.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PriceError {
    #[error("no price data for '{symbol}' on {trading_day}")]
    NotFound {
        symbol: String,
        trading_day: NaiveDate,
    },

    #[error("price provider timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("price source I/O error: {0}")]
    Io(String),

    #[error("price source parse error: {0}")]
    Parse(String),

    #[error("price provider error: {0}")]
    Other(String),
}

/// Time series for one symbol and trading day, keyed by field name.
///
/// Each field holds its values most recent first, so `latest` is the value a
/// settlement pass reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    fields: BTreeMap<String, Vec<f64>>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style single-value field.
    pub fn with(mut self, field: &str, value: f64) -> Self {
        self.fields.insert(field.to_string(), vec![value]);
        self
    }

    /// Replace a field's values (most recent first).
    pub fn set(&mut self, field: &str, values: Vec<f64>) {
        self.fields.insert(field.to_string(), values);
    }

    /// Record a value more recent than everything already held for `field`.
    pub fn push_latest(&mut self, field: &str, value: f64) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .insert(0, value);
    }

    pub fn field(&self, name: &str) -> Option<&[f64]> {
        self.fields.get(name).map(|v| v.as_slice())
    }

    /// Most recent value of a field.
    pub fn latest(&self, name: &str) -> Option<f64> {
        self.field(name).and_then(|v| v.first().copied())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Trait for settlement price sources.
///
/// `fetch` is synchronous and may block; wrap slow sources in a
/// `TimeoutPriceProvider` to bound it.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the price series for `symbol` on `trading_day`.
    fn fetch(&self, trading_day: NaiveDate, symbol: &str) -> Result<PriceSeries, PriceError>;
}

impl<P: PriceProvider + ?Sized> PriceProvider for std::sync::Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self, trading_day: NaiveDate, symbol: &str) -> Result<PriceSeries, PriceError> {
        (**self).fetch(trading_day, symbol)
    }
}

impl<P: PriceProvider + ?Sized> PriceProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self, trading_day: NaiveDate, symbol: &str) -> Result<PriceSeries, PriceError> {
        (**self).fetch(trading_day, symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_reads_first_value() {
        let mut series = PriceSeries::new();
        series.set("closeprice", vec![3120.0, 3100.0]);
        assert_eq!(series.latest("closeprice"), Some(3120.0));
        assert_eq!(series.latest("openprice"), None);
    }

    #[test]
    fn push_latest_prepends() {
        let mut series = PriceSeries::new().with("closeprice", 10.0);
        series.push_latest("closeprice", 11.0);
        assert_eq!(series.field("closeprice"), Some(&[11.0, 10.0][..]));
    }

    #[test]
    fn empty_field_has_no_latest() {
        let mut series = PriceSeries::new();
        series.set("closeprice", vec![]);
        assert!(!series.is_empty());
        assert_eq!(series.latest("closeprice"), None);
        assert_eq!(series.field_names().collect::<Vec<_>>(), vec!["closeprice"]);
    }
}
