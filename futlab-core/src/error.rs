//! Error taxonomy for the portfolio core.
//!
//! Every variant is recoverable at the level of a single signal, fill or
//! symbol. Nothing here is allowed to take the hosting process down.

use crate::domain::{OrderIndex, StrategyId, SymbolError};
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PortfolioError {
    #[error("strategy {strategy}: invalid symbol '{symbol}': {source}")]
    InvalidSymbolFormat {
        symbol: String,
        strategy: StrategyId,
        #[source]
        source: SymbolError,
    },

    #[error("strategy {strategy}: unknown signal type '{value}' for '{symbol}'")]
    UnknownSignalType {
        value: String,
        symbol: String,
        strategy: StrategyId,
    },

    #[error("strategy {strategy}: non-finite signal strength {strength} for '{symbol}'")]
    InvalidStrength {
        symbol: String,
        strategy: StrategyId,
        strength: f64,
    },

    #[error("unknown order index {index} (symbol '{symbol}'): never issued or already retired")]
    UnknownOrderIndex { index: OrderIndex, symbol: String },

    #[error("cancel for unknown order index {index}: never issued or already retired")]
    UnknownCancelIndex { index: OrderIndex },

    #[error("order index {index} already attributed to {existing}, refusing to attribute to {incoming}")]
    DuplicateOrderIndex {
        index: OrderIndex,
        existing: StrategyId,
        incoming: StrategyId,
    },
}

/// Why a held symbol could not be priced during settlement.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PriceLookupReason {
    /// The provider reported an error.
    #[error("provider error: {0}")]
    Provider(String),
    /// The provider did not answer within the configured bound.
    #[error("provider timed out")]
    Timeout,
    /// The series has no column with the settlement field name.
    #[error("missing field '{0}'")]
    MissingField(String),
    /// The settlement column exists but holds no values.
    #[error("field '{0}' has no values")]
    EmptySeries(String),
    /// The most recent value is NaN or infinite.
    #[error("non-finite price {0}")]
    NotFinite(f64),
}

/// A single symbol that settlement could not price.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("no settlement price for '{symbol}' on {trading_day}: {reason}")]
pub struct PriceLookupFailure {
    pub symbol: String,
    pub trading_day: NaiveDate,
    pub reason: PriceLookupReason,
}

/// Aggregate result of a settlement pass that could not price every held symbol.
///
/// The prices that did resolve have already been posted to the ledger; the
/// caller decides whether the day counts as incomplete.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("settlement of {trading_day} incomplete: {} symbol(s) unpriced", .failures.len())]
pub struct SettlementFailures {
    pub trading_day: NaiveDate,
    pub failures: Vec<PriceLookupFailure>,
}

impl SettlementFailures {
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|f| f.symbol.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_carry_context_in_message() {
        let err = PortfolioError::InvalidSymbolFormat {
            symbol: "xyz".into(),
            strategy: StrategyId::new("trend"),
            source: SymbolError::BadContractCode {
                symbol: "xyz".into(),
                contract: "".into(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("trend"));
        assert!(msg.contains("xyz"));

        let err = PortfolioError::UnknownOrderIndex {
            index: OrderIndex(12),
            symbol: "rb1710".into(),
        };
        assert!(err.to_string().contains("#12"));
    }

    #[test]
    fn settlement_failures_summarize() {
        let day = NaiveDate::from_ymd_opt(2017, 6, 1).unwrap();
        let failures = SettlementFailures {
            trading_day: day,
            failures: vec![PriceLookupFailure {
                symbol: "ag1712".into(),
                trading_day: day,
                reason: PriceLookupReason::Timeout,
            }],
        };
        assert_eq!(
            failures.to_string(),
            "settlement of 2017-06-01 incomplete: 1 symbol(s) unpriced"
        );
        assert_eq!(failures.symbols().collect::<Vec<_>>(), vec!["ag1712"]);
        assert_eq!(
            failures.failures[0].to_string(),
            "no settlement price for 'ag1712' on 2017-06-01: provider timed out"
        );
    }

    #[test]
    fn lookup_reasons_render_their_detail() {
        let cases = [
            (PriceLookupReason::Provider("refused".into()), "provider error: refused"),
            (PriceLookupReason::Timeout, "provider timed out"),
            (PriceLookupReason::MissingField("settle".into()), "missing field 'settle'"),
            (PriceLookupReason::EmptySeries("settle".into()), "field 'settle' has no values"),
            (PriceLookupReason::NotFinite(f64::INFINITY), "non-finite price inf"),
        ];
        for (reason, expected) in cases {
            let err: &dyn std::error::Error = &reason;
            assert_eq!(err.to_string(), expected);
        }
    }
}
