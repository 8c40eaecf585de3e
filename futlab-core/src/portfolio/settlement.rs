//! End-of-day settlement: price every held symbol and mark the ledger.

use super::Portfolio;
use crate::data::{PriceError, PriceProvider, PriceSeries};
use crate::domain::PositionSide;
use crate::error::{PriceLookupFailure, PriceLookupReason, SettlementFailures};
use crate::ledger::{PositionLedger, PriceSnapshot};
use chrono::NaiveDate;

impl<L: PositionLedger, P: PriceProvider> Portfolio<L, P> {
    /// Symbols with a non-flat aggregate position, in ledger order.
    pub fn held_symbols(&self) -> Vec<String> {
        self.ledger
            .symbols()
            .into_iter()
            .filter(|symbol| {
                self.ledger.position(symbol, PositionSide::Long) > 0
                    || self.ledger.position(symbol, PositionSide::Short) > 0
            })
            .collect()
    }

    /// Run one settlement pass for `trading_day`.
    ///
    /// A symbol that cannot be priced is recorded as a failure and skipped;
    /// the rest still settle. The snapshot of resolved prices is posted to
    /// the ledger in a single update whether or not failures occurred.
    pub fn settle(&mut self, trading_day: NaiveDate) -> Result<PriceSnapshot, SettlementFailures> {
        let held = self.held_symbols();
        let mut snapshot = PriceSnapshot::new();
        let mut failures = Vec::new();

        for symbol in held {
            let priced = self
                .prices
                .fetch(trading_day, &symbol)
                .map_err(lookup_reason)
                .and_then(|series| extract_price(&series, &self.settlement_field));
            match priced {
                Ok(price) => {
                    snapshot.insert(symbol, price);
                }
                Err(reason) => {
                    tracing::warn!(
                        %symbol,
                        %trading_day,
                        provider = self.prices.name(),
                        %reason,
                        "settlement price lookup failed"
                    );
                    failures.push(PriceLookupFailure {
                        symbol,
                        trading_day,
                        reason,
                    });
                }
            }
        }

        self.ledger.deal_settlement(trading_day, &snapshot);
        tracing::info!(
            %trading_day,
            priced = snapshot.len(),
            failed = failures.len(),
            field = %self.settlement_field,
            "settlement posted"
        );

        if failures.is_empty() {
            Ok(snapshot)
        } else {
            Err(SettlementFailures {
                trading_day,
                failures,
            })
        }
    }
}

fn lookup_reason(err: PriceError) -> PriceLookupReason {
    match err {
        PriceError::Timeout { .. } => PriceLookupReason::Timeout,
        other => PriceLookupReason::Provider(other.to_string()),
    }
}

/// Read the most recent value of `field` from a fetched series.
pub fn extract_price(series: &PriceSeries, field: &str) -> Result<f64, PriceLookupReason> {
    let values = series
        .field(field)
        .ok_or_else(|| PriceLookupReason::MissingField(field.to_string()))?;
    let latest = *values
        .first()
        .ok_or_else(|| PriceLookupReason::EmptySeries(field.to_string()))?;
    if latest.is_finite() {
        Ok(latest)
    } else {
        Err(PriceLookupReason::NotFinite(latest))
    }
}
