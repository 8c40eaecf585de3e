//! Fill handling: route executions back to the strategy that asked for them.

use super::Portfolio;
use crate::data::PriceProvider;
use crate::domain::{Fill, OrderIndex, StrategyId};
use crate::error::PortfolioError;
use crate::ledger::PositionLedger;

impl<L: PositionLedger, P: PriceProvider> Portfolio<L, P> {
    /// Post a fill to the ledger on behalf of the order's strategy.
    ///
    /// An index that was never issued, or whose order is already complete or
    /// cancelled, is reported as `UnknownOrderIndex` and the ledger is not
    /// touched. Returns the owning strategy.
    pub fn apply_fill(&mut self, fill: &Fill) -> Result<StrategyId, PortfolioError> {
        let Some(booked) = self.attribution.record_fill(fill.order_index, fill.quantity) else {
            tracing::warn!(
                index = %fill.order_index,
                symbol = %fill.symbol,
                quantity = fill.quantity,
                "fill for unknown order index"
            );
            return Err(PortfolioError::UnknownOrderIndex {
                index: fill.order_index,
                symbol: fill.symbol.clone(),
            });
        };

        if booked.overfill > 0 {
            tracing::warn!(
                index = %fill.order_index,
                symbol = %fill.symbol,
                strategy = %booked.strategy,
                overfill = booked.overfill,
                "fill exceeds the order's open quantity"
            );
        }

        self.ledger.deal_fill(&booked.strategy, fill);
        tracing::debug!(
            index = %fill.order_index,
            symbol = %fill.symbol,
            strategy = %booked.strategy,
            quantity = fill.quantity,
            price = fill.price,
            remaining = booked.remaining,
            retired = booked.retired,
            "fill applied"
        );
        Ok(booked.strategy)
    }

    /// Cancel an in-flight order: retire its attribution and notify the ledger.
    ///
    /// A cancel for an index that is not in flight is `UnknownCancelIndex`.
    pub fn cancel_order(&mut self, index: OrderIndex) -> Result<StrategyId, PortfolioError> {
        let entry = self
            .attribution
            .retire(index)
            .ok_or(PortfolioError::UnknownCancelIndex { index })?;
        self.ledger.deal_cancel(&entry.strategy, index);
        tracing::debug!(
            %index,
            symbol = %entry.symbol,
            strategy = %entry.strategy,
            unfilled = entry.remaining,
            "order cancelled"
        );
        Ok(entry.strategy)
    }
}
