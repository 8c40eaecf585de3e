//! Signal processing: validation, netting, indexing, attribution, posting.

use super::netting::net_signal;
use super::{Engine, Portfolio, SessionClock};
use crate::data::PriceProvider;
use crate::domain::{Order, OrderType, Position, PositionSide, Signal, SignalType};
use crate::error::PortfolioError;
use crate::ledger::PositionLedger;

impl<L: PositionLedger, P: PriceProvider> Portfolio<L, P> {
    /// Convert a signal into the orders that move the symbol to its target.
    ///
    /// Returns zero, one or two orders in emission order. Every returned order
    /// is already attributed and posted to the ledger. A rejected signal
    /// leaves both the ledger and the attribution map untouched.
    pub fn process_signal(
        &mut self,
        signal: &Signal,
        clock: SessionClock,
    ) -> Result<Vec<Order>, PortfolioError> {
        // FLAT closes whatever is held; its strength is never read.
        let target = match signal.signal_type {
            SignalType::Flat => 0,
            SignalType::Long | SignalType::Short => {
                signal.target().ok_or_else(|| PortfolioError::InvalidStrength {
                    symbol: signal.symbol.clone(),
                    strategy: signal.strategy.clone(),
                    strength: signal.strength,
                })?
            }
        };
        let multiplier = self
            .point_values
            .multiplier_for(&signal.symbol)
            .map_err(|source| PortfolioError::InvalidSymbolFormat {
                symbol: signal.symbol.clone(),
                strategy: signal.strategy.clone(),
                source,
            })?;

        let held = Position::new(
            self.ledger.position(&signal.symbol, PositionSide::Long),
            self.ledger.position(&signal.symbol, PositionSide::Short),
        );

        let orders: Vec<Order> = net_signal(signal.signal_type, held, target, multiplier)
            .into_iter()
            .map(|intent| Order {
                index: self.index_gen.next_index(),
                symbol: signal.symbol.clone(),
                trading_day: clock.trading_day,
                timestamp: clock.timestamp,
                order_type: OrderType::Market,
                action: intent.action,
                direction: intent.direction,
                quantity: intent.quantity,
            })
            .collect();

        for (i, order) in orders.iter().enumerate() {
            let registered = self.attribution.register(
                order.index,
                &signal.strategy,
                &order.symbol,
                order.quantity,
            );
            if let Err(err) = registered {
                for earlier in &orders[..i] {
                    self.attribution.retire(earlier.index);
                }
                tracing::error!(error = %err, "order index collision, signal rejected");
                return Err(err);
            }
        }

        self.ledger.deal_signal(signal);
        for order in &orders {
            tracing::debug!(
                index = %order.index,
                symbol = %order.symbol,
                strategy = %signal.strategy,
                action = %order.action,
                direction = %order.direction,
                quantity = order.quantity,
                "order generated"
            );
            self.ledger.deal_order(&signal.strategy, order);
        }

        tracing::debug!(
            symbol = %signal.symbol,
            strategy = %signal.strategy,
            signal_type = %signal.signal_type,
            target,
            held_long = held.long,
            held_short = held.short,
            orders = orders.len(),
            "signal processed"
        );
        Ok(orders)
    }

    /// Process a signal and hand the resulting orders to the engine.
    ///
    /// All ledger postings complete before the first order is submitted.
    /// Returns the number of orders submitted.
    pub fn on_signal<E: Engine + ?Sized>(
        &mut self,
        signal: &Signal,
        engine: &mut E,
    ) -> Result<usize, PortfolioError> {
        let orders = self.process_signal(signal, SessionClock::of(engine))?;
        let count = orders.len();
        for order in orders {
            engine.submit(order);
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PortfolioConfig;
    use crate::data::InMemoryPrices;
    use crate::domain::{Action, Direction, OrderIndex, StrategyId};
    use crate::ledger::MemoryLedger;
    use chrono::{DateTime, NaiveDate, Utc};

    fn clock() -> SessionClock {
        SessionClock::new(
            NaiveDate::from_ymd_opt(2017, 6, 1).unwrap(),
            DateTime::<Utc>::from_timestamp(1_496_300_000, 0).unwrap(),
        )
    }

    fn portfolio_with(positions: &[(&str, &str, Position)]) -> Portfolio<MemoryLedger, InMemoryPrices> {
        let mut ledger = MemoryLedger::new();
        for (strategy, symbol, pos) in positions {
            ledger.set_position(&StrategyId::new(*strategy), symbol, *pos);
        }
        Portfolio::new(ledger, InMemoryPrices::new(), &PortfolioConfig::default())
    }

    #[test]
    fn orders_carry_clock_and_fresh_indices() {
        let mut pf = portfolio_with(&[]);
        let orders = pf
            .process_signal(&Signal::long("rb1710", "trend", 3.0), clock())
            .unwrap();
        assert_eq!(orders.len(), 1);
        let order = &orders[0];
        assert_eq!(order.index, OrderIndex(1));
        assert_eq!(order.trading_day, clock().trading_day);
        assert_eq!(order.timestamp, clock().timestamp);
        assert_eq!(order.order_type, OrderType::Market);
        assert_eq!((order.action, order.direction, order.quantity), (Action::Open, Direction::Buy, 30));
        assert_eq!(pf.next_order_index(), OrderIndex(2));
    }

    #[test]
    fn orders_are_posted_as_pending_for_the_strategy() {
        let mut pf = portfolio_with(&[("trend", "rb1710", Position::new(0, 4))]);
        pf.process_signal(&Signal::long("rb1710", "trend", 2.0), clock())
            .unwrap();
        let book = pf.ledger().book(&StrategyId::new("trend")).unwrap();
        assert_eq!(book.pending.len(), 2);
        assert_eq!(book.signal_count, 1);
    }

    #[test]
    fn invalid_symbol_leaves_state_untouched() {
        let mut pf = portfolio_with(&[]);
        let err = pf
            .process_signal(&Signal::long("rebar", "trend", 1.0), clock())
            .unwrap_err();
        assert!(matches!(err, PortfolioError::InvalidSymbolFormat { .. }));
        assert!(pf.attribution().is_empty());
        assert!(pf.ledger().book(&StrategyId::new("trend")).is_none());
        assert_eq!(pf.next_order_index(), OrderIndex(1));
    }

    #[test]
    fn non_finite_strength_is_rejected() {
        let mut pf = portfolio_with(&[]);
        let err = pf
            .process_signal(&Signal::long("rb1710", "trend", f64::NAN), clock())
            .unwrap_err();
        assert!(matches!(err, PortfolioError::InvalidStrength { .. }));
    }

    #[test]
    fn flat_ignores_non_finite_strength() {
        let mut pf = portfolio_with(&[("trend", "rb1710", Position::new(5, 3))]);
        for strength in [f64::NAN, f64::INFINITY] {
            let signal = Signal::new("rb1710", "trend", SignalType::Flat, strength);
            let orders = pf.process_signal(&signal, clock()).unwrap();
            let shape: Vec<_> = orders
                .iter()
                .map(|o| (o.action, o.direction, o.quantity))
                .collect();
            assert_eq!(
                shape,
                vec![(Action::Close, Direction::Sell, 5), (Action::Close, Direction::Buy, 3)]
            );
        }
    }

    #[test]
    fn unknown_product_is_invalid_symbol() {
        let mut pf = portfolio_with(&[]);
        let err = pf
            .process_signal(&Signal::flat("zz1710", "trend"), clock())
            .unwrap_err();
        match err {
            PortfolioError::InvalidSymbolFormat { symbol, strategy, .. } => {
                assert_eq!(symbol, "zz1710");
                assert_eq!(strategy, StrategyId::new("trend"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
