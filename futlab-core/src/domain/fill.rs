use crate::domain::ids::OrderIndex;
use crate::domain::order::{Action, Direction};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Execution report for an order, in whole or in part.
///
/// Produced by the execution venue; `order_index` references exactly one
/// order previously emitted by the portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub order_index: OrderIndex,
    pub symbol: String,
    pub trading_day: NaiveDate,
    pub timestamp: DateTime<Utc>,
    pub action: Action,
    pub direction: Direction,
    pub quantity: u64,
    pub price: f64,
    #[serde(default)]
    pub commission: f64,
}

impl Fill {
    /// Gross traded value (price × quantity), before commission.
    pub fn gross_value(&self) -> f64 {
        self.price * self.quantity as f64
    }
}
