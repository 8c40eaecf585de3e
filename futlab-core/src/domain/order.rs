//! Orders emitted by the signal processor.

use super::ids::OrderIndex;
use super::position::PositionSide;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether an order opens new exposure or closes existing exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Open,
    Close,
}

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Buy => Direction::Sell,
            Direction::Sell => Direction::Buy,
        }
    }

    /// The position side an order with this direction and action touches.
    ///
    /// Opening a buy adds to the long side; closing a buy reduces the short side.
    pub fn affected_side(self, action: Action) -> PositionSide {
        match (action, self) {
            (Action::Open, Direction::Buy) | (Action::Close, Direction::Sell) => PositionSide::Long,
            (Action::Open, Direction::Sell) | (Action::Close, Direction::Buy) => {
                PositionSide::Short
            }
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Open => "OPEN",
            Action::Close => "CLOSE",
        })
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
        })
    }
}

/// Execution style. Every order the netting rules generate is a market order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Market,
}

/// An order instruction. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub index: OrderIndex,
    pub symbol: String,
    pub trading_day: NaiveDate,
    pub timestamp: DateTime<Utc>,
    pub order_type: OrderType,
    pub action: Action,
    pub direction: Direction,
    /// Contract quantity, always > 0 for generated orders.
    pub quantity: u64,
}

impl Order {
    pub fn is_close(&self) -> bool {
        self.action == Action::Close
    }

    pub fn is_open(&self) -> bool {
        self.action == Action::Open
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}/{} {} @ {}",
            self.index, self.symbol, self.action, self.direction, self.quantity, self.trading_day
        )
    }
}
