//! Directional netting: the minimal order set that moves a two-sided
//! position to a signal's target exposure.
//!
//! Unwinding the opposite side uses the raw held quantity, which is already
//! in contracts. Adjusting the signal's own side scales the delta by the
//! product's point value, because signal strength is expressed in lots.
//! The two must not be unified.

use crate::domain::{Action, Direction, Position, SignalType};
use serde::{Deserialize, Serialize};

/// An order the netting rules want, before it is given an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub action: Action,
    pub direction: Direction,
    pub quantity: u64,
}

impl OrderIntent {
    pub fn open(direction: Direction, quantity: u64) -> Self {
        Self {
            action: Action::Open,
            direction,
            quantity,
        }
    }

    pub fn close(direction: Direction, quantity: u64) -> Self {
        Self {
            action: Action::Close,
            direction,
            quantity,
        }
    }
}

/// Compute the orders for one signal.
///
/// `held` is the aggregate position, `target` the truncated absolute signal
/// strength and `multiplier` the product's point value. Returns at most two
/// intents; every close comes before any open.
pub fn net_signal(
    signal_type: SignalType,
    held: Position,
    target: u64,
    multiplier: u64,
) -> Vec<OrderIntent> {
    match signal_type {
        SignalType::Long => net_toward(Direction::Buy, held.long, held.short, target, multiplier),
        SignalType::Short => net_toward(Direction::Sell, held.short, held.long, target, multiplier),
        SignalType::Flat => {
            let mut intents = Vec::with_capacity(2);
            if held.long > 0 {
                intents.push(OrderIntent::close(Direction::Sell, held.long));
            }
            if held.short > 0 {
                intents.push(OrderIntent::close(Direction::Buy, held.short));
            }
            intents
        }
    }
}

/// Net toward a directional target. `entry` is the direction that grows the
/// target side: Buy for long, Sell for short.
fn net_toward(entry: Direction, own: u64, opposite: u64, target: u64, multiplier: u64) -> Vec<OrderIntent> {
    let mut intents = Vec::with_capacity(2);

    // Full unwind of the opposite side, in raw contracts.
    if opposite > 0 {
        intents.push(OrderIntent::close(entry, opposite));
    }

    if target > own {
        intents.push(OrderIntent::open(entry, (target - own).saturating_mul(multiplier)));
    } else if target < own {
        intents.push(OrderIntent::close(entry.opposite(), (own - target).saturating_mul(multiplier)));
    }

    intents
}
