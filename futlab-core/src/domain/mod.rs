//! Domain types for futlab

pub mod bar;
pub mod fill;
pub mod ids;
pub mod instrument;
pub mod order;
pub mod position;
pub mod signal;

pub use bar::Bar;
pub use fill::Fill;
pub use ids::{IndexGen, OrderIndex, StrategyId};
pub use instrument::{FuturesSymbol, PointValueTable, SymbolError};
pub use order::{Action, Direction, Order, OrderType};
pub use position::{Position, PositionSide};
pub use signal::{Signal, SignalType, UnknownSignalType};

/// Symbol type alias
pub type Symbol = String;
