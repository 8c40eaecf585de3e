//! Settlement price sources

pub mod csv_file;
pub mod memory;
pub mod provider;
pub mod timeout;

pub use csv_file::{parse_trading_day, CsvPriceProvider};
pub use memory::InMemoryPrices;
pub use provider::{PriceError, PriceProvider, PriceSeries};
pub use timeout::TimeoutPriceProvider;
