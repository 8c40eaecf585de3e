//! Bounded price lookups.
//!
//! Runs each fetch of the wrapped provider on a short-lived worker thread and
//! gives up after a fixed duration. A call that times out keeps running in the
//! background until the inner provider returns; its answer is discarded.

use super::provider::{PriceError, PriceProvider, PriceSeries};
use chrono::NaiveDate;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

pub struct TimeoutPriceProvider<P: ?Sized> {
    inner: Arc<P>,
    timeout: Duration,
    name: String,
}

impl<P: PriceProvider + ?Sized + 'static> TimeoutPriceProvider<P> {
    pub fn new(inner: Arc<P>, timeout: Duration) -> Self {
        let name = format!("{} (timeout {}ms)", inner.name(), timeout.as_millis());
        Self {
            inner,
            timeout,
            name,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl<P: PriceProvider + ?Sized + 'static> PriceProvider for TimeoutPriceProvider<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, trading_day: NaiveDate, symbol: &str) -> Result<PriceSeries, PriceError> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let owned_symbol = symbol.to_string();

        std::thread::Builder::new()
            .name(format!("price-fetch-{symbol}"))
            .spawn(move || {
                // The receiver is gone if we already timed out.
                let _ = tx.send(inner.fetch(trading_day, &owned_symbol));
            })
            .map_err(|e| PriceError::Other(format!("spawn fetch worker: {e}")))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    provider = self.inner.name(),
                    symbol,
                    %trading_day,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "price fetch timed out"
                );
                Err(PriceError::Timeout {
                    after_ms: self.timeout.as_millis() as u64,
                })
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(PriceError::Other(
                "fetch worker exited without an answer".into(),
            )),
        }
    }
}
