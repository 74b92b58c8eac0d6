//! Bounded-retry fetching on top of a market-data source.

use std::sync::Arc;
use std::time::Duration;

use tide_core::error::DataError;
use tide_core::traits::MarketDataSource;
use tide_core::types::{BarSeries, Period, Timeframe};
use tracing::{debug, warn};

/// How many times to call the source and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Fetches bar series with retries.
///
/// Source errors, empty results and out-of-order bars all count as a failed
/// attempt. The delay is only slept between attempts, so a fetch blocks for
/// at most `(attempts - 1) * delay` plus the source calls themselves.
/// Whether the history is long enough is the caller's concern.
#[derive(Clone)]
pub struct DataFetcher {
    source: Arc<dyn MarketDataSource>,
    policy: RetryPolicy,
}

impl DataFetcher {
    pub fn new(source: Arc<dyn MarketDataSource>, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetch `symbol`, giving up with [`DataError::Unavailable`] after the
    /// configured number of attempts.
    pub async fn fetch(
        &self,
        symbol: &str,
        period: Period,
        interval: Timeframe,
    ) -> Result<BarSeries, DataError> {
        let attempts = self.policy.attempts.max(1);

        for attempt in 1..=attempts {
            match self.source.get_bars(symbol, period, interval).await {
                Ok(bars) if bars.is_empty() => {
                    warn!(symbol, attempt, attempts, "Empty data returned");
                }
                Ok(bars) => match BarSeries::from_bars(symbol, interval, bars) {
                    Ok(series) => {
                        debug!(symbol, attempt, bars = series.len(), "Fetched bars");
                        return Ok(series);
                    }
                    Err(e) => {
                        warn!(symbol, attempt, attempts, error = %e, "Rejected bars");
                    }
                },
                Err(e) => {
                    warn!(symbol, attempt, attempts, error = %e, "Fetch failed");
                }
            }

            if attempt < attempts && !self.policy.delay.is_zero() {
                tokio::time::sleep(self.policy.delay).await;
            }
        }

        Err(DataError::Unavailable {
            symbol: symbol.to_string(),
            attempts,
        })
    }
}
