//! Market data source trait definition.

use crate::error::DataError;
use crate::types::{Bar, Period, Timeframe};
use async_trait::async_trait;

/// Trait for historical market-data sources.
///
/// Implementations may fail, or return partial or empty data; callers
/// decide whether to retry and how much history is enough.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch historical bars.
    ///
    /// # Arguments
    /// * `symbol` - The symbol to fetch
    /// * `period` - How far back to look from now
    /// * `interval` - The bar timeframe
    ///
    /// # Returns
    /// A vector of bars ordered from oldest to newest
    async fn get_bars(
        &self,
        symbol: &str,
        period: Period,
        interval: Timeframe,
    ) -> Result<Vec<Bar>, DataError>;

    /// Get the data source name.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct FixedSource {
        bars: Vec<Bar>,
    }

    #[async_trait]
    impl MarketDataSource for FixedSource {
        async fn get_bars(
            &self,
            symbol: &str,
            _period: Period,
            _interval: Timeframe,
        ) -> Result<Vec<Bar>, DataError> {
            if symbol == "MISSING" {
                return Err(DataError::SymbolNotFound(symbol.to_string()));
            }
            Ok(self.bars.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_source_is_object_safe() {
        let source: Arc<dyn MarketDataSource> = Arc::new(FixedSource {
            bars: vec![Bar::new(1, 1.0, 1.0, 1.0, 1.0, 1.0)],
        });

        let bars = source
            .get_bars("RELIANCE.NS", Period::Months6, Timeframe::Daily)
            .await
            .unwrap();
        assert_eq!(bars.len(), 1);

        let err = source
            .get_bars("MISSING", Period::Months6, Timeframe::Daily)
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound(_)));
        assert_eq!(source.name(), "fixed");
    }
}
