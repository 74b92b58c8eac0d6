//! Market data for the tide scanner.
//!
//! Sources implement [`MarketDataSource`](tide_core::traits::MarketDataSource);
//! [`DataFetcher`] wraps any source with bounded retries.

mod csv_source;
mod fetcher;
mod yahoo;

pub use csv_source::CsvDataSource;
pub use fetcher::{DataFetcher, RetryPolicy};
pub use yahoo::{YahooConfig, YahooDataSource};
