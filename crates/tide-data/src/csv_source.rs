//! CSV data source.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tide_core::error::DataError;
use tide_core::traits::MarketDataSource;
use tide_core::types::{Bar, Period, Timeframe};
use tracing::debug;

/// CSV record format.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(
        alias = "Date",
        alias = "date",
        alias = "Datetime",
        alias = "timestamp",
        alias = "Timestamp"
    )]
    date: String,
    #[serde(alias = "Open", alias = "open")]
    open: f64,
    #[serde(alias = "High", alias = "high")]
    high: f64,
    #[serde(alias = "Low", alias = "low")]
    low: f64,
    #[serde(alias = "Close", alias = "close", alias = "Adj Close")]
    close: f64,
    #[serde(alias = "Volume", alias = "volume", default)]
    volume: f64,
}

/// Historical bars from a directory of CSV files.
///
/// A symbol is looked up as `{dir}/{symbol}_{interval}.csv` first and then
/// `{dir}/{symbol}.csv`. Rows are sorted by time and trimmed to the
/// requested period, counted back from the newest row.
pub struct CsvDataSource {
    dir: PathBuf,
}

impl CsvDataSource {
    /// Create a new CSV data source rooted at `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, DataError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(DataError::Internal(format!(
                "CSV directory not found: {}",
                dir.display()
            )));
        }
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn resolve(&self, symbol: &str, interval: Timeframe) -> Option<PathBuf> {
        [
            self.dir.join(format!("{}_{}.csv", symbol, interval)),
            self.dir.join(format!("{}.csv", symbol)),
        ]
        .into_iter()
        .find(|p| p.is_file())
    }

    /// Load bars from a specific path, oldest first.
    fn load_from_path(&self, path: &Path) -> Result<Vec<Bar>, DataError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        let mut bars = Vec::new();

        for result in reader.deserialize() {
            let record: CsvRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;

            let timestamp = parse_timestamp(&record.date)?;

            bars.push(Bar::new(
                timestamp,
                record.open,
                record.high,
                record.low,
                record.close,
                record.volume,
            ));
        }

        // Sort by timestamp
        bars.sort_by_key(|b| b.timestamp);
        bars.dedup_by_key(|b| b.timestamp);

        Ok(bars)
    }
}

/// Keep the bars inside `period` of the newest bar.
fn trim_to_period(mut bars: Vec<Bar>, period: Period) -> Vec<Bar> {
    if let Some(last) = bars.last() {
        let cutoff = last.timestamp - period.as_millis();
        bars.retain(|b| b.timestamp > cutoff);
    }
    bars
}

/// Parse various timestamp formats.
fn parse_timestamp(date_str: &str) -> Result<i64, DataError> {
    let datetime_formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
    let date_formats = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date_str) {
        return Ok(dt.timestamp_millis());
    }
    for format in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }
    for format in date_formats {
        if let Ok(d) = NaiveDate::parse_from_str(date_str, format) {
            if let Some(dt) = d.and_hms_opt(0, 0, 0) {
                return Ok(dt.and_utc().timestamp_millis());
            }
        }
    }

    // Try parsing as Unix timestamp
    if let Ok(ts) = date_str.parse::<i64>() {
        // Assume milliseconds if > 10 digits
        if ts > 10_000_000_000 {
            return Ok(ts);
        } else {
            return Ok(ts * 1000);
        }
    }

    Err(DataError::ParseError(format!(
        "Could not parse date: {}",
        date_str
    )))
}

#[async_trait]
impl MarketDataSource for CsvDataSource {
    async fn get_bars(
        &self,
        symbol: &str,
        period: Period,
        interval: Timeframe,
    ) -> Result<Vec<Bar>, DataError> {
        let path = self
            .resolve(symbol, interval)
            .ok_or_else(|| DataError::SymbolNotFound(symbol.to_string()))?;

        let bars = trim_to_period(self.load_from_path(&path)?, period);
        debug!(symbol, path = %path.display(), bars = bars.len(), "Loaded CSV bars");
        Ok(bars)
    }

    fn name(&self) -> &str {
        "csv"
    }
}
