//! Yahoo Finance chart API data source.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use tide_core::error::DataError;
use tide_core::traits::MarketDataSource;
use tide_core::types::{Bar, Period, Timeframe};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo chart API response types
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Yahoo source configuration.
#[derive(Debug, Clone)]
pub struct YahooConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Historical bars from the Yahoo Finance chart endpoint.
///
/// Rows with a missing price are dropped (the endpoint reports halted or
/// not-yet-closed sessions as nulls); a missing volume reads as zero.
pub struct YahooDataSource {
    config: YahooConfig,
    client: Client,
}

impl YahooDataSource {
    /// Create a new Yahoo data source.
    pub fn new(config: YahooConfig) -> Result<Self, DataError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static("Mozilla/5.0 (compatible; tide-scanner)"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn interval_code(interval: Timeframe) -> Result<&'static str, DataError> {
        match interval {
            Timeframe::Minute1 => Ok("1m"),
            Timeframe::Minute5 => Ok("5m"),
            Timeframe::Minute15 => Ok("15m"),
            Timeframe::Minute30 => Ok("30m"),
            Timeframe::Hour1 => Ok("60m"),
            Timeframe::Daily => Ok("1d"),
            Timeframe::Weekly => Ok("1wk"),
            Timeframe::Monthly => Ok("1mo"),
            Timeframe::Hour4 => Err(DataError::InvalidTimeframe(format!(
                "{} is not offered by the chart API",
                interval
            ))),
        }
    }
}

fn bars_from_result(result: ChartResult) -> Vec<Bar> {
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let open = (*quote.open.get(i)?)?;
            let high = (*quote.high.get(i)?)?;
            let low = (*quote.low.get(i)?)?;
            let close = (*quote.close.get(i)?)?;
            let volume = quote.volume.get(i).copied().flatten().unwrap_or(0.0);
            Some(Bar::new(ts * 1000, open, high, low, close, volume)).filter(Bar::is_finite)
        })
        .collect()
}

#[async_trait]
impl MarketDataSource for YahooDataSource {
    async fn get_bars(
        &self,
        symbol: &str,
        period: Period,
        interval: Timeframe,
    ) -> Result<Vec<Bar>, DataError> {
        let url = format!("{}/v8/finance/chart/{}", self.config.base_url, symbol);
        let params = [
            ("range", period.code()),
            ("interval", Self::interval_code(interval)?),
        ];

        let resp = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::SymbolNotFound(symbol.to_string()));
        }
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(DataError::Internal(format!("{}: {}", status, text)));
        }

        let data: ChartResponse = resp
            .json()
            .await
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        if let Some(error) = data.chart.error {
            return Err(DataError::Internal(format!(
                "{}: {}",
                error.code, error.description
            )));
        }

        let bars = data
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .map(bars_from_result)
            .unwrap_or_default();

        debug!(symbol, %period, %interval, bars = bars.len(), "Fetched chart data");
        Ok(bars)
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}
