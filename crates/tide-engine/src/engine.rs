//! Scan engine.

use std::time::Instant;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tide_core::error::{DataError, ScanError};
use tide_core::traits::Notifier;
use tide_core::types::{BarSeries, CrossoverDirection, Period, Side, Timeframe};
use tide_data::DataFetcher;
use tide_risk::TradePlanner;
use tide_signals::{crossover_event, CrossoverDetector, IndicatorEngine, TidePipeline};
use tracing::{debug, info, warn};

use crate::report::{escape_html, Bucket, ScanReport, SkipReason, SymbolOutcome};

/// Lookback and bar size of the intraday confirmation series.
const INTRADAY_PERIOD: Period = Period::Days5;
const INTRADAY_INTERVAL: Timeframe = Timeframe::Minute15;

/// Scan configuration.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Symbols to scan; duplicates are tolerated
    pub watchlist: Vec<String>,
    /// Symbols with fewer bars are skipped
    pub min_history: usize,
    /// Symbols processed at the same time
    pub concurrency: usize,
    pub period: Period,
    pub interval: Timeframe,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            watchlist: Vec::new(),
            min_history: 50,
            concurrency: 4,
            period: Period::Months6,
            interval: Timeframe::Daily,
        }
    }
}

/// Intraday crossover on the index, confirmed by a daily crossover in
/// the same direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntradayAlert {
    pub symbol: String,
    pub direction: CrossoverDirection,
}

impl IntradayAlert {
    pub fn message(&self) -> String {
        let symbol = escape_html(&self.symbol);
        match self.direction {
            CrossoverDirection::Bullish => {
                format!("🚨 {} 15-min Bullish Crossover (daily trend confirmed)", symbol)
            }
            CrossoverDirection::Bearish => {
                format!("⚠️ {} 15-min Bearish Crossover (daily trend confirmed)", symbol)
            }
        }
    }
}

/// Runs the per-symbol pipeline over a watchlist.
///
/// Each symbol goes fetch, history check, snapshot, tide and filters,
/// crossover, trade plan. A symbol that fails at any step is recorded as
/// skipped and the scan carries on.
pub struct ScanEngine {
    settings: ScanSettings,
    fetcher: DataFetcher,
    indicators: IndicatorEngine,
    pipeline: TidePipeline,
    planner: TradePlanner,
}

impl ScanEngine {
    /// Create a new scan engine.
    ///
    /// Fails on an empty watchlist, zero concurrency, invalid indicator
    /// settings, or a minimum history shorter than the indicators need.
    pub fn new(
        settings: ScanSettings,
        fetcher: DataFetcher,
        indicators: IndicatorEngine,
        pipeline: TidePipeline,
        planner: TradePlanner,
    ) -> Result<Self, ScanError> {
        if settings.watchlist.is_empty() {
            return Err(ScanError::Config("watchlist is empty".into()));
        }
        if settings.concurrency == 0 {
            return Err(ScanError::Config("concurrency must be at least 1".into()));
        }
        indicators.settings().validate()?;

        let required = indicators.required_history();
        if settings.min_history < required {
            return Err(ScanError::Config(format!(
                "min_history {} is below the {} bars the indicators need",
                settings.min_history, required
            )));
        }

        Ok(Self {
            settings,
            fetcher,
            indicators,
            pipeline,
            planner,
        })
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    pub fn pipeline(&self) -> &TidePipeline {
        &self.pipeline
    }

    /// Run the pipeline on an already fetched series.
    pub fn analyze(&self, series: &BarSeries) -> Result<SymbolOutcome, SkipReason> {
        if series.len() < self.settings.min_history {
            return Err(DataError::InsufficientHistory {
                required: self.settings.min_history,
                available: series.len(),
            }
            .into());
        }

        let snapshot = self.indicators.compute(series)?;
        let filter = self.pipeline.evaluate(&snapshot);
        let crossover = crossover_event(&snapshot);

        let plan = crossover.as_ref().and_then(|event| {
            let side = event.direction.side();
            let stop = match side {
                Side::Long => snapshot.stop_low,
                Side::Short => snapshot.stop_high,
            };
            self.planner.plan(&snapshot.symbol, side, snapshot.close, stop)
        });

        debug!(
            symbol = %series.symbol,
            tide = %filter.tide,
            confirmed = filter.confirmed(),
            crossover = ?crossover.as_ref().map(|e| e.direction),
            "Evaluated symbol"
        );

        Ok(SymbolOutcome {
            symbol: series.symbol.clone(),
            filter,
            crossover,
            plan,
        })
    }

    /// Fetch and analyze one symbol.
    pub async fn scan_symbol(&self, symbol: &str) -> Result<SymbolOutcome, SkipReason> {
        let result = match self
            .fetcher
            .fetch(symbol, self.settings.period, self.settings.interval)
            .await
        {
            Ok(series) => self.analyze(&series),
            Err(e) => Err(e.into()),
        };

        if let Err(reason) = &result {
            warn!(symbol, %reason, "Skipping symbol");
        }
        result
    }

    /// Scan the whole watchlist.
    pub async fn scan(&self) -> ScanReport {
        self.scan_symbols(&self.settings.watchlist).await
    }

    /// Scan `symbols`, up to `concurrency` at a time.
    pub async fn scan_symbols(&self, symbols: &[String]) -> ScanReport {
        let started = Instant::now();
        let filters = self.pipeline.enabled();

        info!(
            symbols = symbols.len(),
            concurrency = self.settings.concurrency,
            source = self.fetcher.source_name(),
            "Starting scan"
        );

        let report = stream::iter(symbols)
            .map(|symbol| {
                let filters = filters.clone();
                async move {
                    let result = self.scan_symbol(symbol).await;
                    ScanReport::single(filters, symbol, result)
                }
            })
            .buffer_unordered(self.settings.concurrency.max(1))
            .fold(ScanReport::new(filters.clone()), |acc, part| async move {
                acc.merge(part)
            })
            .await;

        info!(
            evaluated = report.evaluated,
            skipped = report.skipped.len(),
            bullish = report.symbols(Bucket::BullishConfirmed).len(),
            bearish = report.symbols(Bucket::BearishConfirmed).len(),
            crossovers = report.symbols(Bucket::CrossoverUp).len()
                + report.symbols(Bucket::CrossoverDown).len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scan complete"
        );

        report
    }

    /// Send the report's HTML message.
    ///
    /// Returns whether delivery succeeded. Failures are logged and never
    /// affect the report.
    pub async fn notify_report(
        &self,
        notifier: &dyn Notifier,
        report: &ScanReport,
        time_label: &str,
    ) -> bool {
        deliver(notifier, &report.html_message(time_label)).await
    }

    /// Check `symbol` for a daily crossover and, if there is one, for a
    /// crossover on the 15-minute series.
    ///
    /// The intraday series is only fetched when the daily series crossed
    /// on its latest bar.
    pub async fn intraday_check(&self, symbol: &str) -> Result<Option<IntradayAlert>, DataError> {
        let s = self.indicators.settings();
        let detector = CrossoverDetector::new(s.ema_fast, s.ema_slow, s.ema_weighting);

        let daily_series = self
            .fetcher
            .fetch(symbol, self.settings.period, Timeframe::Daily)
            .await?;
        let Some(daily) = detector.detect(&daily_series.closes()) else {
            debug!(symbol, "No daily crossover, intraday check skipped");
            return Ok(None);
        };

        let intraday_series = self
            .fetcher
            .fetch(symbol, INTRADAY_PERIOD, INTRADAY_INTERVAL)
            .await?;
        let Some(intraday) = detector.detect(&intraday_series.closes()) else {
            debug!(symbol, %daily, "Daily crossover without intraday confirmation");
            return Ok(None);
        };
        if intraday != daily {
            debug!(symbol, %daily, %intraday, "Intraday crossover against the daily trend");
            return Ok(None);
        }

        info!(symbol, direction = %daily, "Intraday crossover confirmed by daily trend");
        Ok(Some(IntradayAlert {
            symbol: symbol.to_string(),
            direction: daily,
        }))
    }
}

/// Send `text`, logging instead of failing.
pub async fn deliver(notifier: &dyn Notifier, text: &str) -> bool {
    match notifier.send(text).await {
        Ok(()) => {
            info!(notifier = notifier.name(), "Notification sent");
            true
        }
        Err(e) => {
            warn!(notifier = notifier.name(), error = %e, "Notification failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tide_core::error::NotifyError;
    use tide_core::traits::MarketDataSource;
    use tide_core::types::{Bar, Tide, TideSignal};
    use tide_data::RetryPolicy;
    use tide_signals::{FilterSettings, TideSettings};

    const DAY_MS: i64 = 86_400_000;

    /// In-memory source keyed by symbol and interval.
    #[derive(Default)]
    struct MemorySource {
        series: HashMap<(String, Timeframe), Vec<Bar>>,
        calls: AtomicUsize,
    }

    impl MemorySource {
        fn with(mut self, symbol: &str, interval: Timeframe, closes: &[f64]) -> Self {
            self.series
                .insert((symbol.to_string(), interval), bars(closes));
            self
        }
    }

    #[async_trait]
    impl MarketDataSource for MemorySource {
        async fn get_bars(
            &self,
            symbol: &str,
            _period: Period,
            interval: Timeframe,
        ) -> Result<Vec<Bar>, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.series
                .get(&(symbol.to_string(), interval))
                .cloned()
                .ok_or_else(|| DataError::SymbolNotFound(symbol.to_string()))
        }

        fn name(&self) -> &str {
            "memory"
        }
    }

    /// Records sent messages, or fails every send.
    #[derive(Default)]
    struct RecordingNotifier {
        fail: bool,
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, text: &str) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Connection("unreachable".into()));
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn bars(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(i as i64 * DAY_MS, c, c + 1.0, c - 1.0, c, 1000.0))
            .collect()
    }

    /// 50 falling bars then six rising ones: EMA5 crosses EMA50 on the
    /// last bar while MACD turns positive and RSI is near 74.
    fn rally_closes() -> Vec<f64> {
        let mut closes: Vec<f64> = (0..50).map(|i| 120.0 - 0.4 * i as f64).collect();
        for _ in 0..6 {
            let last = closes[closes.len() - 1];
            closes.push(last + 2.0);
        }
        closes
    }

    /// Mirror of the rally: EMA5 crosses under EMA50 on the last bar.
    fn slump_closes() -> Vec<f64> {
        let mut closes: Vec<f64> = (0..50).map(|i| 80.0 + 0.4 * i as f64).collect();
        for _ in 0..6 {
            let last = closes[closes.len() - 1];
            closes.push(last - 2.0);
        }
        closes
    }

    /// Rally, pullback and a four-bar bounce: long tide (RSI near 61)
    /// with the close half a point under its 20-bar mean.
    fn bounce_closes() -> Vec<f64> {
        let mut closes = vec![100.0];
        for (bars, step) in [(20, 0.5), (15, 4.0), (11, -3.0), (4, 4.0)] {
            for _ in 0..bars {
                let last = closes[closes.len() - 1];
                closes.push(last + step);
            }
        }
        closes
    }

    fn engine_with(
        source: MemorySource,
        watchlist: &[&str],
        filters: FilterSettings,
    ) -> (ScanEngine, Arc<MemorySource>) {
        engine_with_concurrency(source, watchlist, filters, 4)
    }

    fn engine_with_concurrency(
        source: MemorySource,
        watchlist: &[&str],
        filters: FilterSettings,
        concurrency: usize,
    ) -> (ScanEngine, Arc<MemorySource>) {
        let source = Arc::new(source);
        let fetcher = DataFetcher::new(source.clone(), RetryPolicy::new(1, Duration::ZERO));
        let settings = ScanSettings {
            watchlist: watchlist.iter().map(|s| s.to_string()).collect(),
            concurrency,
            ..Default::default()
        };
        let engine = ScanEngine::new(
            settings,
            fetcher,
            IndicatorEngine::default(),
            TidePipeline::from_settings(&TideSettings::default(), &filters),
            TradePlanner::default(),
        )
        .unwrap();
        (engine, source)
    }

    #[tokio::test]
    async fn test_crossover_with_long_tide() {
        let source = MemorySource::default().with("RALLY.NS", Timeframe::Daily, &rally_closes());
        let (engine, _) = engine_with(source, &["RALLY.NS"], FilterSettings::default());

        let report = engine.scan().await;

        assert!(report.contains(Bucket::BullishConfirmed, "RALLY.NS"));
        assert!(report.contains(Bucket::CrossoverUp, "RALLY.NS"));
        assert!(!report.contains(Bucket::CrossoverDown, "RALLY.NS"));

        let plan = &report.trade_plans["RALLY.NS"];
        assert_eq!(plan.side, Side::Long);
        assert_eq!(plan.entry, dec!(112.40));
        // Lowest low of the last five bars (close 104.4, low one below)
        assert_eq!(plan.stop_loss, dec!(103.40));
        assert_eq!(plan.target_1, dec!(125.90));
        assert_eq!(plan.target_2, dec!(139.40));
    }

    #[tokio::test]
    async fn test_short_history_is_skipped() {
        let source = MemorySource::default()
            .with("NEW.NS", Timeframe::Daily, &[100.0; 30])
            .with("RALLY.NS", Timeframe::Daily, &rally_closes());
        let (engine, _) = engine_with(
            source,
            &["NEW.NS", "MISSING.NS", "RALLY.NS"],
            FilterSettings::default(),
        );

        let report = engine.scan().await;

        assert_eq!(report.evaluated, 3);
        assert_eq!(
            report.skipped["NEW.NS"],
            SkipReason::InsufficientHistory {
                required: 50,
                available: 30
            }
        );
        assert_eq!(
            report.skipped["MISSING.NS"],
            SkipReason::Unavailable { attempts: 1 }
        );
        for bucket in Bucket::all() {
            assert!(!report.contains(*bucket, "NEW.NS"));
        }
        // The failures do not stop the rest of the watchlist.
        assert!(report.contains(Bucket::BullishConfirmed, "RALLY.NS"));
    }

    #[tokio::test]
    async fn test_bollinger_gates_close_below_mid() {
        let closes = bounce_closes();

        let source = MemorySource::default().with("BOUNCE.NS", Timeframe::Daily, &closes);
        let (open, _) = engine_with(source, &["BOUNCE.NS"], FilterSettings::default());
        let report = open.scan().await;
        assert!(report.contains(Bucket::BullishConfirmed, "BOUNCE.NS"));

        let filters = FilterSettings {
            bollinger: true,
            ..Default::default()
        };
        let source = MemorySource::default().with("BOUNCE.NS", Timeframe::Daily, &closes);
        let (gated, _) = engine_with(source, &["BOUNCE.NS"], filters);
        let report = gated.scan().await;

        assert!(report.contains(Bucket::Bullish, "BOUNCE.NS"));
        assert!(!report.contains(Bucket::BullishConfirmed, "BOUNCE.NS"));
    }

    #[tokio::test]
    async fn test_analyze_is_idempotent() {
        let source = MemorySource::default().with("RALLY.NS", Timeframe::Daily, &rally_closes());
        let (engine, _) = engine_with(source, &["RALLY.NS"], FilterSettings::default());
        let series =
            BarSeries::from_bars("RALLY.NS", Timeframe::Daily, bars(&rally_closes())).unwrap();

        let first = engine.analyze(&series).unwrap();
        let second = engine.analyze(&series).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.filter.tide_signal(),
            TideSignal {
                symbol: "RALLY.NS".to_string(),
                tide: Tide::Long,
            }
        );
        assert_eq!(engine.scan().await, engine.scan().await);
    }

    #[tokio::test]
    async fn test_concurrency_does_not_change_report() {
        let make_source = || {
            MemorySource::default()
                .with("RALLY.NS", Timeframe::Daily, &rally_closes())
                .with("BOUNCE.NS", Timeframe::Daily, &bounce_closes())
                .with("FLAT.NS", Timeframe::Daily, &[100.0; 60])
        };
        let watchlist = ["RALLY.NS", "BOUNCE.NS", "FLAT.NS", "RALLY.NS", "GONE.NS"];

        let (sequential, _) =
            engine_with_concurrency(make_source(), &watchlist, FilterSettings::default(), 1);
        let (parallel, _) =
            engine_with_concurrency(make_source(), &watchlist, FilterSettings::default(), 8);

        let a = sequential.scan().await;
        let b = parallel.scan().await;
        assert_eq!(a, b);
        assert_eq!(a.evaluated, 5);
        assert_eq!(a.skipped.len(), 1);
    }

    #[test]
    fn test_new_rejects_bad_settings() {
        let fetcher = || {
            DataFetcher::new(
                Arc::new(MemorySource::default()),
                RetryPolicy::new(1, Duration::ZERO),
            )
        };
        let build = |settings: ScanSettings| {
            ScanEngine::new(
                settings,
                fetcher(),
                IndicatorEngine::default(),
                TidePipeline::default(),
                TradePlanner::default(),
            )
        };

        assert!(matches!(
            build(ScanSettings::default()),
            Err(ScanError::Config(_))
        ));
        let short = ScanSettings {
            watchlist: vec!["A.NS".into()],
            min_history: 20,
            ..Default::default()
        };
        assert!(matches!(build(short), Err(ScanError::Config(_))));
    }

    #[tokio::test]
    async fn test_notification_failure_is_swallowed() {
        let source = MemorySource::default().with("RALLY.NS", Timeframe::Daily, &rally_closes());
        let (engine, _) = engine_with(source, &["RALLY.NS"], FilterSettings::default());
        let report = engine.scan().await;

        let failing = RecordingNotifier {
            fail: true,
            ..Default::default()
        };
        assert!(!engine.notify_report(&failing, &report, "15:00").await);

        let recording = RecordingNotifier::default();
        assert!(engine.notify_report(&recording, &report, "15:00").await);
        let sent = recording.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("📈 <b>BUY RALLY.NS</b>"));
    }

    #[tokio::test]
    async fn test_intraday_check_confirmed() {
        let source = MemorySource::default()
            .with("^NSEI", Timeframe::Daily, &rally_closes())
            .with("^NSEI", Timeframe::Minute15, &rally_closes());
        let (engine, _) = engine_with(source, &["^NSEI"], FilterSettings::default());

        let alert = engine.intraday_check("^NSEI").await.unwrap().unwrap();
        assert_eq!(alert.direction, CrossoverDirection::Bullish);
        assert_eq!(
            alert.message(),
            "🚨 ^NSEI 15-min Bullish Crossover (daily trend confirmed)"
        );
    }

    #[tokio::test]
    async fn test_intraday_needs_matching_direction() {
        let source = MemorySource::default()
            .with("^NSEI", Timeframe::Daily, &slump_closes())
            .with("^NSEI", Timeframe::Minute15, &rally_closes());
        let (engine, source) = engine_with(source, &["^NSEI"], FilterSettings::default());

        assert_eq!(engine.intraday_check("^NSEI").await.unwrap(), None);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        let source = MemorySource::default()
            .with("^NSEI", Timeframe::Daily, &slump_closes())
            .with("^NSEI", Timeframe::Minute15, &slump_closes());
        let (engine, _) = engine_with(source, &["^NSEI"], FilterSettings::default());

        let alert = engine.intraday_check("^NSEI").await.unwrap().unwrap();
        assert_eq!(alert.direction, CrossoverDirection::Bearish);
        assert_eq!(
            alert.message(),
            "⚠️ ^NSEI 15-min Bearish Crossover (daily trend confirmed)"
        );
    }

    #[tokio::test]
    async fn test_intraday_skipped_without_daily_cross() {
        let flat = [100.0; 60];
        let source = MemorySource::default()
            .with("^NSEI", Timeframe::Daily, &flat)
            .with("^NSEI", Timeframe::Minute15, &rally_closes());
        let (engine, source) = engine_with(source, &["^NSEI"], FilterSettings::default());

        assert_eq!(engine.intraday_check("^NSEI").await.unwrap(), None);
        // Only the daily series was requested.
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}
