//! Per-symbol indicator snapshot.
//!
//! Every predicate in the scanner (tide, confirmation filters, crossover,
//! trade plan) reads from an [`IndicatorSnapshot`] instead of recomputing
//! indicators on its own.

use serde::{Deserialize, Serialize};
use tide_core::error::IndicatorError;
use tide_core::traits::Indicator;
use tide_core::types::BarSeries;
use tide_indicators::{Ema, EmaWeighting, Macd, RollingExtreme, Rsi, Sma};
use tracing::debug;

/// Indicator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSettings {
    /// RSI lookback
    pub rsi_length: usize,
    /// MACD fast EMA span
    pub macd_fast: usize,
    /// MACD slow EMA span
    pub macd_slow: usize,
    /// Crossover fast EMA span
    pub ema_fast: usize,
    /// Crossover slow EMA span
    pub ema_slow: usize,
    /// Confirmation trend EMA span
    pub ema_trend: usize,
    /// Weighting used by the crossover and trend EMAs
    pub ema_weighting: EmaWeighting,
    /// Bollinger mid-band window
    pub bollinger_window: usize,
    /// Volume average window
    pub volume_window: usize,
    /// Prior high/low window for breakouts
    pub breakout_window: usize,
    /// Stop-loss extreme window
    pub stop_window: usize,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            rsi_length: 14,
            macd_fast: 12,
            macd_slow: 26,
            ema_fast: 5,
            ema_slow: 50,
            ema_trend: 50,
            ema_weighting: EmaWeighting::Recursive,
            bollinger_window: 20,
            volume_window: 20,
            breakout_window: 20,
            stop_window: 5,
        }
    }
}

impl IndicatorSettings {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        let spans = [
            ("rsi_length", self.rsi_length),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("ema_fast", self.ema_fast),
            ("ema_slow", self.ema_slow),
            ("ema_trend", self.ema_trend),
            ("bollinger_window", self.bollinger_window),
            ("volume_window", self.volume_window),
            ("breakout_window", self.breakout_window),
            ("stop_window", self.stop_window),
        ];
        if let Some((name, _)) = spans.iter().find(|(_, value)| *value == 0) {
            return Err(IndicatorError::InvalidParameter(format!(
                "{} must be greater than 0",
                name
            )));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(IndicatorError::InvalidParameter(
                "macd_fast must be less than macd_slow".into(),
            ));
        }
        if self.ema_fast >= self.ema_slow {
            return Err(IndicatorError::InvalidParameter(
                "ema_fast must be less than ema_slow".into(),
            ));
        }
        Ok(())
    }

    /// Minimum number of bars a snapshot needs.
    ///
    /// Every indicator must have a latest value, and the paired ones a
    /// previous value too. EMA spans count as warm-up even though the
    /// averages themselves are defined from the first bar.
    pub fn required_history(&self) -> usize {
        [
            self.rsi_length + 1,
            self.macd_slow,
            self.ema_fast,
            self.ema_slow,
            self.ema_trend,
            self.bollinger_window,
            self.volume_window,
            self.breakout_window + 1,
            self.stop_window,
            2,
        ]
        .into_iter()
        .max()
        .unwrap_or(2)
    }
}

/// Latest and previous value of an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    pub latest: f64,
    pub previous: f64,
}

impl Pair {
    pub fn new(latest: f64, previous: f64) -> Self {
        Self { latest, previous }
    }

    /// The last two values of a series.
    pub fn from_tail(values: &[f64]) -> Option<Self> {
        match values {
            [.., previous, latest] => Some(Self::new(*latest, *previous)),
            _ => None,
        }
    }

    #[inline]
    pub fn is_rising(&self) -> bool {
        self.latest > self.previous
    }

    #[inline]
    pub fn is_falling(&self) -> bool {
        self.latest < self.previous
    }
}

/// Indicator values for one symbol at its latest bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub symbol: String,
    pub close: f64,
    pub volume: f64,
    pub rsi: f64,
    pub macd: Pair,
    pub ema_fast: Pair,
    pub ema_slow: Pair,
    pub ema_trend: f64,
    /// Bollinger mid-band (SMA of close)
    pub bollinger_mid: f64,
    /// Average volume over the volume window
    pub volume_average: f64,
    /// Highest high of the breakout window, current bar excluded
    pub prior_high: f64,
    /// Lowest low of the breakout window, current bar excluded
    pub prior_low: f64,
    /// Lowest low of the stop window, current bar included
    pub stop_low: f64,
    /// Highest high of the stop window, current bar included
    pub stop_high: f64,
}

/// Computes snapshots from bar series.
#[derive(Debug, Clone, Default)]
pub struct IndicatorEngine {
    settings: IndicatorSettings,
}

impl IndicatorEngine {
    pub fn new(settings: IndicatorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &IndicatorSettings {
        &self.settings
    }

    pub fn required_history(&self) -> usize {
        self.settings.required_history()
    }

    /// Compute the snapshot for the latest bar of `series`.
    pub fn compute(&self, series: &BarSeries) -> Result<IndicatorSnapshot, IndicatorError> {
        let required = self.required_history();
        let insufficient = || IndicatorError::InsufficientData {
            required,
            available: series.len(),
        };
        if series.len() < required {
            return Err(insufficient());
        }

        let s = &self.settings;
        let closes = series.closes();
        let highs = series.highs();
        let lows = series.lows();
        let volumes = series.volumes();
        let last_bar = series.last().ok_or_else(insufficient)?;

        let rsi = Rsi::new(s.rsi_length).calculate(&closes);
        let macd = Macd::with_spans(s.macd_fast, s.macd_slow).calculate(&closes);
        let ema_fast = Ema::with_weighting(s.ema_fast, s.ema_weighting).calculate(&closes);
        let ema_slow = Ema::with_weighting(s.ema_slow, s.ema_weighting).calculate(&closes);
        let ema_trend = Ema::with_weighting(s.ema_trend, s.ema_weighting).calculate(&closes);
        let bollinger_mid = Sma::new(s.bollinger_window).calculate(&closes);
        let volume_average = Sma::new(s.volume_window).calculate(&volumes);
        let prior_high = RollingExtreme::prior_highest(s.breakout_window).calculate(&highs);
        let prior_low = RollingExtreme::prior_lowest(s.breakout_window).calculate(&lows);
        let stop_low = RollingExtreme::lowest(s.stop_window).calculate(&lows);
        let stop_high = RollingExtreme::highest(s.stop_window).calculate(&highs);

        let snapshot = IndicatorSnapshot {
            symbol: series.symbol.clone(),
            close: last_bar.close,
            volume: last_bar.volume,
            rsi: rsi.last().copied().ok_or_else(insufficient)?,
            macd: Pair::from_tail(&macd).ok_or_else(insufficient)?,
            ema_fast: Pair::from_tail(&ema_fast).ok_or_else(insufficient)?,
            ema_slow: Pair::from_tail(&ema_slow).ok_or_else(insufficient)?,
            ema_trend: ema_trend.last().copied().ok_or_else(insufficient)?,
            bollinger_mid: bollinger_mid.last().copied().ok_or_else(insufficient)?,
            volume_average: volume_average.last().copied().ok_or_else(insufficient)?,
            prior_high: prior_high.last().copied().ok_or_else(insufficient)?,
            prior_low: prior_low.last().copied().ok_or_else(insufficient)?,
            stop_low: stop_low.last().copied().ok_or_else(insufficient)?,
            stop_high: stop_high.last().copied().ok_or_else(insufficient)?,
        };

        debug!(
            symbol = %snapshot.symbol,
            close = snapshot.close,
            rsi = snapshot.rsi,
            macd = snapshot.macd.latest,
            ema_fast = snapshot.ema_fast.latest,
            ema_slow = snapshot.ema_slow.latest,
            "Computed indicator snapshot"
        );

        Ok(snapshot)
    }
}
