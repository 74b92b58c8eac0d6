//! Confirmation filters and the tide pipeline.
//!
//! Filters are pure predicates over a snapshot and a direction. They never
//! change the tide; they only decide whether it is confirmed.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tide_core::error::IndicatorError;
use tide_core::types::{FilterKind, FilterResult, Side, TideSignal};

use crate::snapshot::IndicatorSnapshot;
use crate::tide::{TideDetector, TideSettings};

/// Confirmation filter trait.
pub trait Filter: Send + Sync {
    /// Which filter this is.
    fn kind(&self) -> FilterKind;

    /// Whether the snapshot supports a trade on `side`.
    fn passes(&self, snapshot: &IndicatorSnapshot, side: Side) -> bool;

    /// Get filter name for reports.
    fn name(&self) -> &str {
        self.kind().label()
    }
}

/// Close on the tide's side of the Bollinger mid-band.
pub struct BollingerFilter;

impl Filter for BollingerFilter {
    fn kind(&self) -> FilterKind {
        FilterKind::Bollinger
    }

    fn passes(&self, snapshot: &IndicatorSnapshot, side: Side) -> bool {
        match side {
            Side::Long => snapshot.close > snapshot.bollinger_mid,
            Side::Short => snapshot.close < snapshot.bollinger_mid,
        }
    }
}

/// Latest volume above a multiple of the average volume.
///
/// Direction-agnostic: a spike confirms either side.
pub struct VolumeSpikeFilter {
    multiplier: f64,
}

impl VolumeSpikeFilter {
    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }
}

impl Filter for VolumeSpikeFilter {
    fn kind(&self) -> FilterKind {
        FilterKind::VolumeSpike
    }

    fn passes(&self, snapshot: &IndicatorSnapshot, _side: Side) -> bool {
        snapshot.volume > self.multiplier * snapshot.volume_average
    }
}

/// Close beyond the prior window's high (long) or low (short).
pub struct BreakoutFilter;

impl Filter for BreakoutFilter {
    fn kind(&self) -> FilterKind {
        FilterKind::Breakout
    }

    fn passes(&self, snapshot: &IndicatorSnapshot, side: Side) -> bool {
        match side {
            Side::Long => snapshot.close > snapshot.prior_high,
            Side::Short => snapshot.close < snapshot.prior_low,
        }
    }
}

/// Close on the tide's side of the trend EMA.
pub struct TrendEmaFilter;

impl Filter for TrendEmaFilter {
    fn kind(&self) -> FilterKind {
        FilterKind::TrendEma
    }

    fn passes(&self, snapshot: &IndicatorSnapshot, side: Side) -> bool {
        match side {
            Side::Long => snapshot.close > snapshot.ema_trend,
            Side::Short => snapshot.close < snapshot.ema_trend,
        }
    }
}

/// RSI on the tide's side of the zone level.
pub struct RsiZoneFilter {
    level: f64,
}

impl RsiZoneFilter {
    pub fn new(level: f64) -> Self {
        Self { level }
    }
}

impl Filter for RsiZoneFilter {
    fn kind(&self) -> FilterKind {
        FilterKind::RsiZone
    }

    fn passes(&self, snapshot: &IndicatorSnapshot, side: Side) -> bool {
        match side {
            Side::Long => snapshot.rsi > self.level,
            Side::Short => snapshot.rsi < self.level,
        }
    }
}

/// Which confirmation filters are switched on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub bollinger: bool,
    pub volume_spike: bool,
    pub breakout: bool,
    pub trend_ema: bool,
    pub rsi_zone: bool,
    /// Volume must exceed this multiple of its average
    pub volume_multiplier: f64,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            bollinger: false,
            volume_spike: false,
            breakout: false,
            trend_ema: false,
            rsi_zone: false,
            volume_multiplier: 1.5,
        }
    }
}

impl FilterSettings {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        if self.volume_multiplier.is_nan() || self.volume_multiplier <= 0.0 {
            return Err(IndicatorError::InvalidParameter(
                "volume_multiplier must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn is_enabled(&self, kind: FilterKind) -> bool {
        match kind {
            FilterKind::Bollinger => self.bollinger,
            FilterKind::VolumeSpike => self.volume_spike,
            FilterKind::Breakout => self.breakout,
            FilterKind::TrendEma => self.trend_ema,
            FilterKind::RsiZone => self.rsi_zone,
        }
    }

    pub fn set(&mut self, kind: FilterKind, enabled: bool) {
        match kind {
            FilterKind::Bollinger => self.bollinger = enabled,
            FilterKind::VolumeSpike => self.volume_spike = enabled,
            FilterKind::Breakout => self.breakout = enabled,
            FilterKind::TrendEma => self.trend_ema = enabled,
            FilterKind::RsiZone => self.rsi_zone = enabled,
        }
    }

    pub fn enabled(&self) -> BTreeSet<FilterKind> {
        FilterKind::all()
            .iter()
            .copied()
            .filter(|kind| self.is_enabled(*kind))
            .collect()
    }
}

/// The "double screen" profile: threshold 50 confirmed by the trend EMA
/// and the RSI zone.
pub fn double_screen() -> (TideSettings, FilterSettings) {
    let tide = TideSettings {
        rsi_threshold: 50.0,
        ..Default::default()
    };
    let filters = FilterSettings {
        trend_ema: true,
        rsi_zone: true,
        ..Default::default()
    };
    (tide, filters)
}

/// Tide detection followed by the enabled confirmation filters.
pub struct TidePipeline {
    detector: TideDetector,
    filters: Vec<Box<dyn Filter>>,
}

impl TidePipeline {
    pub fn new(detector: TideDetector, filters: Vec<Box<dyn Filter>>) -> Self {
        Self { detector, filters }
    }

    /// Build the pipeline with the filters switched on in `filters`.
    pub fn from_settings(tide: &TideSettings, filters: &FilterSettings) -> Self {
        let mut enabled: Vec<Box<dyn Filter>> = Vec::new();
        for kind in filters.enabled() {
            let filter: Box<dyn Filter> = match kind {
                FilterKind::Bollinger => Box::new(BollingerFilter),
                FilterKind::VolumeSpike => {
                    Box::new(VolumeSpikeFilter::new(filters.volume_multiplier))
                }
                FilterKind::Breakout => Box::new(BreakoutFilter),
                FilterKind::TrendEma => Box::new(TrendEmaFilter),
                FilterKind::RsiZone => Box::new(RsiZoneFilter::new(tide.rsi_zone_level)),
            };
            enabled.push(filter);
        }
        Self::new(TideDetector::from_settings(tide), enabled)
    }

    pub fn detector(&self) -> &TideDetector {
        &self.detector
    }

    pub fn enabled(&self) -> BTreeSet<FilterKind> {
        self.filters.iter().map(|f| f.kind()).collect()
    }

    pub fn evaluate(&self, snapshot: &IndicatorSnapshot) -> FilterResult {
        let TideSignal { symbol, tide } = self.detector.signal(snapshot);

        // A neutral tide has no direction to confirm.
        let passed = match tide.side() {
            Some(side) => self
                .filters
                .iter()
                .filter(|f| f.passes(snapshot, side))
                .map(|f| f.kind())
                .collect(),
            None => BTreeSet::new(),
        };

        FilterResult {
            symbol,
            tide,
            enabled: self.enabled(),
            passed,
        }
    }
}

impl Default for TidePipeline {
    fn default() -> Self {
        Self::from_settings(&TideSettings::default(), &FilterSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::tests::flat_snapshot;
    use crate::snapshot::Pair;
    use tide_core::types::Tide;

    fn long_snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot {
            macd: Pair::new(1.2, 1.0),
            rsi: 65.0,
            ..flat_snapshot()
        }
    }

    fn all_filters() -> FilterSettings {
        FilterSettings {
            bollinger: true,
            volume_spike: true,
            breakout: true,
            trend_ema: true,
            rsi_zone: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_filters_confirms_tide() {
        let result = TidePipeline::default().evaluate(&long_snapshot());

        assert_eq!(result.tide, Tide::Long);
        assert!(result.enabled.is_empty());
        assert!(result.confirmed());
    }

    #[test]
    fn test_bollinger_blocks_close_below_mid() {
        let filters = FilterSettings {
            bollinger: true,
            ..Default::default()
        };
        let pipeline = TidePipeline::from_settings(&TideSettings::default(), &filters);
        let snapshot = IndicatorSnapshot {
            close: 99.0,
            bollinger_mid: 100.0,
            ..long_snapshot()
        };

        let result = pipeline.evaluate(&snapshot);
        assert_eq!(result.tide, Tide::Long);
        assert!(!result.passed(FilterKind::Bollinger));
        assert!(!result.confirmed());
    }

    #[test]
    fn test_all_filters_pass_for_strong_long() {
        let pipeline = TidePipeline::from_settings(&TideSettings::default(), &all_filters());
        let snapshot = IndicatorSnapshot {
            close: 105.0,
            volume: 2000.0,
            volume_average: 1000.0,
            bollinger_mid: 100.0,
            ema_trend: 100.0,
            prior_high: 104.0,
            ..long_snapshot()
        };

        let result = pipeline.evaluate(&snapshot);
        assert_eq!(result.enabled.len(), 5);
        assert_eq!(result.passed, result.enabled);
        assert!(result.confirmed());
    }

    #[test]
    fn test_volume_spike_is_strict() {
        let filter = VolumeSpikeFilter::new(1.5);
        let snapshot = IndicatorSnapshot {
            volume: 1500.0,
            volume_average: 1000.0,
            ..flat_snapshot()
        };
        assert!(!filter.passes(&snapshot, Side::Long));
        assert!(!filter.passes(&snapshot, Side::Short));

        let snapshot = IndicatorSnapshot {
            volume: 1501.0,
            ..snapshot
        };
        assert!(filter.passes(&snapshot, Side::Long));
        assert!(filter.passes(&snapshot, Side::Short));
    }

    #[test]
    fn test_breakout_short_uses_prior_low() {
        let snapshot = IndicatorSnapshot {
            close: 98.0,
            prior_low: 99.0,
            ..flat_snapshot()
        };
        assert!(BreakoutFilter.passes(&snapshot, Side::Short));
        assert!(!BreakoutFilter.passes(&snapshot, Side::Long));
    }

    #[test]
    fn test_neutral_tide_passes_nothing() {
        let pipeline = TidePipeline::from_settings(&TideSettings::default(), &all_filters());
        let result = pipeline.evaluate(&flat_snapshot());

        assert_eq!(result.tide, Tide::Neutral);
        assert!(result.passed.is_empty());
        assert!(!result.confirmed());
    }

    #[test]
    fn test_filters_never_change_direction() {
        let pipeline = TidePipeline::from_settings(&TideSettings::default(), &all_filters());
        let detector = TideDetector::default();
        for snapshot in [long_snapshot(), flat_snapshot()] {
            assert_eq!(pipeline.evaluate(&snapshot).tide, detector.evaluate(&snapshot));
        }
    }

    #[test]
    fn test_double_screen_profile() {
        let (tide, filters) = double_screen();
        let pipeline = TidePipeline::from_settings(&tide, &filters);
        let snapshot = IndicatorSnapshot {
            macd: Pair::new(1.2, 1.0),
            rsi: 55.0,
            close: 101.0,
            ema_trend: 100.0,
            ..flat_snapshot()
        };

        let result = pipeline.evaluate(&snapshot);
        assert_eq!(
            result.enabled,
            [FilterKind::TrendEma, FilterKind::RsiZone].into_iter().collect()
        );
        assert!(result.confirmed());
    }

    #[test]
    fn test_settings_toggle() {
        let mut settings = FilterSettings::default();
        settings.set(FilterKind::Breakout, true);
        assert!(settings.is_enabled(FilterKind::Breakout));
        assert_eq!(settings.enabled().len(), 1);

        settings.volume_multiplier = 0.0;
        assert!(settings.validate().is_err());
    }
}
