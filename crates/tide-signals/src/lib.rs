//! Signal generation for the tide scanner.
//!
//! This crate turns bar series into scanner signals:
//! - Indicator snapshots (latest/previous values used by every predicate)
//! - Tide classification from MACD momentum and RSI level
//! - Confirmation filters (Bollinger, volume spike, breakout, trend EMA, RSI zone)
//! - Fast/slow EMA crossovers
//! - Heikin-Ashi zone probability of historical crossovers

pub mod crossover;
pub mod filters;
pub mod probability;
pub mod snapshot;
pub mod tide;

pub use crossover::{crossover_event, detect_crossover, CrossoverDetector};
pub use filters::{
    double_screen, BollingerFilter, BreakoutFilter, Filter, FilterSettings, RsiZoneFilter,
    TidePipeline, TrendEmaFilter, VolumeSpikeFilter,
};
pub use probability::{ProbabilitySettings, ZoneProbability, ZoneProbabilityEstimator};
pub use snapshot::{IndicatorEngine, IndicatorSettings, IndicatorSnapshot, Pair};
pub use tide::{TideDetector, TideSettings};
