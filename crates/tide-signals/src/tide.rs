//! Tide detection: MACD momentum plus RSI level.

use serde::{Deserialize, Serialize};
use tide_core::error::IndicatorError;
use tide_core::types::{Tide, TideSignal};

use crate::snapshot::IndicatorSnapshot;

/// Tide thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TideSettings {
    /// RSI level separating long from short tides
    pub rsi_threshold: f64,
    /// RSI level used by the RSI-zone confirmation filter
    pub rsi_zone_level: f64,
}

impl Default for TideSettings {
    fn default() -> Self {
        Self {
            rsi_threshold: 60.0,
            rsi_zone_level: 50.0,
        }
    }
}

impl TideSettings {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        for (name, level) in [
            ("rsi_threshold", self.rsi_threshold),
            ("rsi_zone_level", self.rsi_zone_level),
        ] {
            if !(0.0..=100.0).contains(&level) {
                return Err(IndicatorError::InvalidParameter(format!(
                    "{} must be between 0 and 100",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Classifies a snapshot into a tide.
///
/// Long needs MACD rising and above zero with RSI above the threshold;
/// short is the mirror image. The two conditions cannot both hold.
#[derive(Debug, Clone)]
pub struct TideDetector {
    rsi_threshold: f64,
}

impl TideDetector {
    pub fn new(rsi_threshold: f64) -> Self {
        Self { rsi_threshold }
    }

    pub fn from_settings(settings: &TideSettings) -> Self {
        Self::new(settings.rsi_threshold)
    }

    pub fn rsi_threshold(&self) -> f64 {
        self.rsi_threshold
    }

    pub fn evaluate(&self, snapshot: &IndicatorSnapshot) -> Tide {
        let macd = snapshot.macd;

        if macd.is_rising() && macd.latest > 0.0 && snapshot.rsi > self.rsi_threshold {
            Tide::Long
        } else if macd.is_falling() && macd.latest < 0.0 && snapshot.rsi < self.rsi_threshold {
            Tide::Short
        } else {
            Tide::Neutral
        }
    }

    pub fn signal(&self, snapshot: &IndicatorSnapshot) -> TideSignal {
        TideSignal {
            symbol: snapshot.symbol.clone(),
            tide: self.evaluate(snapshot),
        }
    }
}

impl Default for TideDetector {
    fn default() -> Self {
        Self::from_settings(&TideSettings::default())
    }
}
