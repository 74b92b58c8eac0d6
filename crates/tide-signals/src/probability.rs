//! Heikin-Ashi zone confirmation of historical crossovers.
//!
//! Counts every fast/slow EMA crossover in a history and how many of them
//! were confirmed by the Heikin-Ashi candle of the same bar: a bullish
//! cross needs a green candle whose 9-EMA of HA closes sits in the upper
//! part of the body, a bearish cross a red candle with the EMA in the
//! lower part.

use serde::{Deserialize, Serialize};
use tide_core::error::IndicatorError;
use tide_core::traits::{BarIndicator, Indicator};
use tide_core::types::{Bar, CrossoverDirection};
use tide_indicators::{Ema, EmaWeighting, HaCandle, HeikinAshi};

use crate::crossover::CrossoverDetector;

/// Parameters of the zone test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbabilitySettings {
    pub ema_fast: usize,
    pub ema_slow: usize,
    /// Span of the EMA over Heikin-Ashi closes
    pub ha_ema_span: usize,
    /// Share of the body excluded on the far side of the zone
    pub zone_fraction: f64,
}

impl Default for ProbabilitySettings {
    fn default() -> Self {
        Self {
            ema_fast: 5,
            ema_slow: 50,
            ha_ema_span: 9,
            zone_fraction: 0.40,
        }
    }
}

impl ProbabilitySettings {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        if self.ema_fast == 0 || self.ha_ema_span == 0 {
            return Err(IndicatorError::InvalidParameter(
                "EMA spans must be greater than 0".into(),
            ));
        }
        if self.ema_fast >= self.ema_slow {
            return Err(IndicatorError::InvalidParameter(
                "ema_fast must be less than ema_slow".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.zone_fraction) {
            return Err(IndicatorError::InvalidParameter(
                "zone_fraction must be in [0, 1)".into(),
            ));
        }
        Ok(())
    }
}

/// Crossover counts and their confirmation rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneProbability {
    pub bullish_crossovers: usize,
    pub bearish_crossovers: usize,
    pub bullish_confirmed: usize,
    pub bearish_confirmed: usize,
}

impl ZoneProbability {
    pub fn total_crossovers(&self) -> usize {
        self.bullish_crossovers + self.bearish_crossovers
    }

    pub fn confirmed(&self) -> usize {
        self.bullish_confirmed + self.bearish_confirmed
    }

    /// Confirmed share of all crossovers; `None` without crossovers.
    pub fn probability(&self) -> Option<f64> {
        match self.total_crossovers() {
            0 => None,
            total => Some(self.confirmed() as f64 / total as f64),
        }
    }
}

/// Estimates [`ZoneProbability`] from a bar history.
#[derive(Debug, Clone, Default)]
pub struct ZoneProbabilityEstimator {
    settings: ProbabilitySettings,
}

impl ZoneProbabilityEstimator {
    pub fn new(settings: ProbabilitySettings) -> Result<Self, IndicatorError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    fn zone_confirms(&self, direction: CrossoverDirection, candle: &HaCandle, ema: f64) -> bool {
        let top = candle.body_top();
        let bottom = candle.body_bottom();
        let margin = candle.body() * self.settings.zone_fraction;

        match direction {
            CrossoverDirection::Bullish => {
                candle.is_green() && ema >= bottom + margin && ema <= top
            }
            CrossoverDirection::Bearish => {
                candle.is_red() && ema <= top - margin && ema >= bottom
            }
        }
    }

    pub fn estimate(&self, bars: &[Bar]) -> ZoneProbability {
        let s = &self.settings;
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let candles = HeikinAshi::new().calculate(bars);
        let ha_closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let ha_ema = Ema::new(s.ha_ema_span).calculate(&ha_closes);

        let detector = CrossoverDetector::new(s.ema_fast, s.ema_slow, EmaWeighting::Recursive);
        let mut result = ZoneProbability::default();

        for (index, direction) in detector.scan_history(&closes) {
            let confirmed = match (candles.get(index), ha_ema.get(index)) {
                (Some(candle), Some(&ema)) => self.zone_confirms(direction, candle, ema),
                _ => false,
            };
            match direction {
                CrossoverDirection::Bullish => {
                    result.bullish_crossovers += 1;
                    result.bullish_confirmed += usize::from(confirmed);
                }
                CrossoverDirection::Bearish => {
                    result.bearish_crossovers += 1;
                    result.bearish_confirmed += usize::from(confirmed);
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(i: usize, open: f64, close: f64) -> Bar {
        Bar::new(
            i as i64 * 86_400_000,
            open,
            open.max(close) + 0.5,
            open.min(close) - 0.5,
            close,
            1000.0,
        )
    }

    #[test]
    fn test_probability_none_without_crossovers() {
        let bars: Vec<Bar> = (0..80).map(|i| bar(i, 100.0, 100.0)).collect();
        let result = ZoneProbabilityEstimator::default().estimate(&bars);

        assert_eq!(result.total_crossovers(), 0);
        assert_eq!(result.probability(), None);
    }

    #[test]
    fn test_counts_match_crossover_scan() {
        let mut closes: Vec<f64> = (0..60).map(|i| 200.0 - i as f64).collect();
        closes.extend((0..30).map(|i| 141.0 + 4.0 * i as f64));
        closes.extend((0..30).map(|i| 257.0 - 6.0 * i as f64));
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let open = if i == 0 { c } else { closes[i - 1] };
                bar(i, open, c)
            })
            .collect();

        let result = ZoneProbabilityEstimator::default().estimate(&bars);
        assert_eq!(result.bullish_crossovers, 1);
        assert_eq!(result.bearish_crossovers, 2);
        assert!(result.confirmed() <= result.total_crossovers());

        let probability = result.probability().unwrap();
        assert!((0.0..=1.0).contains(&probability));
    }

    #[test]
    fn test_zone_test() {
        let estimator = ZoneProbabilityEstimator::default();
        let green = HaCandle {
            open: 100.0,
            high: 111.0,
            low: 99.0,
            close: 110.0,
        };

        // Zone for a bullish cross is [104, 110].
        assert!(estimator.zone_confirms(CrossoverDirection::Bullish, &green, 104.0));
        assert!(estimator.zone_confirms(CrossoverDirection::Bullish, &green, 110.0));
        assert!(!estimator.zone_confirms(CrossoverDirection::Bullish, &green, 103.9));
        assert!(!estimator.zone_confirms(CrossoverDirection::Bearish, &green, 101.0));

        let red = HaCandle {
            open: 110.0,
            high: 111.0,
            low: 99.0,
            close: 100.0,
        };
        // Zone for a bearish cross is [100, 106].
        assert!(estimator.zone_confirms(CrossoverDirection::Bearish, &red, 106.0));
        assert!(!estimator.zone_confirms(CrossoverDirection::Bearish, &red, 106.5));
        assert!(!estimator.zone_confirms(CrossoverDirection::Bearish, &red, 99.0));
    }

    #[test]
    fn test_rejects_invalid_spans() {
        let settings = ProbabilitySettings {
            ema_fast: 50,
            ema_slow: 50,
            ..Default::default()
        };
        assert!(matches!(
            ZoneProbabilityEstimator::new(settings),
            Err(IndicatorError::InvalidParameter(_))
        ));

        let settings = ProbabilitySettings {
            zone_fraction: 1.5,
            ..Default::default()
        };
        assert!(ZoneProbabilityEstimator::new(settings).is_err());
        assert!(ZoneProbabilityEstimator::new(ProbabilitySettings::default()).is_ok());
    }

    #[test]
    fn test_probability_ratio() {
        let counts = ZoneProbability {
            bullish_crossovers: 3,
            bearish_crossovers: 1,
            bullish_confirmed: 1,
            bearish_confirmed: 1,
        };
        assert_eq!(counts.probability(), Some(0.5));
    }
}
