//! Momentum indicators.

use crate::moving_average::{ewm_adjusted, ewm_recursive};
use crate::simd::gains_losses_simd;
use tide_core::traits::Indicator;

/// Relative Strength Index (RSI).
///
/// Average gain and loss are exponentially weighted with `alpha = 1/period`
/// using the bias-adjusted form, so every change since the start of the
/// series contributes. The first value needs `period` price changes.
///
/// A window without losses (including a perfectly flat one) reads 100.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    /// Create a new RSI indicator.
    ///
    /// Common periods are 14 (default) or 9.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    #[inline]
    fn from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
        if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
        }
    }
}

impl Default for Rsi {
    fn default() -> Self {
        Self::new(14)
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() <= self.period {
            return vec![];
        }

        let (gains, losses) = gains_losses_simd(data);
        let alpha = 1.0 / self.period as f64;
        let avg_gains = ewm_adjusted(&gains, alpha);
        let avg_losses = ewm_adjusted(&losses, alpha);

        // Skip the warm-up: the first `period - 1` changes carry too little weight.
        avg_gains[self.period - 1..]
            .iter()
            .zip(&avg_losses[self.period - 1..])
            .map(|(&gain, &loss)| Self::from_averages(gain, loss))
            .collect()
    }

    fn period(&self) -> usize {
        self.period + 1 // Need period+1 data points
    }

    fn name(&self) -> &str {
        "RSI"
    }
}

/// MACD line: fast EMA minus slow EMA of the input.
///
/// Both averages use recursive weighting seeded with the first value, so
/// the line has one value per input. No signal line or histogram.
#[derive(Debug, Clone)]
pub struct Macd {
    fast_span: usize,
    slow_span: usize,
}

impl Macd {
    /// Create a new MACD with default spans (12, 26).
    pub fn new() -> Self {
        Self::with_spans(12, 26)
    }

    /// Create a MACD with custom spans.
    pub fn with_spans(fast: usize, slow: usize) -> Self {
        assert!(fast > 0 && slow > 0);
        assert!(fast < slow, "Fast span must be less than slow span");
        Self {
            fast_span: fast,
            slow_span: slow,
        }
    }

    fn alpha(span: usize) -> f64 {
        2.0 / (span as f64 + 1.0)
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self::new()
    }
}

impl Indicator for Macd {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() < self.slow_span {
            return vec![];
        }

        let fast = ewm_recursive(data, Self::alpha(self.fast_span));
        let slow = ewm_recursive(data, Self::alpha(self.slow_span));

        fast.iter().zip(slow.iter()).map(|(f, s)| f - s).collect()
    }

    fn period(&self) -> usize {
        self.slow_span
    }

    fn name(&self) -> &str {
        "MACD"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_known_values() {
        // period 2 => alpha 0.5; changes +1 -1 +1 +1
        let rsi = Rsi::new(2);
        let result = rsi.calculate(&[1.0, 2.0, 1.0, 2.0, 3.0]);

        assert_eq!(result.len(), 3);
        assert!((result[0] - 100.0 / 3.0).abs() < 1e-9);
        assert!((result[1] - (100.0 - 100.0 / 3.5)).abs() < 1e-9);
        assert!((result[2] - (100.0 - 100.0 / 7.5)).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_all_gains() {
        let rsi = Rsi::new(14);
        let data: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let result = rsi.calculate(&data);

        assert_eq!(result.len(), 6);
        for value in &result {
            assert!((value - 100.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_rsi_all_losses() {
        let rsi = Rsi::new(14);
        let data: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let result = rsi.calculate(&data);

        assert!(result.iter().all(|v| v.abs() < 1e-10));
    }

    #[test]
    fn test_rsi_flat_series_is_100() {
        let rsi = Rsi::new(14);
        let result = rsi.calculate(&[50.0; 30]);

        assert!(!result.is_empty());
        assert!(result.iter().all(|v| (v - 100.0).abs() < 1e-10));
    }

    #[test]
    fn test_rsi_bounds() {
        let rsi = Rsi::new(14);
        let data: Vec<f64> = (0..200)
            .map(|i| 100.0 + (i as f64 * 0.37).sin() * 5.0 + (i as f64 * 0.05).cos() * 3.0)
            .collect();

        for value in rsi.calculate(&data) {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let rsi = Rsi::new(14);
        assert!(rsi.calculate(&[1.0; 14]).is_empty());
        assert_eq!(rsi.calculate(&[1.0; 15]).len(), 1);
        assert!(rsi.validate_data(&[1.0; 14]).is_err());
    }

    #[test]
    fn test_macd_constant_series_is_zero() {
        let macd = Macd::new();
        let result = macd.calculate(&[100.0; 40]);

        assert_eq!(result.len(), 40);
        assert!(result.iter().all(|v| v.abs() < 1e-10));
    }

    #[test]
    fn test_macd_uptrend_positive_and_rising() {
        let macd = Macd::new();
        let data: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let result = macd.calculate(&data);

        let n = result.len();
        assert!(result[n - 1] > 0.0);
        assert!(result[n - 1] > result[n - 2]);
    }

    #[test]
    fn test_macd_insufficient_data() {
        assert!(Macd::new().calculate(&[1.0; 25]).is_empty());
    }
}
