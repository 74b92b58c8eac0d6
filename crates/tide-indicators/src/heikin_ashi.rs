//! Heikin-Ashi candles.

use serde::{Deserialize, Serialize};
use tide_core::traits::BarIndicator;
use tide_core::types::Bar;

/// A smoothed Heikin-Ashi candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HaCandle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl HaCandle {
    #[inline]
    pub fn is_green(&self) -> bool {
        self.close > self.open
    }

    #[inline]
    pub fn is_red(&self) -> bool {
        self.close < self.open
    }

    /// Upper edge of the real body.
    #[inline]
    pub fn body_top(&self) -> f64 {
        self.open.max(self.close)
    }

    /// Lower edge of the real body.
    #[inline]
    pub fn body_bottom(&self) -> f64 {
        self.open.min(self.close)
    }

    #[inline]
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }
}

/// Heikin-Ashi transform of a bar series.
///
/// The first candle opens at the midpoint of the first bar's open and
/// close; each later candle opens at the midpoint of the previous candle's
/// open and close.
#[derive(Debug, Clone, Default)]
pub struct HeikinAshi;

impl HeikinAshi {
    pub fn new() -> Self {
        Self
    }
}

impl BarIndicator for HeikinAshi {
    type Output = HaCandle;

    fn calculate(&self, bars: &[Bar]) -> Vec<HaCandle> {
        let mut result: Vec<HaCandle> = Vec::with_capacity(bars.len());

        for bar in bars {
            let close = bar.ohlc4();
            let open = match result.last() {
                Some(prev) => (prev.open + prev.close) / 2.0,
                None => (bar.open + bar.close) / 2.0,
            };
            result.push(HaCandle {
                open,
                high: bar.high.max(open).max(close),
                low: bar.low.min(open).min(close),
                close,
            });
        }

        result
    }

    fn name(&self) -> &str {
        "HeikinAshi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heikin_ashi_candles() {
        let bars = vec![
            Bar::new(1, 10.0, 12.0, 9.0, 11.0, 100.0),
            Bar::new(2, 11.0, 14.0, 10.0, 13.0, 100.0),
        ];
        let candles = HeikinAshi::new().calculate(&bars);

        assert_eq!(candles.len(), 2);
        assert!((candles[0].open - 10.5).abs() < 1e-10);
        assert!((candles[0].close - 10.5).abs() < 1e-10);
        assert!((candles[0].high - 12.0).abs() < 1e-10);
        assert!((candles[0].low - 9.0).abs() < 1e-10);

        // open = (10.5 + 10.5) / 2, close = (11 + 14 + 10 + 13) / 4
        assert!((candles[1].open - 10.5).abs() < 1e-10);
        assert!((candles[1].close - 12.0).abs() < 1e-10);
        assert!(candles[1].is_green());
        assert!((candles[1].body() - 1.5).abs() < 1e-10);
        assert!((candles[1].body_top() - 12.0).abs() < 1e-10);
        assert!((candles[1].body_bottom() - 10.5).abs() < 1e-10);
    }

    #[test]
    fn test_heikin_ashi_high_low_envelope() {
        let bars = vec![
            Bar::new(1, 20.0, 21.0, 19.0, 20.5, 1.0),
            Bar::new(2, 15.0, 15.5, 14.0, 14.5, 1.0),
        ];
        let candles = HeikinAshi::new().calculate(&bars);

        // Open carried from the prior candle sits above this bar's high.
        assert!(candles[1].high >= candles[1].open);
        assert!(candles[1].low <= candles[1].close);
        assert!(candles[1].is_red());
    }

    #[test]
    fn test_heikin_ashi_empty() {
        assert!(HeikinAshi::new().calculate(&[]).is_empty());
    }
}
