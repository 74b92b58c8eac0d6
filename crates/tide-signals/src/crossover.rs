//! Fast/slow EMA crossover detection.

use tide_core::traits::Indicator;
use tide_core::types::{CrossoverDirection, CrossoverEvent};
use tide_indicators::{Ema, EmaWeighting};

use crate::snapshot::{IndicatorSnapshot, Pair};

/// Direction of a cross between the previous and latest values.
///
/// Bullish needs the fast line strictly above the slow line now and not
/// above it before; bearish is the mirror image. Touching without crossing
/// is no event, and at most one direction can hold.
pub fn detect_crossover(fast: Pair, slow: Pair) -> Option<CrossoverDirection> {
    if fast.latest > slow.latest && fast.previous <= slow.previous {
        Some(CrossoverDirection::Bullish)
    } else if fast.latest < slow.latest && fast.previous >= slow.previous {
        Some(CrossoverDirection::Bearish)
    } else {
        None
    }
}

/// Crossover event on the latest bar of a snapshot.
pub fn crossover_event(snapshot: &IndicatorSnapshot) -> Option<CrossoverEvent> {
    detect_crossover(snapshot.ema_fast, snapshot.ema_slow).map(|direction| CrossoverEvent {
        symbol: snapshot.symbol.clone(),
        direction,
    })
}

/// EMA crossover detector working directly on closes.
#[derive(Debug, Clone)]
pub struct CrossoverDetector {
    fast: Ema,
    slow: Ema,
}

impl CrossoverDetector {
    pub fn new(fast_span: usize, slow_span: usize, weighting: EmaWeighting) -> Self {
        assert!(fast_span < slow_span, "Fast span must be less than slow span");
        Self {
            fast: Ema::with_weighting(fast_span, weighting),
            slow: Ema::with_weighting(slow_span, weighting),
        }
    }

    /// Cross on the last value of `closes`, if any.
    pub fn detect(&self, closes: &[f64]) -> Option<CrossoverDirection> {
        let fast = Pair::from_tail(&self.fast.calculate(closes))?;
        let slow = Pair::from_tail(&self.slow.calculate(closes))?;
        detect_crossover(fast, slow)
    }

    /// Every cross in the series as `(index, direction)`, oldest first.
    ///
    /// Index 0 has no previous value and never crosses.
    pub fn scan_history(&self, closes: &[f64]) -> Vec<(usize, CrossoverDirection)> {
        let fast = self.fast.calculate(closes);
        let slow = self.slow.calculate(closes);

        (1..fast.len().min(slow.len()))
            .filter_map(|i| {
                let f = Pair::new(fast[i], fast[i - 1]);
                let s = Pair::new(slow[i], slow[i - 1]);
                detect_crossover(f, s).map(|direction| (i, direction))
            })
            .collect()
    }
}

impl Default for CrossoverDetector {
    fn default() -> Self {
        Self::new(5, 50, EmaWeighting::Recursive)
    }
}
