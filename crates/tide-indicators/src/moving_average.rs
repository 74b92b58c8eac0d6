//! Moving average indicators.

use serde::{Deserialize, Serialize};
use tide_core::traits::Indicator;

/// Simple Moving Average (SMA).
///
/// Calculates the arithmetic mean of the last N values.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() < self.period {
            return vec![];
        }

        let mut result = Vec::with_capacity(data.len() - self.period + 1);
        let period_f64 = self.period as f64;

        // Initial sum
        let mut sum: f64 = crate::simd::sum_simd(&data[..self.period]);
        result.push(sum / period_f64);

        // Sliding window
        for i in self.period..data.len() {
            sum = sum - data[i - self.period] + data[i];
            result.push(sum / period_f64);
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

/// How an exponential average weights its history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmaWeighting {
    /// `y[0] = x[0]`, `y[i] = a*x[i] + (1-a)*y[i-1]`.
    #[default]
    Recursive,
    /// Weighted mean of every observation so far with weights `(1-a)^k`.
    Adjusted,
}

/// Recursive exponential smoothing seeded with the first value.
pub fn ewm_recursive(data: &[f64], alpha: f64) -> Vec<f64> {
    let mut result = Vec::with_capacity(data.len());
    let mut iter = data.iter();
    let Some(&first) = iter.next() else {
        return result;
    };

    let mut value = first;
    result.push(value);
    let decay = 1.0 - alpha;
    for &x in iter {
        value = alpha * x + decay * value;
        result.push(value);
    }
    result
}

/// Bias-adjusted exponential smoothing.
///
/// Each output is `sum((1-a)^k * x[i-k]) / sum((1-a)^k)` over every
/// observation up to `i`. Numerator and denominator are carried forward
/// so the whole series costs one pass.
pub fn ewm_adjusted(data: &[f64], alpha: f64) -> Vec<f64> {
    let decay = 1.0 - alpha;
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    data.iter()
        .map(|&x| {
            numerator = x + decay * numerator;
            denominator = 1.0 + decay * denominator;
            numerator / denominator
        })
        .collect()
}

/// Exponential Moving Average (EMA).
///
/// Smoothing factor is `2 / (span + 1)`. One output per input, starting
/// at the first value; there is no warm-up gating.
#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
    alpha: f64,
    weighting: EmaWeighting,
}

impl Ema {
    /// Create a new recursive EMA with the specified span.
    pub fn new(span: usize) -> Self {
        Self::with_weighting(span, EmaWeighting::Recursive)
    }

    /// Create an EMA with an explicit weighting.
    pub fn with_weighting(span: usize, weighting: EmaWeighting) -> Self {
        assert!(span > 0, "Span must be greater than 0");
        let alpha = 2.0 / (span as f64 + 1.0);
        Self {
            span,
            alpha,
            weighting,
        }
    }

    pub fn span(&self) -> usize {
        self.span
    }

    pub fn weighting(&self) -> EmaWeighting {
        self.weighting
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        match self.weighting {
            EmaWeighting::Recursive => ewm_recursive(data, self.alpha),
            EmaWeighting::Adjusted => ewm_adjusted(data, self.alpha),
        }
    }

    fn period(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "EMA"
    }
}
