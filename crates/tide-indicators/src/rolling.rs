//! Rolling-window extremes.

use crate::simd::minmax_simd;
use tide_core::traits::Indicator;

/// Which end of the window to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    Lowest,
    Highest,
}

/// Lowest or highest value over a trailing window.
///
/// With `include_current` the window ends at the bar being evaluated
/// (a 5-bar stop uses this). Without it the window is the `window` bars
/// strictly before, as a breakout level must not contain the breakout bar.
#[derive(Debug, Clone)]
pub struct RollingExtreme {
    window: usize,
    extreme: Extreme,
    include_current: bool,
}

impl RollingExtreme {
    pub fn new(window: usize, extreme: Extreme, include_current: bool) -> Self {
        assert!(window > 0, "Window must be greater than 0");
        Self {
            window,
            extreme,
            include_current,
        }
    }

    /// Lowest value over the last `window` values, current one included.
    pub fn lowest(window: usize) -> Self {
        Self::new(window, Extreme::Lowest, true)
    }

    /// Highest value over the last `window` values, current one included.
    pub fn highest(window: usize) -> Self {
        Self::new(window, Extreme::Highest, true)
    }

    /// Lowest of the `window` values before the current one.
    pub fn prior_lowest(window: usize) -> Self {
        Self::new(window, Extreme::Lowest, false)
    }

    /// Highest of the `window` values before the current one.
    pub fn prior_highest(window: usize) -> Self {
        Self::new(window, Extreme::Highest, false)
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl Indicator for RollingExtreme {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() < self.period() {
            return vec![];
        }

        // Prior windows drop the last value so each window lines up with the next bar.
        let source = if self.include_current {
            data
        } else {
            &data[..data.len() - 1]
        };

        source
            .windows(self.window)
            .filter_map(minmax_simd)
            .map(|(min, max)| match self.extreme {
                Extreme::Lowest => min,
                Extreme::Highest => max,
            })
            .collect()
    }

    fn period(&self) -> usize {
        if self.include_current {
            self.window
        } else {
            self.window + 1
        }
    }

    fn name(&self) -> &str {
        match (self.extreme, self.include_current) {
            (Extreme::Lowest, true) => "LOWEST",
            (Extreme::Highest, true) => "HIGHEST",
            (Extreme::Lowest, false) => "PRIOR_LOWEST",
            (Extreme::Highest, false) => "PRIOR_HIGHEST",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowest_includes_current() {
        let low = RollingExtreme::lowest(3);
        let result = low.calculate(&[5.0, 4.0, 6.0, 3.0, 7.0]);

        assert_eq!(result, vec![4.0, 3.0, 3.0]);
    }

    #[test]
    fn test_prior_highest_excludes_current() {
        let high = RollingExtreme::prior_highest(3);
        let data = [1.0, 5.0, 2.0, 3.0, 10.0];
        let result = high.calculate(&data);

        // Last value is max(5, 2, 3); the 10 on the current bar is ignored.
        assert_eq!(result.len(), 2);
        assert!((result[0] - 5.0).abs() < 1e-10);
        assert!((result[1] - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_prior_needs_one_extra_value() {
        let low = RollingExtreme::prior_lowest(3);
        assert!(low.calculate(&[1.0, 2.0, 3.0]).is_empty());
        assert_eq!(low.calculate(&[1.0, 2.0, 3.0, 4.0]), vec![1.0]);
    }
}
