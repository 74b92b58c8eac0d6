//! Bracketed trade plans for crossover entries.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tide_core::error::ScanError;
use tide_core::types::Side;
use tracing::debug;

/// Target multiples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSettings {
    /// First target, in multiples of the entry-to-stop risk
    pub first_target_r: Decimal,
    /// Second target, in multiples of the risk; also the quoted R:R
    pub second_target_r: Decimal,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            first_target_r: dec!(1.5),
            second_target_r: dec!(3),
        }
    }
}

impl RiskSettings {
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.first_target_r <= Decimal::ZERO {
            return Err(ScanError::Config(
                "first_target_r must be positive".into(),
            ));
        }
        if self.second_target_r <= self.first_target_r {
            return Err(ScanError::Config(
                "second_target_r must be greater than first_target_r".into(),
            ));
        }
        Ok(())
    }
}

/// Entry, stop and two profit targets for one crossover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradePlan {
    pub symbol: String,
    pub side: Side,
    pub entry: Decimal,
    pub stop_loss: Decimal,
    pub target_1: Decimal,
    pub target_2: Decimal,
    /// Reward-to-risk multiple of the second target
    pub risk_reward: Decimal,
}

impl TradePlan {
    /// Distance between entry and stop.
    pub fn risk(&self) -> Decimal {
        (self.entry - self.stop_loss).abs()
    }

    /// Distance from entry to `target` in multiples of the risk.
    pub fn reward_multiple(&self, target: Decimal) -> Decimal {
        let risk = self.risk();
        if risk.is_zero() {
            return Decimal::ZERO;
        }
        ((target - self.entry).abs() / risk).normalize()
    }

    /// Decimal places needed to print the levels: two, or as many as the
    /// risk carries (up to six) so entry and stop never print the same.
    pub fn price_decimals(&self) -> usize {
        (self.risk().normalize().scale() as usize).clamp(2, 6)
    }
}

/// Builds trade plans from an entry price and a stop extreme.
#[derive(Debug, Clone, Default)]
pub struct TradePlanner {
    settings: RiskSettings,
}

impl TradePlanner {
    pub fn new(settings: RiskSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RiskSettings {
        &self.settings
    }

    /// Plan a trade entered at `entry` with its stop at `stop`.
    ///
    /// Prices are kept as given; rounding is left to whoever prints them.
    /// Long plans need the stop below the entry and short plans above it.
    /// Returns `None` when the risk is zero, the stop is on the wrong side,
    /// or a price is not finite.
    pub fn plan(&self, symbol: &str, side: Side, entry: f64, stop: f64) -> Option<TradePlan> {
        let entry = Decimal::from_f64(entry)?;
        let stop_loss = Decimal::from_f64(stop)?;

        let risk = match side {
            Side::Long => entry - stop_loss,
            Side::Short => stop_loss - entry,
        };
        if risk <= Decimal::ZERO {
            debug!(symbol, %side, %entry, %stop_loss, "No trade plan: non-positive risk");
            return None;
        }

        let direction = match side {
            Side::Long => Decimal::ONE,
            Side::Short => Decimal::NEGATIVE_ONE,
        };
        let target = |multiple: Decimal| entry + direction * risk * multiple;

        Some(TradePlan {
            symbol: symbol.to_string(),
            side,
            entry,
            stop_loss,
            target_1: target(self.settings.first_target_r),
            target_2: target(self.settings.second_target_r),
            risk_reward: self.settings.second_target_r,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_plan() {
        let planner = TradePlanner::default();
        let plan = planner.plan("INFY.NS", Side::Long, 100.0, 96.0).unwrap();

        assert_eq!(plan.entry, dec!(100));
        assert_eq!(plan.stop_loss, dec!(96));
        assert_eq!(plan.target_1, dec!(106));
        assert_eq!(plan.target_2, dec!(112));
        assert_eq!(plan.risk_reward, dec!(3));
        assert_eq!(plan.risk(), dec!(4));
        assert_eq!(plan.reward_multiple(plan.target_1), dec!(1.5));
        assert_eq!(plan.reward_multiple(plan.target_2), dec!(3));
    }

    #[test]
    fn test_short_plan() {
        let planner = TradePlanner::default();
        let plan = planner.plan("INFY.NS", Side::Short, 100.0, 102.5).unwrap();

        assert_eq!(plan.stop_loss, dec!(102.5));
        assert_eq!(plan.target_1, dec!(96.25));
        assert_eq!(plan.target_2, dec!(92.5));
        assert!(plan.target_2 < plan.target_1 && plan.target_1 < plan.entry);
    }

    #[test]
    fn test_ordering_and_ratio() {
        let planner = TradePlanner::default();
        for (entry, stop) in [(1523.35, 1490.1), (87.05, 86.9), (250.0, 249.99)] {
            let plan = planner.plan("X.NS", Side::Long, entry, stop).unwrap();
            assert!(plan.stop_loss < plan.entry);
            assert!(plan.entry < plan.target_1);
            assert!(plan.target_1 < plan.target_2);
            assert_eq!(plan.target_2 - plan.entry, dec!(3) * (plan.entry - plan.stop_loss));
        }
    }

    #[test]
    fn test_prices_are_not_rounded() {
        let planner = TradePlanner::default();

        let plan = planner.plan("X.NS", Side::Long, 101.237, 97.0).unwrap();
        assert_eq!(plan.entry, dec!(101.237));
        assert_eq!(plan.stop_loss, dec!(97));
        assert_eq!(plan.price_decimals(), 3);

        let plan = planner.plan("X.NS", Side::Long, 1523.456, 1523.451).unwrap();
        assert_eq!(plan.risk(), dec!(0.005));
    }

    #[test]
    fn test_sub_unit_prices_keep_their_risk() {
        let planner = TradePlanner::default();
        let plan = planner.plan("PENNY.NS", Side::Long, 0.1234, 0.1180).unwrap();

        assert_eq!(plan.risk(), dec!(0.0054));
        assert_eq!(plan.target_2, dec!(0.1396));
        assert_eq!(plan.price_decimals(), 4);
    }

    #[test]
    fn test_zero_risk_has_no_plan() {
        let planner = TradePlanner::default();
        assert!(planner.plan("X.NS", Side::Long, 100.0, 100.0).is_none());
        assert!(planner.plan("X.NS", Side::Short, 100.0, 100.0).is_none());
    }

    #[test]
    fn test_wrong_side_stop_has_no_plan() {
        let planner = TradePlanner::default();
        assert!(planner.plan("X.NS", Side::Long, 100.0, 101.0).is_none());
        assert!(planner.plan("X.NS", Side::Short, 100.0, 99.0).is_none());
    }

    #[test]
    fn test_non_finite_prices() {
        let planner = TradePlanner::default();
        assert!(planner.plan("X.NS", Side::Long, f64::NAN, 99.0).is_none());
    }

    #[test]
    fn test_settings_validation() {
        assert!(RiskSettings::default().validate().is_ok());
        let settings = RiskSettings {
            first_target_r: dec!(3),
            second_target_r: dec!(1.5),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
