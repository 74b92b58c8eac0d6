//! Trade levels for crossover signals.
//!
//! Turns a crossover entry into a bracketed plan: a stop at the recent
//! extreme and two profit targets at fixed multiples of the risk.

mod trade_plan;

pub use trade_plan::{RiskSettings, TradePlan, TradePlanner};
