//! Technical indicators with SIMD optimization.
//!
//! This crate provides the indicators the scanner needs:
//! - Moving averages (SMA, EMA with recursive or adjusted weighting)
//! - Momentum indicators (RSI, MACD line)
//! - Rolling extremes for breakout levels and stops
//! - Heikin-Ashi candles
//!
//! Hot loops (gain/loss split, sums, window extremes) run on `wide` SIMD lanes.

pub mod heikin_ashi;
pub mod momentum;
pub mod moving_average;
pub mod rolling;
pub mod simd;

pub use heikin_ashi::{HaCandle, HeikinAshi};
pub use momentum::{Macd, Rsi};
pub use moving_average::{ewm_adjusted, ewm_recursive, Ema, EmaWeighting, Sma};
pub use rolling::{Extreme, RollingExtreme};
