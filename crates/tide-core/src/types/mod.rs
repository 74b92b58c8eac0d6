//! Core data types for the tide scanner.

mod ohlcv;
mod signal;
mod timeframe;

pub use ohlcv::{Bar, BarSeries};
pub use signal::{
    CrossoverDirection, CrossoverEvent, FilterKind, FilterResult, Side, Tide, TideSignal,
};
pub use timeframe::{Period, Timeframe};
