//! Core types and traits for the tide scanner.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, BarSeries, Timeframe, Period)
//! - Signal vocabulary (Tide, Side, crossover events, filter results)
//! - Core traits for indicators, market-data sources and notifiers

pub mod types;
pub mod traits;
pub mod error;

pub use error::{ScanError, ScanResult};
pub use types::*;
pub use traits::*;
