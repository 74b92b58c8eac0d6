//! Core traits for the tide scanner.

mod data_source;
mod indicator;
mod notifier;

pub use data_source::MarketDataSource;
pub use indicator::{BarIndicator, Indicator};
pub use notifier::Notifier;
