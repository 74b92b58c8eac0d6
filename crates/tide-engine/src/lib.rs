//! Scan orchestration.
//!
//! Runs the signal pipeline over a watchlist, reduces the per-symbol
//! outcomes into a bucketed [`ScanReport`], and decides when the watch
//! loop should scan.

mod engine;
mod report;
mod schedule;

pub use engine::{deliver, IntradayAlert, ScanEngine, ScanSettings};
pub use report::{trade_lines, Bucket, ScanReport, SkipReason, SymbolOutcome};
pub use schedule::{MarketCalendar, MarketSchedule, ScheduleSettings, ScheduledTask};
