//! Logging for the tide scanner.

mod logging;

pub use logging::{setup_logging, LOG_FILE_PREFIX};
