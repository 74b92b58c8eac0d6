//! Logging setup.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// File name prefix of the daily log files.
pub const LOG_FILE_PREFIX: &str = "market_scan";

/// Setup logging with the given level.
///
/// `RUST_LOG` takes precedence over `level`. With a `log_dir`, events are
/// also written to a daily-rolling `market_scan.YYYY-MM-DD` file there; the
/// returned guard flushes that file and must live as long as the program.
pub fn setup_logging(level: &str, json: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stdout_layer = if json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().pretty().boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_logging_creates_log() {
        let dir = std::env::temp_dir().join(format!("tide-logs-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let guard = setup_logging("info", false, Some(&dir));
        assert!(guard.is_some());
        tracing::info!("scan started");
        drop(guard);

        let written = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(Result::ok)
            .any(|entry| entry.file_name().to_string_lossy().starts_with(LOG_FILE_PREFIX));
        assert!(written);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
