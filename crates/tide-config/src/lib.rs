//! Configuration management.

mod settings;

pub use settings::{
    AppConfig, AppSettings, DataSettings, DataSourceKind, LoggingConfig, NotifySettings,
    ScanConfig,
};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;

/// Prefix of environment overrides, e.g. `TIDE__SCAN__MIN_HISTORY=80`.
pub const ENV_PREFIX: &str = "TIDE";

/// Load configuration from file and environment.
///
/// Missing keys take their defaults. `TIDE__SCAN__WATCHLIST` accepts a
/// comma-separated list.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(environment())
        .build()?;

    config.try_deserialize()
}

/// Defaults plus environment overrides, for runs without a config file.
pub fn load_from_env() -> Result<AppConfig, ConfigError> {
    let config = Config::builder().add_source(environment()).build()?;
    config.try_deserialize()
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("scan.watchlist")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_partial_file_with_env_override() {
        let dir = std::env::temp_dir().join(format!("tide-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tide.toml");
        fs::write(
            &path,
            r#"
[scan]
watchlist = ["INFY.NS", "TCS.NS"]

[filters]
bollinger = true

[tide]
rsi_threshold = 50.0
"#,
        )
        .unwrap();

        std::env::set_var("TIDE__SCAN__MIN_HISTORY", "80");
        let config = load_config(&path).unwrap();
        std::env::remove_var("TIDE__SCAN__MIN_HISTORY");

        assert_eq!(config.scan.watchlist, vec!["INFY.NS", "TCS.NS"]);
        assert_eq!(config.scan.min_history, 80);
        assert!(config.filters.bollinger);
        assert!(!config.filters.volume_spike);
        assert!((config.tide.rsi_threshold - 50.0).abs() < 1e-10);
        // Untouched sections keep their defaults.
        assert_eq!(config.indicators.rsi_length, 14);
        assert_eq!(config.data.retry_attempts, 3);
        assert!(config.validate().is_ok());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_environment_without_watchlist_is_invalid() {
        let config = load_from_env().unwrap();
        assert!(config.scan.watchlist.is_empty());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_config(Path::new("/nonexistent/tide.toml")).is_err());
    }
}
