//! Configuration structures.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tide_core::error::{ScanError, ScanResult};
use tide_core::types::{Period, Timeframe};
use tide_data::RetryPolicy;
use tide_engine::{ScanSettings, ScheduleSettings};
use tide_risk::RiskSettings;
use tide_signals::{FilterSettings, IndicatorSettings, TideSettings};

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSettings,
    pub logging: LoggingConfig,
    pub data: DataSettings,
    pub indicators: IndicatorSettings,
    pub tide: TideSettings,
    pub filters: FilterSettings,
    pub risk: RiskSettings,
    pub scan: ScanConfig,
    pub notify: NotifySettings,
    pub schedule: ScheduleSettings,
}

/// General app settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "tide-scanner".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
    /// Directory for daily log files; stdout only when unset
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            directory: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

/// Where bars come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceKind {
    #[default]
    Yahoo,
    Csv,
}

/// Market data settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub source: DataSourceKind,
    /// Directory of `{symbol}.csv` files for the csv source
    pub csv_dir: String,
    pub period: Period,
    pub interval: Timeframe,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            source: DataSourceKind::Yahoo,
            csv_dir: "data".to_string(),
            period: Period::Months6,
            interval: Timeframe::Daily,
            retry_attempts: 3,
            retry_delay_ms: 2000,
            request_timeout_secs: 10,
        }
    }
}

impl DataSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, Duration::from_millis(self.retry_delay_ms))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Watchlist and scan limits. The watchlist has no default; it must
/// come from the config file, the environment or the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub watchlist: Vec<String>,
    pub min_history: usize,
    pub concurrency: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            watchlist: Vec::new(),
            min_history: 50,
            concurrency: 4,
        }
    }
}

/// Notification settings. Credentials are read from the named
/// environment variables, never stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifySettings {
    pub telegram: bool,
    pub bot_token_env: String,
    pub chat_id_env: String,
    pub api_base: String,
    pub parse_mode: String,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            telegram: false,
            bot_token_env: "TELEGRAM_BOT_TOKEN".to_string(),
            chat_id_env: "TELEGRAM_CHAT_ID".to_string(),
            api_base: "https://api.telegram.org".to_string(),
            parse_mode: "HTML".to_string(),
        }
    }
}

impl AppConfig {
    /// Check every section before anything runs.
    pub fn validate(&self) -> ScanResult<()> {
        if self.scan.watchlist.is_empty() {
            return Err(ScanError::Config("scan.watchlist is empty".into()));
        }
        if let Some(blank) = self.scan.watchlist.iter().position(|s| s.trim().is_empty()) {
            return Err(ScanError::Config(format!(
                "scan.watchlist entry {} is blank",
                blank
            )));
        }
        if self.scan.concurrency == 0 {
            return Err(ScanError::Config("scan.concurrency must be at least 1".into()));
        }

        self.indicators.validate()?;
        self.tide.validate()?;
        self.filters.validate()?;
        self.risk.validate()?;
        self.schedule.validate()?;

        let required = self.indicators.required_history();
        if self.scan.min_history < required {
            return Err(ScanError::Config(format!(
                "scan.min_history {} is below the {} bars the indicators need",
                self.scan.min_history, required
            )));
        }

        if self.data.retry_attempts == 0 {
            return Err(ScanError::Config("data.retry_attempts must be at least 1".into()));
        }
        if self.data.request_timeout_secs == 0 {
            return Err(ScanError::Config(
                "data.request_timeout_secs must be positive".into(),
            ));
        }
        if self.data.source == DataSourceKind::Csv && self.data.csv_dir.trim().is_empty() {
            return Err(ScanError::Config("data.csv_dir is required for the csv source".into()));
        }

        Ok(())
    }

    pub fn scan_settings(&self) -> ScanSettings {
        ScanSettings {
            watchlist: self.scan.watchlist.clone(),
            min_history: self.scan.min_history,
            concurrency: self.scan.concurrency,
            period: self.data.period,
            interval: self.data.interval,
        }
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> ScanResult<String> {
        toml::to_string_pretty(self).map_err(|e| ScanError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> AppConfig {
        let mut config = AppConfig::default();
        config.scan.watchlist = vec!["INFY.NS".to_string(), "TCS.NS".to_string()];
        config
    }

    #[test]
    fn test_configured_defaults_are_valid() {
        assert!(configured().validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_watchlist() {
        assert!(AppConfig::default().scan.watchlist.is_empty());
        assert!(matches!(
            AppConfig::default().validate(),
            Err(ScanError::Config(_))
        ));

        let mut config = configured();
        config.scan.watchlist.push("  ".to_string());
        assert!(matches!(config.validate(), Err(ScanError::Config(_))));
    }

    #[test]
    fn test_rejects_short_min_history() {
        let mut config = configured();
        config.scan.min_history = 30;
        assert!(config.validate().is_err());

        // A longer slow EMA raises the requirement.
        let mut config = configured();
        config.indicators.ema_slow = 100;
        assert!(config.validate().is_err());
        config.scan.min_history = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_invalid_sections() {
        let mut config = configured();
        config.indicators.ema_fast = 60;
        assert!(matches!(config.validate(), Err(ScanError::Indicator(_))));

        let mut config = configured();
        config.data.retry_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = configured();
        config.filters.volume_multiplier = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_renders_defaults() {
        let config = configured();
        let rendered = config.to_toml().unwrap();

        assert!(rendered.contains("[indicators]"));
        assert!(rendered.contains("[schedule]"));
        let parsed: AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_scan_settings_from_sections() {
        let mut config = configured();
        config.data.period = Period::Year1;
        let settings = config.scan_settings();

        assert_eq!(settings.period, Period::Year1);
        assert_eq!(settings.watchlist.len(), 2);
        assert_eq!(config.data.retry_policy().delay, Duration::from_secs(2));
    }
}
