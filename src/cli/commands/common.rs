//! Wiring shared by the commands.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tide_config::{load_config, load_from_env, AppConfig, DataSourceKind};
use tide_core::traits::{MarketDataSource, Notifier};
use tide_data::{CsvDataSource, DataFetcher, YahooConfig, YahooDataSource};
use tide_engine::{MarketCalendar, ScanEngine};
use tide_notify::{TelegramConfig, TelegramNotifier};
use tide_risk::TradePlanner;
use tide_signals::{IndicatorEngine, TidePipeline};

/// Load `path` if it exists, otherwise defaults plus environment overrides.
///
/// The flag tells whether the file was found.
pub fn load_app_config(path: &Path) -> Result<(AppConfig, bool)> {
    if path.exists() {
        let config = load_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
        Ok((config, true))
    } else {
        let config = load_from_env().context("Failed to read configuration from environment")?;
        Ok((config, false))
    }
}

pub fn build_source(config: &AppConfig) -> Result<Arc<dyn MarketDataSource>> {
    let source: Arc<dyn MarketDataSource> = match config.data.source {
        DataSourceKind::Yahoo => Arc::new(
            YahooDataSource::new(YahooConfig {
                timeout: config.data.request_timeout(),
                ..Default::default()
            })
            .context("Failed to create Yahoo data source")?,
        ),
        DataSourceKind::Csv => Arc::new(
            CsvDataSource::new(&config.data.csv_dir)
                .with_context(|| format!("Failed to open CSV directory {}", config.data.csv_dir))?,
        ),
    };
    Ok(source)
}

pub fn build_fetcher(config: &AppConfig) -> Result<DataFetcher> {
    Ok(DataFetcher::new(
        build_source(config)?,
        config.data.retry_policy(),
    ))
}

pub fn build_engine(config: &AppConfig) -> Result<ScanEngine> {
    let engine = ScanEngine::new(
        config.scan_settings(),
        build_fetcher(config)?,
        IndicatorEngine::new(config.indicators.clone()),
        TidePipeline::from_settings(&config.tide, &config.filters),
        TradePlanner::new(config.risk.clone()),
    )
    .context("Failed to create scan engine")?;
    Ok(engine)
}

/// Telegram notifier with credentials from the configured variables.
pub fn telegram_notifier(config: &AppConfig) -> Result<Box<dyn Notifier>> {
    let notify = &config.notify;
    let parse_mode = (!notify.parse_mode.is_empty()).then(|| notify.parse_mode.clone());
    let telegram = TelegramConfig::from_env(&notify.bot_token_env, &notify.chat_id_env)
        .context("Telegram credentials missing")?
        .with_api_base(notify.api_base.clone())
        .with_parse_mode(parse_mode);
    Ok(Box::new(
        TelegramNotifier::new(telegram).context("Failed to create Telegram notifier")?,
    ))
}

/// Exchange-local "HH:MM" for message titles.
pub fn time_label(config: &AppConfig) -> Result<String> {
    let calendar = MarketCalendar::new(
        config.schedule.utc_offset_minutes,
        &config.schedule.holidays,
    )?;
    Ok(calendar.local_now().format("%H:%M").to_string())
}
