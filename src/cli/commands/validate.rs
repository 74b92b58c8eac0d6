//! Validate configuration command.

use anyhow::Result;
use std::path::Path;
use tide_config::load_config;
use tide_core::types::FilterKind;

pub async fn run(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    };
    if let Err(e) = config.validate() {
        println!("Configuration error: {}", e);
        return Err(e.into());
    }

    println!("Configuration is valid!");
    println!();
    println!("App: {}", config.app.name);
    println!("Environment: {}", config.app.environment);
    println!("Log level: {}", config.logging.level);
    println!(
        "Data source: {:?} ({} {})",
        config.data.source, config.data.period, config.data.interval
    );
    println!("Watchlist: {} symbols", config.scan.watchlist.len());
    println!(
        "Crossover: {}/{} EMA, trend {}-EMA",
        config.indicators.ema_fast, config.indicators.ema_slow, config.indicators.ema_trend
    );
    println!("RSI threshold: {}", config.tide.rsi_threshold);
    let enabled: Vec<&str> = FilterKind::all()
        .iter()
        .filter(|kind| config.filters.is_enabled(**kind))
        .map(|kind| kind.label())
        .collect();
    println!(
        "Filters: {}",
        if enabled.is_empty() { "none".to_string() } else { enabled.join(", ") }
    );
    println!(
        "Targets: {}R / {}R",
        config.risk.first_target_r, config.risk.second_target_r
    );
    println!(
        "Daily scan: {} (UTC{:+} min)",
        config.schedule.daily_scan_time, config.schedule.utc_offset_minutes
    );
    println!("Telegram: {}", if config.notify.telegram { "on" } else { "off" });

    Ok(())
}
