//! One-shot scan command.

use anyhow::{Context, Result};
use tide_config::AppConfig;
use tide_core::traits::Notifier;
use tide_core::types::FilterKind;
use tide_signals::double_screen;
use tracing::info;

use super::common;
use crate::cli::{OutputFormat, ScanArgs};

/// Apply command-line overrides on top of the configuration.
fn apply_overrides(args: &ScanArgs, config: &mut AppConfig) {
    if !args.symbols.is_empty() {
        config.scan.watchlist = args.symbols.clone();
    }

    if args.double_screen {
        let (tide, filters) = double_screen();
        config.tide.rsi_threshold = tide.rsi_threshold;
        for kind in filters.enabled() {
            config.filters.set(kind, true);
        }
    }

    let toggles = [
        (args.bb, FilterKind::Bollinger),
        (args.volume, FilterKind::VolumeSpike),
        (args.tlbo, FilterKind::Breakout),
        (args.trend_ema, FilterKind::TrendEma),
        (args.rsi_zone, FilterKind::RsiZone),
    ];
    for (on, kind) in toggles {
        if on {
            config.filters.set(kind, true);
        }
    }

    if let Some(threshold) = args.rsi_threshold {
        config.tide.rsi_threshold = threshold;
    }
}

/// The Telegram notifier, if requested. Built before scanning so missing
/// credentials fail fast.
fn requested_notifier(args: &ScanArgs, config: &AppConfig) -> Result<Option<Box<dyn Notifier>>> {
    if args.notify || config.notify.telegram {
        Ok(Some(common::telegram_notifier(config)?))
    } else {
        Ok(None)
    }
}

pub async fn run(args: ScanArgs, mut config: AppConfig) -> Result<()> {
    apply_overrides(&args, &mut config);
    config.validate().context("Invalid configuration")?;

    let engine = common::build_engine(&config)?;
    let notifier = requested_notifier(&args, &config)?;

    let report = engine.scan().await;

    match args.output {
        OutputFormat::Table => println!("{}", report.console_table()),
        OutputFormat::Summary => println!("{}", report.summary()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    if let Some(save_path) = &args.save {
        let json = report.to_json()?;
        std::fs::write(save_path, json)
            .with_context(|| format!("Failed to write {}", save_path.display()))?;
        info!("Results saved to {:?}", save_path);
    }

    if let Some(notifier) = notifier {
        let label = common::time_label(&config)?;
        engine
            .notify_report(notifier.as_ref(), &report, &label)
            .await;
    }

    Ok(())
}
