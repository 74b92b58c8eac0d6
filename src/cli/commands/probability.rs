//! Heikin-Ashi zone probability command.

use anyhow::{Context, Result};
use tide_config::AppConfig;
use tide_core::types::{Bar, Period, Timeframe};
use tide_signals::{ProbabilitySettings, ZoneProbabilityEstimator};
use tracing::info;

use super::common;
use crate::cli::ProbabilityArgs;

fn date(bar: Option<&Bar>) -> String {
    bar.map(|b| b.datetime().format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Estimator for the configured crossover spans.
fn estimator(config: &AppConfig) -> Result<(ZoneProbabilityEstimator, ProbabilitySettings)> {
    config
        .indicators
        .validate()
        .context("Invalid indicator configuration")?;
    let settings = ProbabilitySettings {
        ema_fast: config.indicators.ema_fast,
        ema_slow: config.indicators.ema_slow,
        ..Default::default()
    };
    let estimator = ZoneProbabilityEstimator::new(settings.clone())?;
    Ok((estimator, settings))
}

pub async fn run(args: ProbabilityArgs, config: AppConfig) -> Result<()> {
    let (estimator, settings) = estimator(&config)?;
    let period: Period = args.period.parse()?;
    let interval: Timeframe = args.interval.parse()?;

    let fetcher = common::build_fetcher(&config)?;
    let series = fetcher
        .fetch(&args.symbol, period, interval)
        .await
        .with_context(|| format!("Failed to fetch {}", args.symbol))?;
    info!(symbol = %args.symbol, bars = series.len(), "Loaded history");

    let stats = estimator.estimate(series.bars());

    println!(
        "{} {} {}: {} bars ({} to {})",
        args.symbol,
        period,
        interval,
        series.len(),
        date(series.bars().first()),
        date(series.bars().last()),
    );
    println!(
        "Total {}/{} crossovers: {} ({} bullish, {} bearish)",
        settings.ema_fast,
        settings.ema_slow,
        stats.total_crossovers(),
        stats.bullish_crossovers,
        stats.bearish_crossovers
    );
    println!(
        "Crossovers passing {}-EMA filter: {}",
        settings.ha_ema_span,
        stats.confirmed()
    );
    match stats.probability() {
        Some(p) => println!("Conditional probability: {:.2}%", p * 100.0),
        None => println!("Conditional probability: n/a (no crossovers)"),
    }

    Ok(())
}
