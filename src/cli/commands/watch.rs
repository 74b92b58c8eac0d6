//! Market-hours watch loop.

use anyhow::{Context, Result};
use tide_config::AppConfig;
use tide_core::traits::Notifier;
use tide_engine::{deliver, MarketSchedule, ScheduledTask};
use tide_notify::ConsoleNotifier;
use tracing::{info, warn};

use super::common;
use crate::cli::WatchArgs;

pub async fn run(args: WatchArgs, config: AppConfig) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    let engine = common::build_engine(&config)?;
    let mut schedule = MarketSchedule::from_settings(&config.schedule)?;
    let notifier: Box<dyn Notifier> = if config.notify.telegram && !args.dry_run {
        common::telegram_notifier(&config)?
    } else {
        Box::new(ConsoleNotifier::new())
    };
    let index = config.schedule.index_symbol.as_str();

    info!(
        symbols = config.scan.watchlist.len(),
        index,
        daily_scan = %config.schedule.daily_scan_time,
        notifier = notifier.name(),
        "Watching market hours"
    );

    loop {
        let now = schedule.calendar().local_now();

        for task in schedule.due(now) {
            match task {
                ScheduledTask::IntradayCheck => match engine.intraday_check(index).await {
                    Ok(Some(alert)) => {
                        deliver(notifier.as_ref(), &alert.message()).await;
                    }
                    Ok(None) => {}
                    Err(e) => warn!(symbol = index, error = %e, "Intraday check failed"),
                },
                ScheduledTask::DailyScan => {
                    let report = engine.scan().await;
                    println!("{}", report.console_table());
                    let label = now.format("%H:%M").to_string();
                    engine
                        .notify_report(notifier.as_ref(), &report, &label)
                        .await;
                }
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(schedule.sleep_for(now)) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping watch loop");
                break;
            }
        }
    }

    Ok(())
}
