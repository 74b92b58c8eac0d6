//! List confirmation filters command.

use anyhow::Result;
use tide_config::AppConfig;
use tide_core::types::FilterKind;

fn describe(kind: FilterKind, config: &AppConfig) -> String {
    let ind = &config.indicators;
    match kind {
        FilterKind::Bollinger => format!(
            "Close above (long) or below (short) the {}-bar Bollinger mid-band",
            ind.bollinger_window
        ),
        FilterKind::VolumeSpike => format!(
            "Volume above {}x its {}-bar average",
            config.filters.volume_multiplier, ind.volume_window
        ),
        FilterKind::Breakout => format!(
            "Close beyond the prior {}-bar high (long) or low (short)",
            ind.breakout_window
        ),
        FilterKind::TrendEma => format!(
            "Close above (long) or below (short) the {}-EMA",
            ind.ema_trend
        ),
        FilterKind::RsiZone => format!(
            "RSI above (long) or below (short) {}",
            config.tide.rsi_zone_level
        ),
    }
}

fn flag(kind: FilterKind) -> &'static str {
    match kind {
        FilterKind::Bollinger => "--bb",
        FilterKind::VolumeSpike => "--volume",
        FilterKind::Breakout => "--tlbo",
        FilterKind::TrendEma => "--trend-ema",
        FilterKind::RsiZone => "--rsi-zone",
    }
}

pub async fn run(config: &AppConfig) -> Result<()> {
    println!("Confirmation Filters");
    println!("═══════════════════════════════════════════════════════════");
    println!();
    println!(
        "  Tide: MACD rising/falling with RSI above/below {}",
        config.tide.rsi_threshold
    );
    println!();

    for &kind in FilterKind::all() {
        let state = if config.filters.is_enabled(kind) {
            "enabled"
        } else {
            "disabled"
        };
        println!("  {} ({}, {})", kind.label(), flag(kind), state);
        println!("  ───────────────────────────────────────────────────────");
        println!("  {}", describe(kind, config));
        println!();
    }

    println!("Use --double-screen for threshold 50 with EMA and RSI-Zone.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptions_follow_config() {
        let mut config = AppConfig::default();
        config.filters.volume_multiplier = 2.0;
        config.indicators.ema_trend = 100;

        assert_eq!(
            describe(FilterKind::VolumeSpike, &config),
            "Volume above 2x its 20-bar average"
        );
        assert!(describe(FilterKind::TrendEma, &config).contains("100-EMA"));
    }
}
