//! Tide scanner CLI application.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use tide_config::AppConfig;
use tide_monitor::setup_logging;
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config commands work on the file itself, so they start from defaults.
    let (config, found) = match cli.command {
        Commands::ValidateConfig | Commands::InitConfig(_) => (AppConfig::default(), true),
        _ => cli::commands::common::load_app_config(&cli.config)?,
    };

    // Setup logging
    let log_level = cli
        .log_level
        .map(|level| level.as_str().to_string())
        .unwrap_or_else(|| config.logging.level.clone());
    let _guard = setup_logging(
        &log_level,
        cli.json_logs || config.logging.is_json(),
        config.logging.directory.as_deref().map(Path::new),
    );

    if !found {
        warn!(path = %cli.config.display(), "Config file not found, using defaults");
    }

    // Execute command
    match cli.command {
        Commands::Scan(args) => cli::commands::scan::run(args, config).await,
        Commands::Watch(args) => cli::commands::watch::run(args, config).await,
        Commands::Probability(args) => cli::commands::probability::run(args, config).await,
        Commands::Filters => cli::commands::filters::run(&config).await,
        Commands::ValidateConfig => cli::commands::validate::run(&cli.config).await,
        Commands::InitConfig(args) => {
            let path = args.output.unwrap_or_else(|| cli.config.clone());
            cli::commands::init_config::run(&path, args.force).await
        }
    }
}
