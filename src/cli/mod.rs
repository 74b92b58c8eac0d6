//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tide")]
#[command(
    author,
    version,
    about = "Technical-signal scanner: tide trend, EMA crossovers and trade plans"
)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/tide.toml", env = "TIDE_CONFIG")]
    pub config: PathBuf,

    /// Log level (overrides the configured level)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the watchlist once
    Scan(ScanArgs),
    /// Scan on the market schedule until interrupted
    Watch(WatchArgs),
    /// Heikin-Ashi zone probability of past crossovers
    Probability(ProbabilityArgs),
    /// List confirmation filters
    Filters,
    /// Validate configuration
    ValidateConfig,
    /// Write a default configuration file
    InitConfig(InitConfigArgs),
}

#[derive(Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Summary,
    Json,
}

#[derive(clap::Args)]
pub struct ScanArgs {
    /// Symbols to scan instead of the configured watchlist (comma-separated)
    #[arg(short = 'S', long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Require close on the tide's side of the Bollinger mid-band
    #[arg(long)]
    pub bb: bool,

    /// Require a volume spike
    #[arg(long)]
    pub volume: bool,

    /// Require a trend-line breakout
    #[arg(long)]
    pub tlbo: bool,

    /// Require close on the tide's side of the trend EMA
    #[arg(long)]
    pub trend_ema: bool,

    /// Require RSI on the tide's side of the zone level
    #[arg(long)]
    pub rsi_zone: bool,

    /// Double-screen profile: threshold 50 with trend EMA and RSI zone
    #[arg(long)]
    pub double_screen: bool,

    /// RSI level separating long from short tides
    #[arg(long)]
    pub rsi_threshold: Option<f64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Send the result to Telegram
    #[arg(long)]
    pub notify: bool,

    /// Save the JSON report to a file
    #[arg(long)]
    pub save: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct WatchArgs {
    /// Print notifications instead of sending them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(clap::Args)]
pub struct ProbabilityArgs {
    /// Symbol to analyze
    #[arg(short, long, default_value = "^NSEI")]
    pub symbol: String,

    /// Lookback period (1mo, 6mo, 1y, 2y, 5y)
    #[arg(short, long, default_value = "2y")]
    pub period: String,

    /// Bar interval
    #[arg(short, long, default_value = "1d")]
    pub interval: String,
}

#[derive(clap::Args)]
pub struct InitConfigArgs {
    /// Where to write the file (defaults to --config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}
