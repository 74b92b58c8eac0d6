//! Write a default configuration file.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use tide_config::AppConfig;

/// Sample symbols written into a fresh config file.
const SAMPLE_WATCHLIST: &[&str] = &[
    "RELIANCE.NS",
    "TCS.NS",
    "HDFCBANK.NS",
    "ICICIBANK.NS",
    "INFY.NS",
    "SBIN.NS",
    "ITC.NS",
    "LT.NS",
    "M&M.NS",
    "TATASTEEL.NS",
];

fn template() -> AppConfig {
    let mut config = AppConfig::default();
    config.scan.watchlist = SAMPLE_WATCHLIST.iter().map(|s| s.to_string()).collect();
    config
}

pub async fn run(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let rendered = template().to_toml()?;
    fs::write(path, rendered).with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
