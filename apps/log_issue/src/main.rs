use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use shared::{
    config::{load_settings, Settings},
    domain::LogRecord,
};
use storage::LogStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "log_issue",
    about = "Append one issue record to the direct-entry issue log"
)]
struct Cli {
    /// Log file to append to, instead of the configured direct log path.
    #[arg(long)]
    log_path: Option<PathBuf>,
    /// Settings file; defaults to ./issue_logger.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    category: String,
    issue_type: String,
    #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
    extra: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref()).context("failed to load settings")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&settings.log_filter))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let record = log_issue(&cli, &settings)?;
    println!(
        "Logged: {} - {} at {}",
        record.category, record.issue, record.timestamp
    );
    Ok(())
}

fn log_issue(cli: &Cli, settings: &Settings) -> Result<LogRecord> {
    if !cli.extra.is_empty() {
        warn!(ignored = ?cli.extra, "only the first two arguments are logged");
    }

    let path = cli
        .log_path
        .clone()
        .unwrap_or_else(|| settings.direct_log_path.clone());
    let store = LogStore::new(path, settings.id_policy);

    store
        .ensure_initialized()
        .with_context(|| format!("failed to initialize issue log '{}'", store.path().display()))?;
    let record = store
        .append(&cli.category, &cli.issue_type)
        .with_context(|| format!("failed to append to issue log '{}'", store.path().display()))?;

    info!(path = %store.path().display(), id = record.id, "issue logged");
    Ok(record)
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
