use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use deck_integration::{default_connector, spawn_event_pump, DeckError};
use shared::{config::load_settings, selection::SelectionMachine};
use storage::LogStore;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod listener;

const EVENT_QUEUE_DEPTH: usize = 64;

#[derive(Parser, Debug)]
#[command(about = "Log issues by pressing a category key, then an issue key, on a Stream Deck")]
struct Args {
    /// Settings file; defaults to ./issue_logger.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = load_settings(args.config.as_deref()).context("failed to load settings")?;
    init_tracing(&settings.log_filter);

    let catalog = settings.catalog().context("failed to load key catalog")?;
    let store = LogStore::new(&settings.live_log_path, settings.id_policy);
    store.ensure_initialized().with_context(|| {
        format!(
            "failed to initialize issue log '{}'",
            settings.live_log_path.display()
        )
    })?;
    info!(path = %store.path().display(), id_policy = ?store.id_policy(), "issue log ready");

    let mut deck = match default_connector().open_first() {
        Ok(deck) => deck,
        Err(DeckError::NotFound) => {
            println!("No Stream Deck found!");
            bail!("no stream deck found");
        }
        Err(DeckError::BackendUnavailable) => {
            println!("Stream Deck support is not built in; rebuild with --features streamdeck");
            bail!("stream deck backend unavailable");
        }
        Err(err) => return Err(err).context("failed to open stream deck"),
    };
    println!("Stream Deck connected!");
    info!(device = %deck.describe(), "stream deck connected");

    deck.set_brightness(settings.brightness)
        .context("failed to set stream deck brightness")?;
    for line in listener::layout_lines(&catalog) {
        println!("{line}");
    }

    let (tx, rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let pump = spawn_event_pump(deck, tx, Duration::from_millis(settings.poll_interval_ms))
        .context("failed to start stream deck reader")?;
    println!("Listening for button presses... (Ctrl-C to exit)");

    let machine = SelectionMachine::new(catalog);
    let summary = listener::run(machine, store, rx, shutdown_signal()).await;
    info!(
        logged = summary.logged,
        failed = summary.failed,
        "deck logger stopped"
    );

    match tokio::task::spawn_blocking(move || pump.join()).await? {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(err.context("stream deck stopped responding")),
        Err(_) => bail!("stream deck reader thread panicked"),
    }
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "failed to listen for Ctrl-C; running until the device disconnects");
        std::future::pending::<()>().await;
    }
}
