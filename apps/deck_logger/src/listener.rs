use std::future::Future;

use shared::{
    catalog::Catalog,
    domain::KeyEvent,
    selection::{Outcome, SelectionMachine, SelectionSink},
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListenerSummary {
    pub logged: usize,
    pub failed: usize,
}

/// Feeds device events through the machine one at a time until `shutdown`
/// resolves or the event stream ends. Append failures are reported and the
/// loop keeps going.
pub async fn run<S>(
    mut machine: SelectionMachine,
    mut sink: S,
    mut events: mpsc::Receiver<KeyEvent>,
    shutdown: impl Future<Output = ()>,
) -> ListenerSummary
where
    S: SelectionSink,
{
    let mut summary = ListenerSummary::default();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
            event = events.recv() => {
                let Some(event) = event else {
                    warn!("deck event stream ended");
                    break;
                };
                report(machine.process(event, &mut sink), &mut summary);
            }
        }
    }

    summary
}

fn report(outcome: Outcome, summary: &mut ListenerSummary) {
    match outcome {
        Outcome::Ignored => {}
        Outcome::CategorySelected(category) => {
            println!("Category selected: {category}. Now select the issue.");
        }
        Outcome::Cancelled => println!("Return to category selection."),
        Outcome::Logged(record) => {
            summary.logged += 1;
            info!(id = record.id, category = %record.category, issue = %record.issue, "issue logged");
            println!(
                "Logged: {} - {} at {}",
                record.category, record.issue, record.timestamp
            );
            println!("Issue logged. Ready for next input.");
        }
        Outcome::LogFailed { selection, error } => {
            summary.failed += 1;
            error!(
                category = %selection.category,
                issue = %selection.issue,
                error = %format!("{error:#}"),
                "failed to log issue"
            );
            println!(
                "Could not log {} - {}: {error:#}. Select a category to try again.",
                selection.category, selection.issue
            );
        }
    }
}

/// Operator-facing description of the category keys.
pub fn layout_lines(catalog: &Catalog) -> Vec<String> {
    let mut lines: Vec<String> = catalog
        .categories()
        .map(|entry| format!("  key {:>2}: {}", entry.slot, entry.category))
        .collect();
    lines.push("  after choosing a category, key 0 returns to category selection".into());
    lines
}

#[cfg(test)]
#[path = "tests/listener_tests.rs"]
mod tests;
