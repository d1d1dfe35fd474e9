use std::{thread, time::Duration};

use shared::domain::KeyEvent;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

#[cfg(feature = "streamdeck")]
mod streamdeck;
#[cfg(feature = "streamdeck")]
pub use streamdeck::StreamDeckConnector;

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("no button deck found")]
    NotFound,
    #[error("no button deck backend compiled in; rebuild with the `streamdeck` feature")]
    BackendUnavailable,
    #[error("button deck backend error: {0}")]
    Backend(String),
}

/// An opened grid-button device.
pub trait ButtonDeck: Send {
    /// Display brightness in percent, 0..=100.
    fn set_brightness(&mut self, percent: u8) -> anyhow::Result<()>;

    /// Waits up to `timeout` for the next key report. Returns the pressed
    /// flag of every key when the device reported a change, `None` otherwise.
    fn read_key_states(&mut self, timeout: Duration) -> anyhow::Result<Option<Vec<bool>>>;

    fn describe(&self) -> String;
}

pub trait DeckConnector {
    fn open_first(&self) -> Result<Box<dyn ButtonDeck>, DeckError>;
}

/// Connector used when no hardware backend is compiled in.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableConnector;

impl DeckConnector for UnavailableConnector {
    fn open_first(&self) -> Result<Box<dyn ButtonDeck>, DeckError> {
        warn!("built without the `streamdeck` feature; no device backend available");
        Err(DeckError::BackendUnavailable)
    }
}

#[cfg(feature = "streamdeck")]
pub fn default_connector() -> Box<dyn DeckConnector> {
    Box::new(StreamDeckConnector)
}

#[cfg(not(feature = "streamdeck"))]
pub fn default_connector() -> Box<dyn DeckConnector> {
    Box::new(UnavailableConnector)
}

/// Turns full key-state reports into individual edge events.
#[derive(Debug, Default, Clone)]
pub struct KeyStateTracker {
    previous: Vec<bool>,
}

impl KeyStateTracker {
    /// Events for every key whose state differs from the last report, in
    /// ascending slot order.
    pub fn update(&mut self, states: &[bool]) -> Vec<KeyEvent> {
        if self.previous.len() < states.len() {
            self.previous.resize(states.len(), false);
        }

        let mut events = Vec::new();
        for (index, (&now, before)) in states.iter().zip(self.previous.iter_mut()).enumerate() {
            if now == *before {
                continue;
            }
            *before = now;
            let Ok(slot) = u8::try_from(index) else {
                continue;
            };
            events.push(if now {
                KeyEvent::pressed(slot)
            } else {
                KeyEvent::released(slot)
            });
        }
        events
    }
}

/// Reads `deck` on a dedicated thread and forwards key events in order.
///
/// The thread ends cleanly once the receiving side is dropped, or with the
/// read error when the device fails (which also closes the channel).
pub fn spawn_event_pump(
    mut deck: Box<dyn ButtonDeck>,
    events: mpsc::Sender<KeyEvent>,
    poll_interval: Duration,
) -> std::io::Result<thread::JoinHandle<anyhow::Result<()>>> {
    thread::Builder::new()
        .name("deck-reader".into())
        .spawn(move || {
            let mut tracker = KeyStateTracker::default();
            loop {
                if events.is_closed() {
                    debug!("event receiver dropped; stopping deck reader");
                    return Ok(());
                }

                let states = match deck.read_key_states(poll_interval) {
                    Ok(Some(states)) => states,
                    Ok(None) => continue,
                    Err(err) => {
                        error!(device = %deck.describe(), error = %err, "deck read failed");
                        return Err(err);
                    }
                };

                for event in tracker.update(&states) {
                    if events.blocking_send(event).is_err() {
                        return Ok(());
                    }
                }
            }
        })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
