use std::time::Duration;

use anyhow::anyhow;
use elgato_streamdeck::{info::Kind, list_devices, new_hidapi, StreamDeck, StreamDeckInput};
use tracing::info;

use crate::{ButtonDeck, DeckConnector, DeckError};

/// Opens the first Elgato Stream Deck visible over HID.
#[derive(Debug, Default, Clone, Copy)]
pub struct StreamDeckConnector;

struct StreamDeckDevice {
    deck: StreamDeck,
    kind: Kind,
    serial: String,
}

impl DeckConnector for StreamDeckConnector {
    fn open_first(&self) -> Result<Box<dyn ButtonDeck>, DeckError> {
        let hid = new_hidapi().map_err(|err| DeckError::Backend(err.to_string()))?;
        let (kind, serial) = list_devices(&hid)
            .into_iter()
            .next()
            .ok_or(DeckError::NotFound)?;

        let deck = StreamDeck::connect(&hid, kind, &serial)
            .map_err(|err| DeckError::Backend(format!("{err:?}")))?;
        info!(?kind, %serial, "opened stream deck");

        Ok(Box::new(StreamDeckDevice { deck, kind, serial }))
    }
}

impl ButtonDeck for StreamDeckDevice {
    fn set_brightness(&mut self, percent: u8) -> anyhow::Result<()> {
        self.deck
            .set_brightness(percent)
            .map_err(|err| anyhow!("failed to set brightness to {percent}%: {err:?}"))
    }

    fn read_key_states(&mut self, timeout: Duration) -> anyhow::Result<Option<Vec<bool>>> {
        let input = self
            .deck
            .read_input(Some(timeout))
            .map_err(|err| anyhow!("failed to read stream deck input: {err:?}"))?;

        Ok(match input {
            StreamDeckInput::ButtonStateChange(states) => Some(states),
            _ => None,
        })
    }

    fn describe(&self) -> String {
        format!("{:?} ({})", self.kind, self.serial)
    }
}
