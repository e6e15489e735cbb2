//! Hardware MIDI input via midir.
//!
//! Requires the `midi-io` feature.

use midir::{MidiInput, MidiInputConnection};
use tracing::debug;

use crate::error::{Error, Result};
use crate::source::{DeliveryHandler, InputConnection, MidiSource};

/// Client name midir registers with the OS MIDI subsystem.
const CLIENT_NAME: &str = "midi-input-bridge";

/// [`MidiSource`] backed by midir.
///
/// Timestamps arrive from midir in microseconds and are forwarded to the
/// handler in milliseconds, matching the de-duplication window's units.
#[derive(Debug, Default)]
pub struct MidirSource;

impl MidirSource {
    pub fn new() -> Self {
        Self
    }
}

impl MidiSource for MidirSource {
    fn enumerate(&self) -> Result<Vec<String>> {
        let midi_in = MidiInput::new(CLIENT_NAME)?;
        let mut names = Vec::new();
        for port in midi_in.ports() {
            if let Ok(name) = midi_in.port_name(&port) {
                names.push(name);
            }
        }
        Ok(names)
    }

    fn connect(&self, name: &str, mut handler: DeliveryHandler) -> Result<Box<dyn InputConnection>> {
        let midi_in = MidiInput::new(CLIENT_NAME)?;
        // SysEx and realtime stay ignored (midir's default), so the handler
        // only sees channel messages.

        let ports = midi_in.ports();
        let port = ports
            .iter()
            .find(|p| midi_in.port_name(p).map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| Error::DeviceUnavailable(name.to_string()))?;

        let connection = midi_in.connect(
            port,
            CLIENT_NAME,
            move |stamp_us, message, _| {
                handler(stamp_us / 1_000, message);
            },
            (),
        )?;
        debug!("Connected MIDI input: {}", name);

        Ok(Box::new(MidirConnection {
            _connection: connection,
        }))
    }
}

/// Dropping closes the midir connection; midir's close is synchronous, so
/// no delivery runs once the drop returns.
struct MidirConnection {
    _connection: MidiInputConnection<()>,
}

impl InputConnection for MidirConnection {}
