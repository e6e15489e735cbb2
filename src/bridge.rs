//! The poll facade the host calls into.
//!
//! Every query validates its indices and returns a documented sentinel on
//! out-of-range input (empty string for names, 0 for numeric fields, 64
//! for the pitch wheel). Nothing here panics or returns an error to the
//! host.

use std::sync::Arc;

use crate::error::Result;
use crate::registry::DeviceRegistry;
use crate::source::MidiSource;

/// Poll-driven view over all attached MIDI input devices.
///
/// Clone is cheap (Arc internally). Dropping the last clone detaches every
/// device and stops delivery.
#[derive(Clone, Debug)]
pub struct MidiInputBridge {
    registry: Arc<DeviceRegistry>,
}

impl MidiInputBridge {
    pub fn builder() -> MidiInputBridgeBuilder {
        MidiInputBridgeBuilder::default()
    }

    /// Number of attached devices.
    ///
    /// This is the reconciliation trigger: the live device set is
    /// re-scanned before counting, so the host's polling cadence controls
    /// hot-plug detection latency. All other queries read the set as of
    /// the last call here.
    pub fn device_count(&self) -> usize {
        self.registry.reconcile();
        self.registry.len()
    }

    /// Device name, or an empty string for an invalid index. The returned
    /// string is owned; later calls never invalidate it.
    pub fn device_name(&self, device: usize) -> String {
        self.registry
            .device(device)
            .map(|d| d.name().to_string())
            .unwrap_or_default()
    }

    /// Move detected key presses into the readable buffer and return how
    /// many there are. Presses left unread from the previous drain are
    /// discarded.
    pub fn drain_presses(&self, device: usize) -> usize {
        self.registry
            .device(device)
            .map(|d| d.presses.drain())
            .unwrap_or(0)
    }

    /// Note of a drained key press, 0 if either index is invalid.
    pub fn press_note(&self, device: usize, event: usize) -> u8 {
        self.registry
            .device(device)
            .and_then(|d| d.presses.get(event))
            .map(|p| p.note)
            .unwrap_or(0)
    }

    /// Velocity of a drained key press, 0 if either index is invalid.
    pub fn press_velocity(&self, device: usize, event: usize) -> u8 {
        self.registry
            .device(device)
            .and_then(|d| d.presses.get(event))
            .map(|p| p.velocity)
            .unwrap_or(0)
    }

    /// Timestamp (ms) of a drained key press, 0 if either index is invalid.
    pub fn press_timestamp(&self, device: usize, event: usize) -> u64 {
        self.registry
            .device(device)
            .and_then(|d| d.presses.get(event))
            .map(|p| p.timestamp)
            .unwrap_or(0)
    }

    /// Move detected key releases into the readable buffer and return how
    /// many there are.
    pub fn drain_releases(&self, device: usize) -> usize {
        self.registry
            .device(device)
            .map(|d| d.releases.drain())
            .unwrap_or(0)
    }

    /// Note of a drained key release, 0 if either index is invalid.
    pub fn release_note(&self, device: usize, event: usize) -> u8 {
        self.registry
            .device(device)
            .and_then(|d| d.releases.get(event))
            .map(|r| r.note)
            .unwrap_or(0)
    }

    /// Timestamp (ms) of a drained key release, 0 if either index is
    /// invalid.
    pub fn release_timestamp(&self, device: usize, event: usize) -> u64 {
        self.registry
            .device(device)
            .and_then(|d| d.releases.get(event))
            .map(|r| r.timestamp)
            .unwrap_or(0)
    }

    /// Current patch of a device, 0 if the index is invalid.
    pub fn instrument(&self, device: usize) -> u8 {
        self.registry
            .device(device)
            .map(|d| d.instrument())
            .unwrap_or(0)
    }

    /// Current pitch wheel position, centered (64) if the index is invalid.
    pub fn pitch_wheel(&self, device: usize) -> u8 {
        self.registry
            .device(device)
            .map(|d| d.pitch_wheel())
            .unwrap_or(crate::PITCH_WHEEL_CENTER)
    }

    /// Last value seen for one controller; 0 for an invalid device index
    /// or a controller number outside 0-127.
    pub fn control(&self, device: usize, controller: usize) -> u8 {
        self.registry
            .device(device)
            .map(|d| d.control(controller))
            .unwrap_or(0)
    }

    /// Detach every device now instead of waiting for the last clone to
    /// drop.
    pub fn shutdown(&self) {
        self.registry.shutdown();
    }
}

/// Builder for [`MidiInputBridge`].
pub struct MidiInputBridgeBuilder {
    dedup_window_ms: u64,
    source: Option<Box<dyn MidiSource>>,
}

impl Default for MidiInputBridgeBuilder {
    fn default() -> Self {
        Self {
            dedup_window_ms: crate::DEFAULT_PATCH_DEDUP_WINDOW_MS,
            source: None,
        }
    }
}

impl MidiInputBridgeBuilder {
    /// De-duplication window for patch-change messages, in milliseconds on
    /// the source clock. The 100 ms default matches drivers observed to
    /// send the message twice back to back; tune per device if needed.
    pub fn patch_dedup_window_ms(mut self, window_ms: u64) -> Self {
        self.dedup_window_ms = window_ms;
        self
    }

    /// Substitute the MIDI subsystem, e.g. a scripted source in tests.
    /// Defaults to hardware input via midir (`midi-io` feature).
    pub fn source(mut self, source: Box<dyn MidiSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Build the bridge. No devices are scanned yet; the first
    /// [`MidiInputBridge::device_count`] call runs the initial scan.
    pub fn build(self) -> Result<MidiInputBridge> {
        let source = match self.source {
            Some(source) => source,
            None => default_source()?,
        };
        Ok(MidiInputBridge {
            registry: Arc::new(DeviceRegistry::new(source, self.dedup_window_ms)),
        })
    }
}

#[cfg(feature = "midi-io")]
fn default_source() -> Result<Box<dyn MidiSource>> {
    Ok(Box::new(crate::io::MidirSource::new()))
}

#[cfg(not(feature = "midi-io"))]
fn default_source() -> Result<Box<dyn MidiSource>> {
    Err(crate::error::Error::InvalidConfig(
        "no MIDI source: enable the midi-io feature or provide one via source()".into(),
    ))
}
