//! Per-device state: event buffers plus modal fields.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use crate::buffer::SwapBuffer;
use crate::event::{Decoded, KeyPress, KeyRelease};

/// Sentinel for "no patch change seen yet" (first one is always accepted).
const NO_PATCH_CHANGE: u64 = u64::MAX;

/// State of one attached input device.
///
/// The delivery callback for this device is the only writer of the modal
/// fields; the poll path only reads them. Each field is a single atomic
/// word, so `Relaxed` loads always observe a consistent value.
pub struct DeviceState {
    name: String,
    pub(crate) presses: SwapBuffer<KeyPress>,
    pub(crate) releases: SwapBuffer<KeyRelease>,
    instrument: AtomicU8,
    pitch_wheel: AtomicU8,
    control: [AtomicU8; 128],
    last_patch_change: AtomicU64,
}

impl DeviceState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            presses: SwapBuffer::new(),
            releases: SwapBuffer::new(),
            instrument: AtomicU8::new(0),
            pitch_wheel: AtomicU8::new(crate::PITCH_WHEEL_CENTER),
            control: std::array::from_fn(|_| AtomicU8::new(0)),
            last_patch_change: AtomicU64::new(NO_PATCH_CHANGE),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Route one classified message into this device's state.
    ///
    /// Runs on the delivery path: appends at most one event, never blocks
    /// beyond a buffer pair's O(1) swap critical section.
    pub fn apply(&self, decoded: Decoded, dedup_window_ms: u64) {
        match decoded {
            Decoded::Press(press) => self.presses.push(press),
            Decoded::Release(release) => self.releases.push(release),
            Decoded::Control { controller, value } => {
                if let Some(slot) = self.control.get(controller as usize) {
                    slot.store(value, Ordering::Relaxed);
                }
            }
            Decoded::PatchChange { program, timestamp } => {
                // Some drivers send the patch change twice back to back;
                // only the first message inside the window is authoritative.
                let last = self.last_patch_change.load(Ordering::Relaxed);
                if last != NO_PATCH_CHANGE && timestamp.wrapping_sub(last) < dedup_window_ms {
                    return;
                }
                self.instrument.store(program, Ordering::Relaxed);
                self.last_patch_change.store(timestamp, Ordering::Relaxed);
            }
            Decoded::PitchWheel { value } => self.pitch_wheel.store(value, Ordering::Relaxed),
            Decoded::Ignored => {}
        }
    }

    /// Current patch, 0-127.
    pub fn instrument(&self) -> u8 {
        self.instrument.load(Ordering::Relaxed)
    }

    /// Current pitch wheel position, 0-127, centered at 64.
    pub fn pitch_wheel(&self) -> u8 {
        self.pitch_wheel.load(Ordering::Relaxed)
    }

    /// Last value of one controller; 0 for controller numbers outside 0-127.
    pub fn control(&self, controller: usize) -> u8 {
        self.control
            .get(controller)
            .map(|slot| slot.load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for DeviceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceState")
            .field("name", &self.name)
            .field("instrument", &self.instrument())
            .field("pitch_wheel", &self.pitch_wheel())
            .finish()
    }
}
