//! Poll-driven MIDI input bridge.
//!
//! Lets a polling host observe live MIDI input (note on/off, control change,
//! patch change, pitch wheel) from every attached input device without
//! subscribing to hardware callbacks itself. The hardware callback appends
//! into per-device detect buffers; the host drains them on its own schedule.
//!
//! ## Quick Start
//!
//! ```ignore
//! use midi_input_bridge::MidiInputBridge;
//!
//! let bridge = MidiInputBridge::builder().build()?;
//!
//! // Poll loop. device_count() also reconciles against the live device
//! // set, so polling cadence controls hot-plug detection latency.
//! for dev in 0..bridge.device_count() {
//!     let pressed = bridge.drain_presses(dev);
//!     for i in 0..pressed {
//!         println!(
//!             "{}: note {} vel {}",
//!             bridge.device_name(dev),
//!             bridge.press_note(dev, i),
//!             bridge.press_velocity(dev, i),
//!         );
//!     }
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `midi-io` (default) - hardware input via midir

pub mod error;
pub use error::{Error, Result};

mod event;
pub use event::{classify, Decoded, KeyPress, KeyRelease};

mod buffer;
pub use buffer::SwapBuffer;

mod device;
pub use device::DeviceState;

mod source;
pub use source::{DeliveryHandler, InputConnection, MidiSource};

#[cfg(feature = "midi-io")]
mod io;
#[cfg(feature = "midi-io")]
pub use io::MidirSource;

mod registry;
pub use registry::DeviceRegistry;

mod bridge;
pub use bridge::{MidiInputBridge, MidiInputBridgeBuilder};

/// Pitch wheel center position, also the sentinel for invalid queries.
pub const PITCH_WHEEL_CENTER: u8 = 64;

/// Default patch-change de-duplication window in milliseconds.
///
/// Some drivers emit the same patch change twice back to back; only the
/// first message inside this window is applied.
pub const DEFAULT_PATCH_DEDUP_WINDOW_MS: u64 = 100;
