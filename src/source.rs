//! Seam to the operating-system MIDI subsystem.
//!
//! The registry talks to hardware only through [`MidiSource`], so tests can
//! substitute a scripted source and drive hot-plug and message delivery
//! without devices attached.

use crate::error::Result;

/// Callback invoked once per raw message on the source's delivery thread.
///
/// Arguments are the timestamp in milliseconds on the source clock and the
/// raw message bytes (status byte first).
pub type DeliveryHandler = Box<dyn FnMut(u64, &[u8]) + Send>;

/// An open connection to one input device.
///
/// Dropping the connection closes it: the close is synchronous (no delivery
/// runs after drop returns) and ownership guarantees it happens exactly
/// once.
pub trait InputConnection: Send {}

/// Enumerates live input devices and opens connections to them.
///
/// Device names are the reconciliation key: a name must identify the same
/// physical device across `enumerate` calls for as long as it stays
/// attached. Raw numeric handles are not assumed stable.
pub trait MidiSource: Send + Sync {
    /// Names of all currently attached input devices.
    fn enumerate(&self) -> Result<Vec<String>>;

    /// Open a connection to the named device, subscribing `handler` for
    /// message delivery. Fails with [`crate::Error::DeviceUnavailable`]
    /// when the name no longer resolves to hardware.
    fn connect(&self, name: &str, handler: DeliveryHandler) -> Result<Box<dyn InputConnection>>;
}
