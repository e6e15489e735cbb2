//! Device registry: hot-plug reconciliation and event routing.
//!
//! The entry list (which owns the connections) is only touched under its
//! lock by the poll context. Facade reads go through an `ArcSwap` snapshot
//! so they never contend with reconciliation or with each other.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::device::DeviceState;
use crate::event::classify;
use crate::source::{DeliveryHandler, MidiSource};

struct DeviceEntry {
    // Declared before `state` so field drop order closes the connection
    // (stopping delivery synchronously) before the state unwinds.
    #[allow(dead_code)]
    connection: Box<dyn crate::source::InputConnection>,
    state: Arc<DeviceState>,
}

/// Registry of all attached input devices.
///
/// Insertion order is the host-visible index order; indices stay stable
/// between two reconcile passes unless the attached set changed.
pub struct DeviceRegistry {
    source: Box<dyn MidiSource>,
    dedup_window_ms: u64,
    entries: Mutex<Vec<DeviceEntry>>,
    snapshot: ArcSwap<Vec<Arc<DeviceState>>>,
}

impl DeviceRegistry {
    pub fn new(source: Box<dyn MidiSource>, dedup_window_ms: u64) -> Self {
        Self {
            source,
            dedup_window_ms,
            entries: Mutex::new(Vec::new()),
            snapshot: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Reconcile the registry against the live device set.
    ///
    /// New names get a device and a connection; registered names missing
    /// from the live set are detached (connection closed first, buffered
    /// undrained events discarded with the state). Idempotent; a pass with
    /// no change opens and closes nothing and keeps the snapshot as is.
    pub fn reconcile(&self) {
        let live = match self.source.enumerate() {
            Ok(names) => names,
            Err(e) => {
                // Registry left unchanged; the next poll retries.
                warn!("MIDI enumeration failed: {}", e);
                return;
            }
        };

        let mut entries = self.entries.lock();
        let mut changed = false;

        for name in &live {
            if entries.iter().any(|e| e.state.name() == name.as_str()) {
                continue;
            }
            let state = Arc::new(DeviceState::new(name.clone()));
            let handler: DeliveryHandler = {
                let state = Arc::clone(&state);
                let window = self.dedup_window_ms;
                Box::new(move |timestamp: u64, message: &[u8]| {
                    if let [status, rest @ ..] = message {
                        let data1 = rest.first().copied().unwrap_or(0);
                        let data2 = rest.get(1).copied().unwrap_or(0);
                        state.apply(classify(*status, data1, data2, timestamp), window);
                    }
                })
            };
            match self.source.connect(name, handler) {
                Ok(connection) => {
                    debug!("MIDI device attached: {}", name);
                    entries.push(DeviceEntry { state, connection });
                    changed = true;
                }
                Err(e) => {
                    // Not added this cycle; retried on the next reconcile.
                    warn!("MIDI device open failed for {}: {}", name, e);
                }
            }
        }

        entries.retain(|entry| {
            let present = live.iter().any(|n| n == entry.state.name());
            if !present {
                debug!("MIDI device detached: {}", entry.state.name());
                changed = true;
            }
            // Dropping the entry drops the connection first (field order),
            // stopping delivery before the state unwinds.
            present
        });

        if changed {
            let snapshot: Vec<Arc<DeviceState>> =
                entries.iter().map(|e| Arc::clone(&e.state)).collect();
            self.snapshot.store(Arc::new(snapshot));
        }
    }

    /// Number of registered devices as of the last reconcile.
    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.load().is_empty()
    }

    /// Bounds-checked lock-free lookup by host-visible index.
    pub fn device(&self, index: usize) -> Option<Arc<DeviceState>> {
        self.snapshot.load().get(index).cloned()
    }

    /// Detach every device: delivery stops, connections close, buffered
    /// events are discarded.
    pub fn shutdown(&self) {
        let mut entries = self.entries.lock();
        for entry in entries.iter() {
            debug!("MIDI device detached: {}", entry.state.name());
        }
        entries.clear();
        self.snapshot.store(Arc::new(Vec::new()));
    }
}

impl Drop for DeviceRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("devices", &self.len())
            .field("dedup_window_ms", &self.dedup_window_ms)
            .finish()
    }
}
