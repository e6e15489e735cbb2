//! Integration tests for midi-input-bridge.
//!
//! These exercise the full poll surface over a scripted source, without
//! hardware MIDI devices: hot-plug reconciliation, event drain/read, modal
//! state, and the sentinel contract.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use midi_input_bridge::{
    DeliveryHandler, Error, InputConnection, MidiInputBridge, MidiSource, Result,
};

// ---------------------------------------------------------------------------
// Scripted source
// ---------------------------------------------------------------------------

/// A MIDI subsystem scripted from the test body: the live device list is
/// set explicitly, and `send` plays a raw message into whatever handler is
/// currently subscribed for a device.
#[derive(Clone)]
struct MockMidi {
    inner: Arc<MockInner>,
}

struct MockInner {
    live: Mutex<Vec<String>>,
    handlers: Mutex<HashMap<String, Arc<Mutex<DeliveryHandler>>>>,
}

impl MockMidi {
    fn new(names: &[&str]) -> Self {
        Self {
            inner: Arc::new(MockInner {
                live: Mutex::new(names.iter().map(|s| s.to_string()).collect()),
                handlers: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn set_live(&self, names: &[&str]) {
        *self.inner.live.lock() = names.iter().map(|s| s.to_string()).collect();
    }

    /// Deliver one raw message as the hardware subsystem would. A message
    /// for a device with no open connection is dropped, like hardware
    /// talking to nobody.
    fn send(&self, device: &str, timestamp_ms: u64, bytes: &[u8]) {
        let handler = self.inner.handlers.lock().get(device).cloned();
        if let Some(handler) = handler {
            let mut guard = handler.lock();
            (&mut **guard)(timestamp_ms, bytes);
        }
    }
}

impl MidiSource for MockMidi {
    fn enumerate(&self) -> Result<Vec<String>> {
        Ok(self.inner.live.lock().clone())
    }

    fn connect(&self, name: &str, handler: DeliveryHandler) -> Result<Box<dyn InputConnection>> {
        if !self.inner.live.lock().iter().any(|n| n == name) {
            return Err(Error::DeviceUnavailable(name.to_string()));
        }
        self.inner
            .handlers
            .lock()
            .insert(name.to_string(), Arc::new(Mutex::new(handler)));
        Ok(Box::new(MockConnection {
            name: name.to_string(),
            inner: Arc::clone(&self.inner),
        }))
    }
}

struct MockConnection {
    name: String,
    inner: Arc<MockInner>,
}

impl InputConnection for MockConnection {}

impl Drop for MockConnection {
    fn drop(&mut self) {
        // Synchronous close: no delivery once this returns.
        self.inner.handlers.lock().remove(&self.name);
    }
}

fn bridge_with(source: &MockMidi) -> MidiInputBridge {
    MidiInputBridge::builder()
        .source(Box::new(source.clone()))
        .build()
        .unwrap()
}

// ---------------------------------------------------------------------------
// 1. End-to-end press/release flow
// ---------------------------------------------------------------------------

#[test]
fn test_press_then_release_end_to_end() {
    let midi = MockMidi::new(&["SynthA"]);
    let bridge = bridge_with(&midi);

    assert_eq!(bridge.device_count(), 1);
    assert_eq!(bridge.device_name(0), "SynthA");

    midi.send("SynthA", 10, &[0x90, 60, 100]);
    midi.send("SynthA", 25, &[0x80, 60, 0]);

    assert_eq!(bridge.drain_presses(0), 1);
    assert_eq!(bridge.press_note(0, 0), 60);
    assert_eq!(bridge.press_velocity(0, 0), 100);
    assert_eq!(bridge.press_timestamp(0, 0), 10);

    assert_eq!(bridge.drain_releases(0), 1);
    assert_eq!(bridge.release_note(0, 0), 60);
    assert_eq!(bridge.release_timestamp(0, 0), 25);

    // No new messages: a second drain yields nothing.
    assert_eq!(bridge.drain_presses(0), 0);
    assert_eq!(bridge.press_note(0, 0), 0);
}

#[test]
fn test_zero_velocity_note_on_drains_as_release() {
    let midi = MockMidi::new(&["SynthA"]);
    let bridge = bridge_with(&midi);
    bridge.device_count();

    midi.send("SynthA", 5, &[0x90, 72, 0]);

    assert_eq!(bridge.drain_presses(0), 0);
    assert_eq!(bridge.drain_releases(0), 1);
    assert_eq!(bridge.release_note(0, 0), 72);
}

#[test]
fn test_drain_preserves_order_across_many_events() {
    let midi = MockMidi::new(&["SynthA"]);
    let bridge = bridge_with(&midi);
    bridge.device_count();

    for i in 0..32u8 {
        midi.send("SynthA", i as u64, &[0x90, i, 1 + i]);
    }

    assert_eq!(bridge.drain_presses(0), 32);
    for i in 0..32usize {
        assert_eq!(bridge.press_note(0, i), i as u8);
        assert_eq!(bridge.press_velocity(0, i), 1 + i as u8);
        assert_eq!(bridge.press_timestamp(0, i), i as u64);
    }
}

// ---------------------------------------------------------------------------
// 2. Modal state
// ---------------------------------------------------------------------------

#[test]
fn test_controller_values() {
    let midi = MockMidi::new(&["SynthA"]);
    let bridge = bridge_with(&midi);
    bridge.device_count();

    midi.send("SynthA", 0, &[0xB0, 7, 90]);

    assert_eq!(bridge.control(0, 7), 90);
    assert_eq!(bridge.control(0, 8), 0);
    assert_eq!(bridge.control(0, 128), 0, "out-of-range controller");
}

#[test]
fn test_pitch_wheel_and_instrument() {
    let midi = MockMidi::new(&["SynthA"]);
    let bridge = bridge_with(&midi);
    bridge.device_count();

    assert_eq!(bridge.pitch_wheel(0), 64, "centered on attach");

    midi.send("SynthA", 0, &[0xE0, 0, 96]);
    midi.send("SynthA", 0, &[0xC0, 12]);

    assert_eq!(bridge.pitch_wheel(0), 96);
    assert_eq!(bridge.instrument(0), 12);
}

#[test]
fn test_patch_change_dedup_respects_configured_window() {
    let midi = MockMidi::new(&["SynthA"]);
    let bridge = MidiInputBridge::builder()
        .source(Box::new(midi.clone()))
        .patch_dedup_window_ms(200)
        .build()
        .unwrap();
    bridge.device_count();

    midi.send("SynthA", 1_000, &[0xC0, 10]);
    midi.send("SynthA", 1_150, &[0xC0, 20]); // inside the widened window
    assert_eq!(bridge.instrument(0), 10);

    midi.send("SynthA", 1_250, &[0xC0, 30]);
    assert_eq!(bridge.instrument(0), 30);
}

// ---------------------------------------------------------------------------
// 3. Hot-plug / hot-unplug
// ---------------------------------------------------------------------------

#[test]
fn test_hot_plug_visible_after_next_count() {
    let midi = MockMidi::new(&["SynthA"]);
    let bridge = bridge_with(&midi);
    assert_eq!(bridge.device_count(), 1);

    midi.set_live(&["SynthA", "SynthB"]);

    // Accessors read the last reconciled set.
    assert_eq!(bridge.device_name(1), "");

    assert_eq!(bridge.device_count(), 2);
    assert_eq!(bridge.device_name(0), "SynthA");
    assert_eq!(bridge.device_name(1), "SynthB");
}

#[test]
fn test_hot_unplug_discards_buffered_events() {
    let midi = MockMidi::new(&["SynthA", "SynthB"]);
    let bridge = bridge_with(&midi);
    assert_eq!(bridge.device_count(), 2);

    // Buffered but never drained.
    midi.send("SynthA", 0, &[0x90, 60, 100]);

    midi.set_live(&["SynthB"]);
    assert_eq!(bridge.device_count(), 1);

    // Index 0 now refers to SynthB, freshly reconciled, with no events.
    assert_eq!(bridge.device_name(0), "SynthB");
    assert_eq!(bridge.drain_presses(0), 0);
    assert_eq!(bridge.device_name(1), "");

    // Delivery for the detached device hits a closed connection.
    midi.send("SynthA", 1, &[0x90, 61, 100]);
    assert_eq!(bridge.drain_presses(0), 0);
}

#[test]
fn test_reconcile_idempotent_keeps_state() {
    let midi = MockMidi::new(&["SynthA", "SynthB"]);
    let bridge = bridge_with(&midi);
    bridge.device_count();

    midi.send("SynthA", 0, &[0xB0, 1, 64]);
    midi.send("SynthA", 0, &[0xC0, 9]);

    // Repeated polling with an unchanged live set.
    for _ in 0..5 {
        assert_eq!(bridge.device_count(), 2);
    }
    assert_eq!(bridge.device_name(0), "SynthA");
    assert_eq!(bridge.device_name(1), "SynthB");
    assert_eq!(bridge.control(0, 1), 64);
    assert_eq!(bridge.instrument(0), 9);
}

#[test]
fn test_replug_starts_from_fresh_state() {
    let midi = MockMidi::new(&["SynthA"]);
    let bridge = bridge_with(&midi);
    bridge.device_count();

    midi.send("SynthA", 0, &[0xC0, 42]);
    assert_eq!(bridge.instrument(0), 42);

    midi.set_live(&[]);
    assert_eq!(bridge.device_count(), 0);
    midi.set_live(&["SynthA"]);
    assert_eq!(bridge.device_count(), 1);

    // A re-attached device gets attach-time defaults again.
    assert_eq!(bridge.instrument(0), 0);
    assert_eq!(bridge.pitch_wheel(0), 64);
}

// ---------------------------------------------------------------------------
// 4. Sentinel contract
// ---------------------------------------------------------------------------

#[test]
fn test_invalid_device_index_sentinels() {
    let midi = MockMidi::new(&["SynthA"]);
    let bridge = bridge_with(&midi);
    bridge.device_count();

    for bad in [1usize, 7, usize::MAX] {
        assert_eq!(bridge.device_name(bad), "");
        assert_eq!(bridge.drain_presses(bad), 0);
        assert_eq!(bridge.press_note(bad, 0), 0);
        assert_eq!(bridge.press_velocity(bad, 0), 0);
        assert_eq!(bridge.press_timestamp(bad, 0), 0);
        assert_eq!(bridge.drain_releases(bad), 0);
        assert_eq!(bridge.release_note(bad, 0), 0);
        assert_eq!(bridge.release_timestamp(bad, 0), 0);
        assert_eq!(bridge.instrument(bad), 0);
        assert_eq!(bridge.pitch_wheel(bad), 64);
        assert_eq!(bridge.control(bad, 7), 0);
    }
}

#[test]
fn test_invalid_queries_do_not_disturb_state() {
    let midi = MockMidi::new(&["SynthA"]);
    let bridge = bridge_with(&midi);
    bridge.device_count();

    midi.send("SynthA", 0, &[0x90, 60, 100]);
    let _ = bridge.drain_presses(99);
    let _ = bridge.press_note(99, 0);

    // The buffered press is still waiting on the real device.
    assert_eq!(bridge.drain_presses(0), 1);
    assert_eq!(bridge.press_note(0, 0), 60);
}

#[test]
fn test_event_index_out_of_range() {
    let midi = MockMidi::new(&["SynthA"]);
    let bridge = bridge_with(&midi);
    bridge.device_count();

    midi.send("SynthA", 3, &[0x90, 60, 100]);
    assert_eq!(bridge.drain_presses(0), 1);
    assert_eq!(bridge.press_note(0, 1), 0);
    assert_eq!(bridge.press_timestamp(0, usize::MAX), 0);
}

// ---------------------------------------------------------------------------
// 5. Teardown
// ---------------------------------------------------------------------------

#[test]
fn test_shutdown_closes_all_connections() {
    let midi = MockMidi::new(&["SynthA", "SynthB"]);
    let bridge = bridge_with(&midi);
    assert_eq!(bridge.device_count(), 2);

    bridge.shutdown();
    assert_eq!(bridge.device_name(0), "");

    // Handlers were unsubscribed, so delivery goes nowhere.
    assert!(midi.inner.handlers.lock().is_empty());
}
