//! Event types and the protocol decoder.
//!
//! `classify` maps one raw status/data byte triple to a typed event. It is
//! pure and allocation-free; applying the result to device state (including
//! patch-change de-duplication) happens in [`crate::device`].

/// A key press observed on one device.
///
/// Timestamps are milliseconds on the source clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub note: u8,
    pub velocity: u8,
    pub timestamp: u64,
}

/// A key release observed on one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRelease {
    pub note: u8,
    pub timestamp: u64,
}

/// Result of classifying one raw MIDI message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    Press(KeyPress),
    Release(KeyRelease),
    Control { controller: u8, value: u8 },
    /// Candidate only: the device applies its de-duplication window before
    /// accepting the program as the current instrument.
    PatchChange { program: u8, timestamp: u64 },
    PitchWheel { value: u8 },
    /// Status codes outside the handled set (SysEx, aftertouch, realtime).
    Ignored,
}

/// Classify one raw `(status, data1, data2)` triple.
///
/// A note-on with zero velocity is a release per MIDI convention, so it
/// classifies as `Release`, never `Press`.
pub fn classify(status: u8, data1: u8, data2: u8, timestamp: u64) -> Decoded {
    let mut code = (status >> 4) & 0x0F;
    if code == 9 && data2 == 0 {
        code = 8;
    }
    match code {
        8 => Decoded::Release(KeyRelease {
            note: data1,
            timestamp,
        }),
        9 => Decoded::Press(KeyPress {
            note: data1,
            velocity: data2,
            timestamp,
        }),
        11 => Decoded::Control {
            controller: data1,
            value: data2,
        },
        12 => Decoded::PatchChange {
            program: data1,
            timestamp,
        },
        14 => Decoded::PitchWheel { value: data2 },
        _ => Decoded::Ignored,
    }
}
