//! Error types for the bridge.
//!
//! Only the source seam (enumeration, connection) and the builder return
//! `Result`. The poll-facing query surface is total: out-of-range input
//! yields a documented sentinel, never an error.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The descriptor no longer resolves to hardware, or the connection
    /// could not be opened. Reconciliation retries on the next pass.
    #[error("MIDI device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The underlying MIDI subsystem could not be initialized.
    #[error("MIDI source init failed: {0}")]
    SourceInit(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

#[cfg(feature = "midi-io")]
impl From<midir::InitError> for Error {
    fn from(e: midir::InitError) -> Self {
        Error::SourceInit(e.to_string())
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::ConnectError<midir::MidiInput>> for Error {
    fn from(e: midir::ConnectError<midir::MidiInput>) -> Self {
        Error::DeviceUnavailable(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
