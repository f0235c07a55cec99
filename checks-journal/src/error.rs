use std::io;
use thiserror::Error;

/// Represents all possible errors that can occur when reading or writing an event journal
#[derive(Error, Debug)]
pub enum JournalError {
    /// IO errors that occur when reading/writing files
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An event was appended at or behind the journal head
    #[error("Event {sequence} is out of order, journal head is at {last:?}")]
    OutOfOrder { sequence: u64, last: Option<u64> },

    /// Stored hashes do not link up at this event
    #[error("Hash chain broken at event {0}")]
    ChainBroken(u64),

    /// The file ends partway through a frame
    #[error("Incomplete journal frame at byte {offset}")]
    TornFrame { offset: u64 },

    /// A thread panicked while holding the journal lock
    #[error("Journal lock poisoned: {0}")]
    Poisoned(String),

    /// Anyhow error wrapper for error context
    #[error(transparent)]
    Context(#[from] anyhow::Error),
}

impl From<bincode::Error> for JournalError {
    fn from(err: bincode::Error) -> Self {
        JournalError::Serialization(err.to_string())
    }
}
