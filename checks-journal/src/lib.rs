pub mod error;
pub mod file_journal;
pub mod journal_traits;
pub mod memory_journal;

// Re-export the main types for convenience
pub use error::JournalError;
pub use file_journal::{FileEventJournal, MAX_FRAME_LEN};
pub use journal_traits::{
    sync_from_log, verify_chain, ChainHead, EntryHash, EventJournal, JournalEntry, GENESIS_HASH,
};
pub use memory_journal::InMemoryEventJournal;
