//! Checks: an access-controlled, append-only token issuance ledger
//!
//! This crate re-exports all the components of the Checks system.

pub use checks_core::*;
pub use checks_ledger::*;

pub use checks_journal::{
    sync_from_log, verify_chain, ChainHead, EntryHash, EventJournal, FileEventJournal,
    InMemoryEventJournal, JournalEntry, JournalError, GENESIS_HASH, MAX_FRAME_LEN,
};
