use std::sync::Mutex;

use checks_core::events::EventRecord;

use crate::error::JournalError;
use crate::journal_traits::{ChainHead, EventJournal, JournalEntry};

/// In-memory implementation of the event journal, for observers that do not need durability
#[derive(Default)]
pub struct InMemoryEventJournal {
    state: Mutex<(Vec<JournalEntry>, ChainHead)>,
}

impl InMemoryEventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, JournalError> {
        self.state
            .lock()
            .map(|state| state.0.len())
            .map_err(|e| JournalError::Poisoned(e.to_string()))
    }

    pub fn is_empty(&self) -> Result<bool, JournalError> {
        self.len().map(|len| len == 0)
    }
}

impl EventJournal for InMemoryEventJournal {
    fn append(&self, record: &EventRecord) -> Result<JournalEntry, JournalError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| JournalError::Poisoned(e.to_string()))?;
        let (entries, head) = &mut *state;

        let entry = head.next_entry(record)?;
        head.accept(&entry)?;
        entries.push(entry.clone());
        Ok(entry)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = Result<JournalEntry, JournalError>> + '_> {
        match self.state.lock() {
            Ok(state) => Box::new(state.0.clone().into_iter().map(Ok::<_, JournalError>)),
            Err(e) => Box::new(std::iter::once(Err(JournalError::Poisoned(e.to_string())))),
        }
    }

    fn last_sequence(&self) -> Result<Option<u64>, JournalError> {
        self.state
            .lock()
            .map(|state| state.1.last_sequence)
            .map_err(|e| JournalError::Poisoned(e.to_string()))
    }
}
