use serde::{Deserialize, Serialize};

use checks_core::events::EventRecord;

use crate::error::JournalError;

/// blake3 digest linking journal entries
pub type EntryHash = [u8; 32];

/// `prev_hash` of the first entry in every journal
pub const GENESIS_HASH: EntryHash = [0; 32];

/// A persisted event, chained to the entry before it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub record: EventRecord,

    /// Wall clock time the entry was written, in milliseconds since the epoch
    pub recorded_at_ms: i64,

    pub prev_hash: EntryHash,

    /// blake3(prev_hash || sequence || recorded_at_ms || bincode(record))
    pub hash: EntryHash,
}

impl JournalEntry {
    pub fn compute_hash(
        prev_hash: &EntryHash,
        recorded_at_ms: i64,
        record: &EventRecord,
    ) -> Result<EntryHash, JournalError> {
        let encoded = bincode::serialize(record)?;

        let mut hasher = blake3::Hasher::new();
        hasher.update(prev_hash);
        hasher.update(&record.sequence.to_le_bytes());
        hasher.update(&recorded_at_ms.to_le_bytes());
        hasher.update(&encoded);
        Ok(*hasher.finalize().as_bytes())
    }

    /// Build the entry that follows `prev_hash`
    pub fn seal(record: EventRecord, prev_hash: EntryHash) -> Result<Self, JournalError> {
        let recorded_at_ms = chrono::Utc::now().timestamp_millis();
        let hash = Self::compute_hash(&prev_hash, recorded_at_ms, &record)?;
        Ok(Self {
            record,
            recorded_at_ms,
            prev_hash,
            hash,
        })
    }

    pub fn sequence(&self) -> u64 {
        self.record.sequence
    }
}

/// Tip of a hash chain: the last sequence seen and the hash to link to next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainHead {
    pub last_sequence: Option<u64>,
    pub last_hash: EntryHash,
}

impl Default for ChainHead {
    fn default() -> Self {
        Self {
            last_sequence: None,
            last_hash: GENESIS_HASH,
        }
    }
}

impl ChainHead {
    fn check_order(&self, sequence: u64) -> Result<(), JournalError> {
        match self.last_sequence {
            Some(last) if sequence <= last => Err(JournalError::OutOfOrder {
                sequence,
                last: self.last_sequence,
            }),
            _ => Ok(()),
        }
    }

    /// Seal `record` as the next entry without moving the head
    pub fn next_entry(&self, record: &EventRecord) -> Result<JournalEntry, JournalError> {
        self.check_order(record.sequence)?;
        JournalEntry::seal(record.clone(), self.last_hash)
    }

    /// Check that `entry` links onto this head, then move the head to it
    pub fn accept(&mut self, entry: &JournalEntry) -> Result<(), JournalError> {
        self.check_order(entry.sequence())?;
        if entry.prev_hash != self.last_hash
            || JournalEntry::compute_hash(&entry.prev_hash, entry.recorded_at_ms, &entry.record)? != entry.hash
        {
            return Err(JournalError::ChainBroken(entry.sequence()));
        }
        self.last_sequence = Some(entry.sequence());
        self.last_hash = entry.hash;
        Ok(())
    }
}

/// Append-only store for the ledger's event stream
pub trait EventJournal {
    /// Append one event record
    ///
    /// # Returns
    /// The sealed entry as written, or `OutOfOrder` if `record.sequence` is
    /// not past the last stored sequence
    fn append(&self, record: &EventRecord) -> Result<JournalEntry, JournalError>;

    /// All stored entries, oldest first
    fn entries(&self) -> Box<dyn Iterator<Item = Result<JournalEntry, JournalError>> + '_>;

    /// Sequence of the newest stored entry, if any
    fn last_sequence(&self) -> Result<Option<u64>, JournalError>;
}

/// Append every record from `events` that the journal has not stored yet.
///
/// Returns the number of records appended.
pub fn sync_from_log(
    journal: &impl EventJournal,
    events: &[EventRecord],
) -> Result<usize, JournalError> {
    let last = journal.last_sequence()?;
    let mut appended = 0;
    for record in events {
        if last.is_some_and(|last| record.sequence <= last) {
            continue;
        }
        journal.append(record)?;
        appended += 1;
    }
    if appended > 0 {
        log::debug!("Journal synced {} new events", appended);
    }
    Ok(appended)
}

/// Walk an entry stream and check every hash link. Returns the entry count.
pub fn verify_chain<I>(entries: I) -> Result<u64, JournalError>
where
    I: IntoIterator<Item = Result<JournalEntry, JournalError>>,
{
    let mut head = ChainHead::default();
    let mut count = 0;
    for entry in entries {
        head.accept(&entry?)?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use checks_core::events::LedgerEvent;
    use checks_core::id::Identity;

    fn record(sequence: u64) -> EventRecord {
        EventRecord {
            sequence,
            event: LedgerEvent::Transfer {
                from: Identity::NULL,
                to: Identity::new([3; 32]),
                token_id: sequence,
            },
        }
    }

    fn chain(len: u64) -> Vec<JournalEntry> {
        let mut head = ChainHead::default();
        (0..len)
            .map(|seq| {
                let entry = head.next_entry(&record(seq)).unwrap();
                head.accept(&entry).unwrap();
                entry
            })
            .collect()
    }

    #[test]
    fn test_first_entry_links_to_genesis() {
        let entries = chain(1);
        assert_eq!(entries[0].prev_hash, GENESIS_HASH);
        assert_ne!(entries[0].hash, GENESIS_HASH);
    }

    #[test]
    fn test_verify_chain_accepts_valid_chain() {
        let entries = chain(4);
        assert_eq!(verify_chain(entries.into_iter().map(Ok)).unwrap(), 4);
    }

    #[test]
    fn test_verify_chain_detects_tampering() {
        let mut entries = chain(3);
        if let LedgerEvent::Transfer { token_id, .. } = &mut entries[1].record.event {
            *token_id = 99;
        }

        let err = verify_chain(entries.into_iter().map(Ok)).unwrap_err();
        assert!(matches!(err, JournalError::ChainBroken(1)));
    }

    #[test]
    fn test_verify_chain_detects_rewritten_timestamp() {
        let mut entries = chain(3);
        entries[2].recorded_at_ms -= 60_000;

        let err = verify_chain(entries.into_iter().map(Ok)).unwrap_err();
        assert!(matches!(err, JournalError::ChainBroken(2)));
    }

    #[test]
    fn test_verify_chain_detects_missing_entry() {
        let mut entries = chain(3);
        entries.remove(1);

        let err = verify_chain(entries.into_iter().map(Ok)).unwrap_err();
        assert!(matches!(err, JournalError::ChainBroken(2)));
    }

    #[test]
    fn test_head_rejects_stale_sequence() {
        let entries = chain(2);
        let mut head = ChainHead::default();
        head.accept(&entries[0]).unwrap();
        head.accept(&entries[1]).unwrap();

        let err = head.next_entry(&record(1)).unwrap_err();
        assert!(matches!(
            err,
            JournalError::OutOfOrder {
                sequence: 1,
                last: Some(1)
            }
        ));
    }
}
