use crate::id::Identity;
use crate::record::TokenId;
use crate::roles::Role;
use serde::{Deserialize, Serialize};

/// Audit event written on every successful state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// `account` gained `role`, granted by `sender`
    RoleGranted {
        role: Role,
        account: Identity,
        sender: Identity,
    },
    /// `account` lost `role`, revoked by `sender`
    RoleRevoked {
        role: Role,
        account: Identity,
        sender: Identity,
    },
    /// Ownership of a token moved. Mints are transfers from the null identity.
    Transfer {
        from: Identity,
        to: Identity,
        token_id: TokenId,
    },
}

/// An event together with its position in the stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Dense sequence number starting at 0
    pub sequence: u64,

    pub event: LedgerEvent,
}

/// Receiver for events emitted by ledger components
pub trait EventSink {
    fn emit(&mut self, event: LedgerEvent);
}

/// Append-only, in-memory event stream owned by a contract instance
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in emission order
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records with a sequence number greater than or equal to `sequence`
    pub fn since(&self, sequence: u64) -> &[EventRecord] {
        let start = usize::try_from(sequence)
            .unwrap_or(usize::MAX)
            .min(self.records.len());
        &self.records[start..]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sequence number the next record will receive
    pub fn next_sequence(&self) -> u64 {
        self.records.len() as u64
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: LedgerEvent) {
        let sequence = self.next_sequence();
        self.records.push(EventRecord { sequence, event });
    }
}

impl EventSink for Vec<LedgerEvent> {
    fn emit(&mut self, event: LedgerEvent) {
        self.push(event);
    }
}
