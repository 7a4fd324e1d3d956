use std::{borrow::Cow, collections::VecDeque};

use alloy_primitives::Address;
use candid::{CandidType, Decode, Encode};
use chrono::DateTime;
use ic_stable_structures::{storable::Bound, Storable};
use serde::Deserialize;

use crate::{access::Operation, utils::error::VaultResult};

/// Category of a journal entry
#[derive(Clone, Copy, CandidType, Debug, Deserialize, PartialEq, Eq)]
pub enum LogType {
    Info,
    /// Outcome of a public vault operation
    Operation,
    /// Pause, unpause and panic
    Emergency,
}

/// Journal entry
#[derive(Clone, CandidType, Debug, Deserialize, PartialEq)]
pub struct JournalEntry {
    /// Denominated in seconds
    pub timestamp: u64,
    pub entry: VaultResult<()>,
    pub log_type: LogType,
    pub operation: Option<Operation>,
    pub actor: Option<String>,
    pub note: Option<String>,
}

/// Builder for journal entries
impl JournalEntry {
    /// Create a new instance of a journal entry
    /// Fills the `timestamp`, `entry` and `log_type` fields
    pub fn new(timestamp: u64, entry: VaultResult<()>, log_type: LogType) -> Self {
        Self {
            timestamp,
            entry,
            log_type,
            operation: None,
            actor: None,
            note: None,
        }
    }

    /// Fills the `operation` field of the entry
    pub fn operation(&mut self, operation: Operation) -> &mut Self {
        self.operation = Some(operation);
        self
    }

    /// Fills the `actor` field of the entry
    pub fn actor(&mut self, actor: &Address) -> &mut Self {
        self.actor = Some(actor.to_string());
        self
    }

    /// Fills the `note` field of the entry
    pub fn note<S: AsRef<str>>(&mut self, text: S) -> &mut Self {
        self.note = Some(text.as_ref().to_string());
        self
    }

    /// Emits the entry as a tracing event and appends it to the journal
    pub fn commit(&mut self, journal: &mut Journal) {
        self.trace();
        journal.push(self.clone());
    }

    fn trace(&self) {
        let time = DateTime::from_timestamp(self.timestamp as i64, 0)
            .map(|time| time.to_rfc3339())
            .unwrap_or_default();
        let actor = self.actor.as_deref().unwrap_or("-");
        let note = self.note.as_deref().unwrap_or("");

        match &self.entry {
            Ok(()) => tracing::info!(
                time = %time,
                log_type = ?self.log_type,
                operation = ?self.operation,
                actor,
                "{}",
                note
            ),
            Err(error) => tracing::warn!(
                time = %time,
                log_type = ?self.log_type,
                operation = ?self.operation,
                actor,
                %error,
                "{}",
                note
            ),
        }
    }
}

impl Storable for JournalEntry {
    fn to_bytes(&self) -> Cow<[u8]> {
        Cow::Owned(Encode!(self).expect("journal entries are always candid encodable"))
    }

    fn from_bytes(bytes: Cow<[u8]>) -> Self {
        Decode!(bytes.as_ref(), Self).expect("journal entry bytes were produced by to_bytes")
    }

    const BOUND: Bound = Bound::Unbounded;
}

/// Bounded in-memory journal. The oldest entries are dropped once it is full.
#[derive(Clone, Debug)]
pub struct Journal {
    entries: VecDeque<JournalEntry>,
    capacity: usize,
}

impl Journal {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, entry: JournalEntry) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn entries(&self) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::VaultError;

    #[test]
    fn builder_fills_fields() {
        let actor = Address::repeat_byte(0x11);
        let mut entry = JournalEntry::new(42, Err(VaultError::Unauthorized), LogType::Emergency);
        entry
            .operation(Operation::Pause)
            .actor(&actor)
            .note("Pause rejected.");

        assert_eq!(entry.timestamp, 42);
        assert_eq!(entry.entry, Err(VaultError::Unauthorized));
        assert_eq!(entry.operation, Some(Operation::Pause));
        assert_eq!(entry.actor, Some(actor.to_string()));
        assert_eq!(entry.note.as_deref(), Some("Pause rejected."));
    }

    #[test]
    fn journal_drops_oldest_entries() {
        let mut journal = Journal::new(2);
        for timestamp in 0..3 {
            JournalEntry::new(timestamp, Ok(()), LogType::Info).commit(&mut journal);
        }

        let timestamps: Vec<u64> = journal.entries().map(|entry| entry.timestamp).collect();
        assert_eq!(timestamps, vec![1, 2]);
    }

    #[test]
    fn entries_survive_stable_encoding() {
        let mut entry = JournalEntry::new(7, Err(VaultError::CapExceeded), LogType::Operation);
        entry.operation(Operation::Deposit).note("Deposit of 10 rejected.");

        let decoded = JournalEntry::from_bytes(entry.to_bytes());
        assert_eq!(decoded, entry);
    }
}
