//! Append-only annotation history.
//!
//! Every mutation that actually changes a record appends a before/after
//! snapshot pair. The log is only ever appended to; it is recorded for
//! audit purposes and never replayed by this system.

use serde::{Deserialize, Serialize};

use crate::model::AnnotationRecord;

/// An immutable before/after snapshot of one record mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Record state before the mutation.
    pub before: AnnotationRecord,
    /// Record state after the mutation.
    pub after: AnnotationRecord,
}

/// The in-memory history log.
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log from previously persisted entries.
    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        Self { entries }
    }

    /// Append a snapshot pair if the mutation changed anything.
    ///
    /// Returns `true` if an entry was appended, `false` if `before` and
    /// `after` are identical.
    pub fn record(&mut self, before: AnnotationRecord, after: AnnotationRecord) -> bool {
        if before == after {
            return false;
        }
        log::debug!(
            "history: recorded change for {}/{} ({} entries)",
            after.video_id,
            after.frame_id,
            self.entries.len() + 1
        );
        self.entries.push(HistoryEntry { before, after });
        true
    }

    /// All entries in append order.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Number of recorded mutations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_appends_on_change() {
        let mut log = HistoryLog::new();
        let before = AnnotationRecord::new("v1", "001", 1);
        let mut after = before.clone();
        after.seen = true;

        assert!(log.record(before.clone(), after.clone()));
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].before, before);
        assert_eq!(log.entries()[0].after, after);
    }

    #[test]
    fn test_record_skips_unchanged() {
        let mut log = HistoryLog::new();
        let record = AnnotationRecord::new("v1", "001", 1);

        assert!(!log.record(record.clone(), record));
        assert!(log.is_empty());
    }
}
