//! Append-only transaction log.
//!
//! The log has no lock of its own. It lives inside the pool's critical
//! section next to the ticket count, so appending a record and updating the
//! count are one atomic step and insertion order equals commit order.
//!
//! # Replay
//!
//! Because every record carries the pool size it left behind, a log can be
//! checked against the pool it came from: starting at the initial count,
//! applying each record's delta in order must land exactly on that record's
//! `remaining_after`. [`replay`] performs that check and returns the final
//! count.

use crate::record::{ActionKind, TicketRecord};
use thiserror::Error;

/// Errors found while replaying a transaction log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    /// A record's `remaining_after` does not match the replayed count.
    #[error("record {index} ({actor}) expected remaining {expected}, recorded {recorded}")]
    Diverged {
        /// Position of the record in the log
        index: usize,
        /// Actor that produced the record
        actor: String,
        /// Count obtained by replaying up to and including this record
        expected: i64,
        /// Count stored in the record
        recorded: u32,
    },

    /// A record drove the replayed count outside `[0, capacity]`.
    #[error("record {index} drove the pool to {value}, outside [0, {capacity}]")]
    OutOfBounds {
        /// Position of the record in the log
        index: usize,
        /// Replayed count after applying the record
        value: i64,
        /// Pool capacity
        capacity: u32,
    },
}

/// Ordered, append-only sequence of [`TicketRecord`]s.
#[derive(Debug, Clone, Default)]
pub struct TransactionLog {
    records: Vec<TicketRecord>,
}

impl TransactionLog {
    /// Create an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Append a record. Records are never reordered or removed.
    pub fn append(&mut self, record: TicketRecord) {
        self.records.push(record);
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no mutation has been committed yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over records in commit order.
    pub fn iter(&self) -> std::slice::Iter<'_, TicketRecord> {
        self.records.iter()
    }

    /// Most recently committed record
    #[must_use]
    pub fn last(&self) -> Option<&TicketRecord> {
        self.records.last()
    }

    /// Independent copy of the records as of now.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TicketRecord> {
        self.records.clone()
    }

    /// Sum of ADD counts minus sum of RETRIEVE counts.
    #[must_use]
    pub fn net_change(&self) -> i64 {
        net_change(&self.records)
    }

    /// Total tickets moved by records of `kind`.
    #[must_use]
    pub fn total(&self, kind: ActionKind) -> u64 {
        self.records
            .iter()
            .filter(|record| record.action_kind() == kind)
            .map(|record| u64::from(record.count()))
            .sum()
    }
}

impl<'a> IntoIterator for &'a TransactionLog {
    type Item = &'a TicketRecord;
    type IntoIter = std::slice::Iter<'a, TicketRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Sum of ADD counts minus sum of RETRIEVE counts over `records`.
#[must_use]
pub fn net_change(records: &[TicketRecord]) -> i64 {
    records.iter().map(TicketRecord::delta).sum()
}

/// Replay `records` from `initial` and verify every `remaining_after`.
///
/// Returns the final replayed count.
///
/// # Errors
///
/// Returns [`ReplayError::OutOfBounds`] if a record would push the count
/// outside `[0, capacity]`, or [`ReplayError::Diverged`] if a record's
/// `remaining_after` differs from the replayed value.
pub fn replay(initial: u32, capacity: u32, records: &[TicketRecord]) -> Result<u32, ReplayError> {
    let mut current = i64::from(initial);

    for (index, record) in records.iter().enumerate() {
        current += record.delta();

        if current < 0 || current > i64::from(capacity) {
            return Err(ReplayError::OutOfBounds {
                index,
                value: current,
                capacity,
            });
        }

        if current != i64::from(record.remaining_after()) {
            return Err(ReplayError::Diverged {
                index,
                actor: record.actor_name().to_string(),
                expected: current,
                recorded: record.remaining_after(),
            });
        }
    }

    // Bounds were checked against a u32 capacity above.
    Ok(u32::try_from(current).unwrap_or(capacity))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<TicketRecord> {
        vec![
            TicketRecord::new(ActionKind::Add, "Vendor-1", 5, 15),
            TicketRecord::new(ActionKind::Retrieve, "Customer-1", 3, 12),
            TicketRecord::new(ActionKind::Add, "Vendor-2", 8, 20),
        ]
    }

    #[test]
    fn test_append_preserves_order() {
        let mut log = TransactionLog::new();
        for record in sample() {
            log.append(record);
        }

        let actors: Vec<_> = log.iter().map(TicketRecord::actor_name).collect();
        assert_eq!(actors, ["Vendor-1", "Customer-1", "Vendor-2"]);
        assert_eq!(log.len(), 3);
        assert_eq!(log.last().map(TicketRecord::remaining_after), Some(20));
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut log = TransactionLog::new();
        log.append(TicketRecord::new(ActionKind::Add, "Vendor-1", 1, 1));
        let snapshot = log.snapshot();

        log.append(TicketRecord::new(ActionKind::Add, "Vendor-1", 1, 2));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_totals_and_net_change() {
        let mut log = TransactionLog::new();
        for record in sample() {
            log.append(record);
        }

        assert_eq!(log.total(ActionKind::Add), 13);
        assert_eq!(log.total(ActionKind::Retrieve), 3);
        assert_eq!(log.net_change(), 10);
    }

    #[test]
    fn test_replay_reaches_final_count() {
        assert_eq!(replay(10, 20, &sample()), Ok(20));
        assert_eq!(replay(7, 7, &[]), Ok(7));
    }

    #[test]
    fn test_replay_detects_divergence() {
        let records = vec![
            TicketRecord::new(ActionKind::Add, "Vendor-1", 5, 5),
            TicketRecord::new(ActionKind::Retrieve, "Customer-1", 2, 4),
        ];

        assert_eq!(
            replay(0, 10, &records),
            Err(ReplayError::Diverged {
                index: 1,
                actor: "Customer-1".to_string(),
                expected: 3,
                recorded: 4,
            })
        );
    }

    #[test]
    fn test_replay_detects_out_of_bounds() {
        let records = vec![TicketRecord::new(ActionKind::Retrieve, "Customer-1", 2, 0)];

        assert!(matches!(
            replay(1, 10, &records),
            Err(ReplayError::OutOfBounds { index: 0, value: -1, .. })
        ));
    }
}
