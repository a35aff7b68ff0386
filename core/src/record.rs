//! Transaction records produced by committed pool mutations.
//!
//! A [`TicketRecord`] is created exactly once per successful `add` or
//! `retrieve`, inside the same critical section as the mutation it describes.
//! Its `remaining_after` is therefore always the pool size the mutation left
//! behind, and the records of a log form a total order over the pool's
//! trajectory.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of pool mutation a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Tickets released into the pool by a vendor
    #[serde(rename = "ADD")]
    Add,
    /// Tickets purchased out of the pool by a customer
    #[serde(rename = "RETRIEVE")]
    Retrieve,
}

impl ActionKind {
    /// Wire name used in exported transaction files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Retrieve => "RETRIEVE",
        }
    }

    /// Signed effect of `count` tickets of this kind on the pool size.
    #[must_use]
    pub fn signed(self, count: u32) -> i64 {
        match self {
            Self::Add => i64::from(count),
            Self::Retrieve => -i64::from(count),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one committed pool mutation.
///
/// Serialized with the field names `actionKind`, `actorName`, `count` and
/// `remainingAfter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRecord {
    action_kind: ActionKind,
    actor_name: String,
    count: u32,
    remaining_after: u32,
}

impl TicketRecord {
    /// Create a record.
    ///
    /// Only the pool creates records during a run; the constructor is public
    /// so sinks and tests can rebuild records read back from storage.
    #[must_use]
    pub fn new(
        action_kind: ActionKind,
        actor_name: impl Into<String>,
        count: u32,
        remaining_after: u32,
    ) -> Self {
        Self {
            action_kind,
            actor_name: actor_name.into(),
            count,
            remaining_after,
        }
    }

    /// Kind of mutation
    #[must_use]
    pub const fn action_kind(&self) -> ActionKind {
        self.action_kind
    }

    /// Name of the vendor or customer that performed the mutation
    #[must_use]
    pub fn actor_name(&self) -> &str {
        &self.actor_name
    }

    /// Number of tickets moved
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Pool size immediately after the mutation
    #[must_use]
    pub const fn remaining_after(&self) -> u32 {
        self.remaining_after
    }

    /// Signed change this record applied to the pool size.
    #[must_use]
    pub fn delta(&self) -> i64 {
        self.action_kind.signed(self.count)
    }
}

impl fmt::Display for TicketRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} x{} (remaining {})",
            self.actor_name, self.action_kind, self.count, self.remaining_after
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_export_field_names() {
        let record = TicketRecord::new(ActionKind::Add, "Vendor-1", 7, 17);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["actionKind"], "ADD");
        assert_eq!(json["actorName"], "Vendor-1");
        assert_eq!(json["count"], 7);
        assert_eq!(json["remainingAfter"], 17);
    }

    #[test]
    fn test_delta_sign_follows_action_kind() {
        assert_eq!(TicketRecord::new(ActionKind::Add, "V", 4, 4).delta(), 4);
        assert_eq!(TicketRecord::new(ActionKind::Retrieve, "C", 3, 1).delta(), -3);
    }

    #[test]
    fn test_retrieve_parses_from_wire_name() {
        let record: TicketRecord = serde_json::from_str(
            r#"{"actionKind":"RETRIEVE","actorName":"Customer-2","count":2,"remainingAfter":0}"#,
        )
        .unwrap();

        assert_eq!(record.action_kind(), ActionKind::Retrieve);
        assert_eq!(record.actor_name(), "Customer-2");
    }
}
