use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use waybill_core::UserId;

/// Transport document status lifecycle.
///
/// Persisted as the plain variant names (`"Draft"`, `"InTransit"`, ...).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportStatus {
    Draft,
    Issued,
    InTransit,
    Delivered,
    Completed,
    Canceled,
}

impl TransportStatus {
    /// Terminal states are retained for audit but accept no further edges.
    pub fn is_terminal(self) -> bool {
        matches!(self, TransportStatus::Completed | TransportStatus::Canceled)
    }

    /// The status edge table.
    ///
    /// Forward path: Draft → Issued → InTransit → Delivered → Completed.
    /// Draft may also jump straight to InTransit. Canceled is reachable from
    /// Draft, Issued and InTransit. InTransit may be manually reverted to
    /// Draft or Issued (side effects reversed by the engine).
    pub fn can_transition_to(self, to: TransportStatus) -> bool {
        use TransportStatus::*;
        matches!(
            (self, to),
            (Draft, Issued)
                | (Draft, InTransit)
                | (Draft, Canceled)
                | (Issued, InTransit)
                | (Issued, Canceled)
                | (InTransit, Delivered)
                | (InTransit, Draft)
                | (InTransit, Issued)
                | (InTransit, Canceled)
                | (Delivered, Completed)
        )
    }
}

impl core::fmt::Display for TransportStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            TransportStatus::Draft => "Draft",
            TransportStatus::Issued => "Issued",
            TransportStatus::InTransit => "InTransit",
            TransportStatus::Delivered => "Delivered",
            TransportStatus::Completed => "Completed",
            TransportStatus::Canceled => "Canceled",
        };
        f.write_str(s)
    }
}

/// Payment status of a transport document.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

/// Append-only payment status audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentStatusChange {
    pub from: PaymentStatus,
    pub to: PaymentStatus,
    pub actor: UserId,
    pub at: DateTime<Utc>,
}

/// Append-only status transition audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: TransportStatus,
    pub to: TransportStatus,
    pub actor: UserId,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use TransportStatus::*;

    #[test]
    fn forward_path_is_open() {
        assert!(Draft.can_transition_to(Issued));
        assert!(Issued.can_transition_to(InTransit));
        assert!(InTransit.can_transition_to(Delivered));
        assert!(Delivered.can_transition_to(Completed));
    }

    #[test]
    fn draft_may_skip_to_in_transit() {
        assert!(Draft.can_transition_to(InTransit));
    }

    #[test]
    fn in_transit_can_be_reverted_or_canceled() {
        assert!(InTransit.can_transition_to(Draft));
        assert!(InTransit.can_transition_to(Issued));
        assert!(InTransit.can_transition_to(Canceled));
    }

    #[test]
    fn terminal_states_accept_no_edges() {
        for to in [Draft, Issued, InTransit, Delivered, Completed, Canceled] {
            assert!(!Completed.can_transition_to(to));
            assert!(!Canceled.can_transition_to(to));
        }
        assert!(Completed.is_terminal());
        assert!(Canceled.is_terminal());
    }

    #[test]
    fn delivered_cannot_go_backwards() {
        assert!(!Delivered.can_transition_to(InTransit));
        assert!(!Delivered.can_transition_to(Canceled));
    }

    #[test]
    fn statuses_persist_as_plain_names() {
        assert_eq!(serde_json::to_string(&InTransit).unwrap(), "\"InTransit\"");
        assert_eq!(serde_json::to_string(&PaymentStatus::Unpaid).unwrap(), "\"Unpaid\"");
    }
}
