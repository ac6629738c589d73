//! Result payloads for ledger, reconciler and state-machine operations.
//!
//! Partial failures are data: a transition commits with a report of what
//! could not be allocated or matched, and the caller decides about retries.

use serde::Serialize;

use waybill_core::{DocumentId, OrderId};
use waybill_transport::TransportStatus;

/// Summary counters for one reserve/issue pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AllocationStats {
    pub success_count: u32,
    pub error_count: u32,
    pub total_attempted: u32,
}

/// One batch-level allocation failure (insufficient stock, missing batch, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationFailure {
    pub item_description: String,
    pub batch_number: String,
    pub reason: String,
}

/// Outcome of a reserve or issue pass over a whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AllocationOutcome {
    pub stats: AllocationStats,
    pub failures: Vec<AllocationFailure>,
}

impl AllocationOutcome {
    pub(crate) fn record_success(&mut self) {
        self.stats.success_count += 1;
        self.stats.total_attempted += 1;
    }

    pub(crate) fn record_failure(&mut self, failure: AllocationFailure) {
        self.stats.error_count += 1;
        self.stats.total_attempted += 1;
        self.failures.push(failure);
    }
}

/// Non-fatal findings from a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ReconciliationWarning {
    /// No strategy matched the transport line item on this order.
    Unmatched {
        order_id: OrderId,
        item_description: String,
    },
    /// An explicit order-line reference no longer resolves; the item was
    /// recovered through fallback matching.
    StaleReference {
        order_id: OrderId,
        item_description: String,
    },
    /// A linked order could not be loaded.
    OrderNotFound { order_id: OrderId },
    /// An order was reconciled in memory but could not be persisted.
    OrderPersistFailed { order_id: OrderId, reason: String },
}

/// Outcome of one reconciliation pass over a document's linked orders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileOutcome {
    /// Count of line-item applications that reached an order line.
    pub applied: u32,
    pub warnings: Vec<ReconciliationWarning>,
}

/// Everything a completed status transition reports back to its caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionReport {
    pub document_id: DocumentId,
    pub document_number: String,
    pub from: TransportStatus,
    pub to: TransportStatus,
    /// Reservations released (Delivered / Canceled-from-transit / Completed).
    pub reservations_released: u32,
    pub allocation: Option<AllocationOutcome>,
    pub reconciliation: Option<ReconcileOutcome>,
}
