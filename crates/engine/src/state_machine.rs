//! Transport document state machine.
//!
//! Owns status transitions: validates the edge and its preconditions,
//! persists the document against the version read at entry (claiming the
//! transition ahead of any concurrent caller), then runs the ledger and
//! reconciler side effects the edge calls for and notifies interested
//! parties. Validation failures and version conflicts abort before any side
//! effect; allocation and reconciliation failures ride in the report while
//! the status still commits.

use chrono::Utc;
use tracing::{info, warn};

use waybill_core::{DocumentId, DomainError, ExpectedVersion, UserId};
use waybill_inventory::{AllocationToken, Batch, Reservation};
use waybill_orders::CustomerOrder;
use waybill_store::DocumentStore;
use waybill_transport::{TransportDocument, TransportStatus};

use crate::error::EngineError;
use crate::ledger::InventoryLedger;
use crate::notify::{Notification, NotificationSink};
use crate::outcome::TransitionReport;
use crate::reconciler::{ShipmentDirection, ShipmentReconciler};

pub struct TransportStateMachine<T, B, R, O, N> {
    documents: T,
    ledger: InventoryLedger<B, R>,
    reconciler: ShipmentReconciler<O>,
    notifier: N,
}

impl<T, B, R, O, N> TransportStateMachine<T, B, R, O, N>
where
    T: DocumentStore<TransportDocument>,
    B: DocumentStore<Batch>,
    R: DocumentStore<Reservation>,
    O: DocumentStore<CustomerOrder>,
    N: NotificationSink,
{
    pub fn new(
        documents: T,
        ledger: InventoryLedger<B, R>,
        reconciler: ShipmentReconciler<O>,
        notifier: N,
    ) -> Self {
        Self {
            documents,
            ledger,
            reconciler,
            notifier,
        }
    }

    /// Move a document to `new_status` on behalf of `actor`.
    ///
    /// The status persist runs first and carries the version read here, so a
    /// concurrent transition on the same document surfaces as
    /// `StoreError::Conflict` before the losing caller has touched the
    /// ledger or any order — only the winner applies side effects.
    pub fn change_status(
        &self,
        document_id: DocumentId,
        new_status: TransportStatus,
        actor: UserId,
        notify_users: &[UserId],
    ) -> Result<TransitionReport, EngineError> {
        let versioned = self
            .documents
            .get(&document_id)?
            .ok_or(DomainError::NotFound)?;

        let mut doc = versioned.doc;
        let from = doc.status;

        if !from.can_transition_to(new_status) {
            return Err(DomainError::validation(format!(
                "status transition {from} -> {new_status} is not defined"
            ))
            .into());
        }

        self.check_preconditions(&doc, from, new_status)?;

        let mut report = TransitionReport {
            document_id,
            document_number: doc.number.clone(),
            from,
            to: new_status,
            reservations_released: 0,
            allocation: None,
            reconciliation: None,
        };

        // Claim the transition: persist the new status against the version
        // read at entry. Side effects follow only when this write wins.
        doc.record_status_change(new_status, actor, Utc::now());
        self.documents
            .put(doc.clone(), ExpectedVersion::Exact(versioned.version))?;

        let token = AllocationToken::for_document(&doc.number, doc.id);

        use TransportStatus::*;
        match (from, new_status) {
            (Draft | Issued, InTransit) => {
                report.allocation = Some(self.ledger.reserve(&doc));
                report.reconciliation =
                    Some(self.reconciler.apply_shipment(&doc, ShipmentDirection::Apply));
            }
            (InTransit, Draft | Issued) => {
                report.reconciliation = Some(
                    self.reconciler
                        .apply_shipment(&doc, ShipmentDirection::Reverse),
                );
                // Known gap carried over from the original workflow: the
                // reversion leaves the document's reservations in place, so
                // stock stays locked with no shipment in progress.
                warn!(
                    document = %doc.number,
                    "reverted from transit without releasing reservations"
                );
            }
            (InTransit, Delivered) => {
                report.reservations_released = self.ledger.release(&token)?;
                report.allocation = Some(self.ledger.issue(&doc));
            }
            (InTransit, Canceled) => {
                report.reservations_released = self.ledger.release(&token)?;
                report.reconciliation = Some(
                    self.reconciler
                        .apply_shipment(&doc, ShipmentDirection::Reverse),
                );
            }
            (Draft | Issued, Canceled) => {
                // Nothing was reserved or reconciled yet; pure status change.
            }
            (Delivered, Completed) => {
                // Safety net; normally a no-op since Delivered already released.
                report.reservations_released = self.ledger.release(&token)?;
            }
            _ => {}
        }

        info!(
            document = %report.document_number,
            from = %from,
            to = %new_status,
            "transport document status changed"
        );

        self.send_notification(&report, notify_users);

        Ok(report)
    }

    fn check_preconditions(
        &self,
        doc: &TransportDocument,
        from: TransportStatus,
        to: TransportStatus,
    ) -> Result<(), EngineError> {
        // A document may not go out the door with no lines; Issued documents
        // can have had their lines edited away, so the check covers both
        // pre-transit states.
        if matches!(from, TransportStatus::Draft | TransportStatus::Issued)
            && to != TransportStatus::Canceled
        {
            doc.ensure_has_items()?;
        }

        if to == TransportStatus::InTransit {
            let missing = doc.items_missing_batch_links();
            if !missing.is_empty() {
                return Err(DomainError::validation(format!(
                    "line items without batch linkage: {}",
                    missing.join(", ")
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Fire-and-forget: delivery failures never roll back the transition.
    fn send_notification(&self, report: &TransitionReport, notify_users: &[UserId]) {
        if notify_users.is_empty() {
            return;
        }

        let notification = Notification {
            user_ids: notify_users.to_vec(),
            title: "Transport document status changed".to_string(),
            message: format!(
                "{}: {} -> {}",
                report.document_number, report.from, report.to
            ),
            entity_type: "transport_document".to_string(),
            entity_id: report.document_id.to_string(),
        };

        if let Err(e) = self.notifier.notify(notification) {
            warn!(document = %report.document_number, error = %e, "notification delivery failed");
        }
    }
}
