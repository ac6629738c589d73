//! Inventory ledger: reserve, release, issue.
//!
//! Reservations are holds grouped by the document's allocation token; an
//! issue is the permanent deduction performed on delivery. Both spread a line
//! item's declared quantity across its linked batches proportionally to the
//! availability recorded at link time.

use chrono::Utc;
use tracing::debug;

use waybill_core::{BatchId, ExpectedVersion, ReservationId};
use waybill_inventory::{
    proportional_split, AllocationToken, Batch, Reservation, ReservationMethod,
};
use waybill_store::{DocumentStore, StoreError};
use waybill_transport::{BatchAllocation, TransportDocument};

use crate::outcome::{AllocationFailure, AllocationOutcome};

pub struct InventoryLedger<B, R> {
    batches: B,
    reservations: R,
}

impl<B, R> InventoryLedger<B, R>
where
    B: DocumentStore<Batch>,
    R: DocumentStore<Reservation>,
{
    pub fn new(batches: B, reservations: R) -> Self {
        Self {
            batches,
            reservations,
        }
    }

    /// Create reservations for every line item of `doc`.
    ///
    /// Per-batch failures (insufficient stock, missing batch, store faults)
    /// are collected into the outcome; sibling allocations proceed.
    pub fn reserve(&self, doc: &TransportDocument) -> AllocationOutcome {
        let token = AllocationToken::for_document(&doc.number, doc.id);
        let mut outcome = AllocationOutcome::default();

        self.for_each_share(doc, &mut outcome, |ledger, allocation, share| {
            ledger.reserve_share(&token, allocation, share)
        });

        outcome
    }

    /// Delete every reservation carrying `token`. Idempotent; returns the
    /// number of reservations removed.
    pub fn release(&self, token: &AllocationToken) -> Result<u32, StoreError> {
        let held = self
            .reservations
            .query(&|r| r.allocation_token == *token, None)?;

        let mut released = 0;
        for versioned in &held {
            if self.reservations.delete(&versioned.doc.id)? {
                released += 1;
            }
        }

        debug!(token = %token, released, "released reservations");
        Ok(released)
    }

    /// Permanently deduct stock for every line item of `doc`.
    ///
    /// Mirrors `reserve`'s proportional split; used only on delivery. Each
    /// line item is attempted independently.
    pub fn issue(&self, doc: &TransportDocument) -> AllocationOutcome {
        let mut outcome = AllocationOutcome::default();

        self.for_each_share(doc, &mut outcome, |ledger, allocation, share| {
            ledger.issue_share(allocation, share)
        });

        outcome
    }

    /// Walk every (line item, batch, share) triple of the document.
    ///
    /// Line items without batch links or with a non-positive declared
    /// quantity are skipped; shares that compute to ≤ 0 are dropped by the
    /// split itself.
    fn for_each_share(
        &self,
        doc: &TransportDocument,
        outcome: &mut AllocationOutcome,
        mut op: impl FnMut(&Self, &BatchAllocation, f64) -> Result<(), String>,
    ) {
        for item in &doc.items {
            if item.linked_batches.is_empty() || item.quantity <= 0.0 {
                continue;
            }

            let weights: Vec<(BatchId, f64)> = item
                .linked_batches
                .iter()
                .map(|a| (a.batch_id, a.quantity))
                .collect();

            for (batch_id, share) in proportional_split(item.quantity, &weights) {
                let Some(allocation) = item
                    .linked_batches
                    .iter()
                    .find(|a| a.batch_id == batch_id)
                else {
                    continue;
                };

                match op(self, allocation, share) {
                    Ok(()) => outcome.record_success(),
                    Err(reason) => outcome.record_failure(AllocationFailure {
                        item_description: item.description.clone(),
                        batch_number: allocation.batch_number.clone(),
                        reason,
                    }),
                }
            }
        }
    }

    fn reserve_share(
        &self,
        token: &AllocationToken,
        allocation: &BatchAllocation,
        share: f64,
    ) -> Result<(), String> {
        let batch = self
            .batches
            .get(&allocation.batch_id)
            .map_err(|e| format!("store failure: {e}"))?
            .ok_or_else(|| format!("batch {} not found", allocation.batch_number))?;

        // Active holds count against availability: Σ reservations ≤ available.
        let already_held: f64 = self
            .reservations
            .query(&|r| r.batch_id == allocation.batch_id, None)
            .map_err(|e| format!("store failure: {e}"))?
            .iter()
            .map(|v| v.doc.quantity)
            .sum();

        if already_held + share > batch.doc.available_quantity {
            return Err(format!(
                "insufficient stock: requested {share}, available {} with {already_held} already reserved",
                batch.doc.available_quantity
            ));
        }

        let reservation = Reservation {
            id: ReservationId::new(),
            allocation_token: token.clone(),
            product_id: allocation.product_id,
            batch_id: allocation.batch_id,
            warehouse_id: allocation.warehouse_id,
            quantity: share,
            method: ReservationMethod::Automatic,
            reserved_at: Utc::now(),
        };

        self.reservations
            .put(reservation, ExpectedVersion::Exact(0))
            .map_err(|e| format!("store failure: {e}"))?;

        Ok(())
    }

    fn issue_share(&self, allocation: &BatchAllocation, share: f64) -> Result<(), String> {
        let versioned = self
            .batches
            .get(&allocation.batch_id)
            .map_err(|e| format!("store failure: {e}"))?
            .ok_or_else(|| format!("batch {} not found", allocation.batch_number))?;

        let mut batch = versioned.doc;
        batch.deduct(share).map_err(|e| e.to_string())?;

        self.batches
            .put(batch, ExpectedVersion::Exact(versioned.version))
            .map_err(|e| format!("store failure: {e}"))?;

        Ok(())
    }
}
