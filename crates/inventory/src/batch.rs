use serde::{Deserialize, Serialize};

use waybill_core::{BatchId, DomainError, DomainResult, Entity, ProductId, WarehouseId};
use waybill_store::Document;

/// A traceable lot of stock for one product at one warehouse.
///
/// `available_quantity` is the physical on-hand figure; reservations against
/// the batch are held separately in the ledger and never mutate this field.
/// Only a permanent issue (delivery) deducts here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub batch_number: String,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub available_quantity: f64,
    pub unit: String,
}

impl Batch {
    /// Permanently deduct `quantity` from the batch.
    pub fn deduct(&mut self, quantity: f64) -> DomainResult<()> {
        if quantity < 0.0 {
            return Err(DomainError::validation("deduction cannot be negative"));
        }
        if quantity > self.available_quantity {
            return Err(DomainError::invariant(format!(
                "insufficient stock on batch {}: requested {quantity}, available {}",
                self.batch_number, self.available_quantity
            )));
        }
        self.available_quantity -= quantity;
        Ok(())
    }
}

impl Entity for Batch {
    type Id = BatchId;

    fn id(&self) -> &BatchId {
        &self.id
    }
}

impl Document for Batch {
    type Id = BatchId;
    const COLLECTION: &'static str = "inventory_batches";

    fn document_id(&self) -> BatchId {
        self.id
    }
}
