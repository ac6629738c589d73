use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use waybill_core::{BatchId, DocumentId, Entity, ProductId, ReservationId, WarehouseId};
use waybill_store::Document;

/// Token grouping every reservation created for one transport document's
/// transition into transit. Release deletes by token, not by reservation id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllocationToken(String);

impl AllocationToken {
    /// Deterministic token for a transport document.
    pub fn for_document(number: &str, id: DocumentId) -> Self {
        Self(format!("CMR-{number}-{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for AllocationToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a reservation came to exist.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationMethod {
    Manual,
    Automatic,
}

/// A temporary hold against a batch's available quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub allocation_token: AllocationToken,
    pub product_id: ProductId,
    pub batch_id: BatchId,
    pub warehouse_id: WarehouseId,
    pub quantity: f64,
    pub method: ReservationMethod,
    pub reserved_at: DateTime<Utc>,
}

impl Entity for Reservation {
    type Id = ReservationId;

    fn id(&self) -> &ReservationId {
        &self.id
    }
}

impl Document for Reservation {
    type Id = ReservationId;
    const COLLECTION: &'static str = "reservations";

    fn document_id(&self) -> ReservationId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_deterministic_for_a_document() {
        let id = DocumentId::new();
        let a = AllocationToken::for_document("CMR 05-03-2026 ACME", id);
        let b = AllocationToken::for_document("CMR 05-03-2026 ACME", id);
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("CMR-CMR 05-03-2026 ACME-"));
    }

    #[test]
    fn distinct_documents_get_distinct_tokens() {
        let a = AllocationToken::for_document("N1", DocumentId::new());
        let b = AllocationToken::for_document("N1", DocumentId::new());
        assert_ne!(a, b);
    }
}
