use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use waybill_core::{
    BatchId, DocumentId, DomainError, DomainResult, Entity, OrderId, OrderLineItemId, ProductId,
    TransportLineItemId, UserId, WarehouseId,
};
use waybill_store::Document;

use crate::status::{PaymentStatus, PaymentStatusChange, StatusChange, TransportStatus};

/// Reference from a transport line item to a specific inventory batch.
///
/// `quantity` is the batch's *available* stock at link time, not the amount
/// reserved. The line item's declared quantity stays authoritative; these
/// figures only weight the proportional split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchAllocation {
    pub batch_id: BatchId,
    pub batch_number: String,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub quantity: f64,
    pub unit: String,
}

/// Explicit link from a transport line item back to an order line.
///
/// Older documents recorded only the order number, so the order identity is
/// optional; the matcher treats a number-only reference as applying to any
/// order with that number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineRef {
    pub order_id: Option<OrderId>,
    pub order_number: Option<String>,
    pub line_item_id: OrderLineItemId,
}

/// One shipped good on a transport document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportLineItem {
    pub id: TransportLineItemId,
    pub description: String,
    pub quantity: f64,
    pub unit: String,
    pub weight: Option<f64>,
    pub volume: Option<f64>,
    pub product_id: Option<ProductId>,
    pub order_line_ref: Option<OrderLineRef>,
    pub linked_batches: Vec<BatchAllocation>,
}

impl TransportLineItem {
    pub fn new(description: impl Into<String>, quantity: f64, unit: &str) -> Self {
        Self {
            id: TransportLineItemId::new(),
            description: description.into(),
            quantity,
            unit: unit.to_string(),
            weight: None,
            volume: None,
            product_id: None,
            order_line_ref: None,
            linked_batches: Vec::new(),
        }
    }
}

/// Aggregate root: a transport (consignment) document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportDocument {
    pub id: DocumentId,
    pub number: String,
    pub status: TransportStatus,
    pub payment_status: PaymentStatus,
    pub issue_date: NaiveDate,
    pub delivery_date: Option<NaiveDate>,
    pub loading_date: Option<NaiveDate>,
    pub linked_order_ids: BTreeSet<OrderId>,
    pub items: Vec<TransportLineItem>,
    pub payment_status_history: Vec<PaymentStatusChange>,
    pub status_history: Vec<StatusChange>,
}

impl TransportDocument {
    /// A new document starts in Draft, unpaid, with no lines.
    pub fn new(number: impl Into<String>, issue_date: NaiveDate) -> Self {
        Self {
            id: DocumentId::new(),
            number: number.into(),
            status: TransportStatus::Draft,
            payment_status: PaymentStatus::Unpaid,
            issue_date,
            delivery_date: None,
            loading_date: None,
            linked_order_ids: BTreeSet::new(),
            items: Vec::new(),
            payment_status_history: Vec::new(),
            status_history: Vec::new(),
        }
    }

    /// Link a customer order (deduplicated by the set).
    pub fn link_order(&mut self, order_id: OrderId) {
        self.linked_order_ids.insert(order_id);
    }

    /// Structural edits (lines, dates, linkage) are only allowed before the
    /// document goes out the door.
    pub fn is_editable(&self) -> bool {
        matches!(
            self.status,
            TransportStatus::Draft | TransportStatus::Issued
        )
    }

    /// Documents in transit or delivered are never physically deleted.
    pub fn can_be_deleted(&self) -> bool {
        !matches!(
            self.status,
            TransportStatus::InTransit | TransportStatus::Delivered
        )
    }

    /// Line items missing any batch linkage, by description.
    ///
    /// Entering transit requires every line to carry at least one linked
    /// batch; callers turn a non-empty result into a validation failure.
    pub fn items_missing_batch_links(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|li| li.linked_batches.is_empty())
            .map(|li| li.description.as_str())
            .collect()
    }

    /// A document may not leave Draft with no lines at all.
    pub fn ensure_has_items(&self) -> DomainResult<()> {
        if self.items.is_empty() {
            return Err(DomainError::validation(
                "transport document has no line items",
            ));
        }
        Ok(())
    }

    /// Change payment status, appending to the audit log. No-op if unchanged.
    pub fn set_payment_status(&mut self, to: PaymentStatus, actor: UserId, at: DateTime<Utc>) {
        if self.payment_status == to {
            return;
        }
        self.payment_status_history.push(PaymentStatusChange {
            from: self.payment_status,
            to,
            actor,
            at,
        });
        self.payment_status = to;
    }

    /// Apply an already-validated status change, appending to the audit log.
    ///
    /// Edge validation belongs to the state machine; this only mutates.
    pub fn record_status_change(&mut self, to: TransportStatus, actor: UserId, at: DateTime<Utc>) {
        self.status_history.push(StatusChange {
            from: self.status,
            to,
            actor,
            at,
        });
        self.status = to;
    }
}

impl Entity for TransportDocument {
    type Id = DocumentId;

    fn id(&self) -> &DocumentId {
        &self.id
    }
}

impl Document for TransportDocument {
    type Id = DocumentId;
    const COLLECTION: &'static str = "transport_documents";

    fn document_id(&self) -> DocumentId {
        self.id
    }
}
