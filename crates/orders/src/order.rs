use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use waybill_core::{Entity, OrderId, OrderLineItemId, ProductId};
use waybill_store::Document;

/// One shipment's contribution to a line item, keyed (in the parent map) by
/// the transport document number that carried it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRecord {
    pub quantity: f64,
    pub last_shipment_date: DateTime<Utc>,
}

/// A line on a customer order.
///
/// `shipped_quantity` is never written directly; it is re-derived from
/// `shipment_history` after every mutation so drift self-heals instead of
/// accumulating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub id: OrderLineItemId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub ordered_quantity: f64,
    pub unit: String,
    pub price: f64,
    pub shipped_quantity: f64,
    pub shipment_history: BTreeMap<String, ShipmentRecord>,
}

impl OrderLineItem {
    pub fn new(product_name: impl Into<String>, ordered_quantity: f64, unit: &str, price: f64) -> Self {
        Self {
            id: OrderLineItemId::new(),
            product_id: None,
            product_name: product_name.into(),
            ordered_quantity,
            unit: unit.to_string(),
            price,
            shipped_quantity: 0.0,
            shipment_history: BTreeMap::new(),
        }
    }

    /// Record that `document_number` currently ships `quantity` of this line.
    ///
    /// The history entry is *replaced*, not added to: re-saving a document
    /// that is already in transit records the same quantity again and changes
    /// nothing. Returns the delta actually applied against the previously
    /// recorded amount.
    pub fn record_shipment(
        &mut self,
        document_number: &str,
        quantity: f64,
        at: DateTime<Utc>,
    ) -> f64 {
        let previous = self
            .shipment_history
            .get(document_number)
            .map(|r| r.quantity)
            .unwrap_or(0.0);

        self.shipment_history.insert(
            document_number.to_string(),
            ShipmentRecord {
                quantity,
                last_shipment_date: at,
            },
        );

        self.recompute_shipped();
        quantity - previous
    }

    /// Remove the shipment entry for `document_number`, reversing its whole
    /// contribution. Returns the quantity that was reversed (0 if no entry).
    pub fn reverse_shipment(&mut self, document_number: &str) -> f64 {
        let reversed = self
            .shipment_history
            .remove(document_number)
            .map(|r| r.quantity)
            .unwrap_or(0.0);

        self.recompute_shipped();
        reversed
    }

    fn recompute_shipped(&mut self) {
        self.shipped_quantity = self.shipment_history.values().map(|r| r.quantity).sum();
    }

    /// Invariant check: shipped quantity equals the history sum.
    pub fn shipped_matches_history(&self) -> bool {
        let sum: f64 = self.shipment_history.values().map(|r| r.quantity).sum();
        (self.shipped_quantity - sum).abs() < 1e-9
    }
}

/// Aggregate root: a customer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerOrder {
    pub id: OrderId,
    pub number: String,
    pub customer_name: String,
    pub line_items: Vec<OrderLineItem>,
}

impl CustomerOrder {
    pub fn line_item(&self, id: OrderLineItemId) -> Option<&OrderLineItem> {
        self.line_items.iter().find(|li| li.id == id)
    }

    pub fn line_item_mut(&mut self, id: OrderLineItemId) -> Option<&mut OrderLineItem> {
        self.line_items.iter_mut().find(|li| li.id == id)
    }
}

impl Entity for CustomerOrder {
    type Id = OrderId;

    fn id(&self) -> &OrderId {
        &self.id
    }
}

impl Document for CustomerOrder {
    type Id = OrderId;
    const COLLECTION: &'static str = "orders";

    fn document_id(&self) -> OrderId {
        self.id
    }
}
