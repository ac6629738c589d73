//! Shipment reconciler.
//!
//! Keeps `shipped_quantity` on customer-order line items consistent with the
//! transport documents that reference them, one whole-order read-modify-write
//! at a time. Unmatched line items are warnings, never fatal.

use chrono::Utc;
use tracing::warn;

use waybill_core::ExpectedVersion;
use waybill_orders::CustomerOrder;
use waybill_store::DocumentStore;
use waybill_transport::{resolve_line, MatchOutcome, TransportDocument};

use crate::outcome::{ReconcileOutcome, ReconciliationWarning};

/// Whether a pass applies a document's quantities or reverses them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ShipmentDirection {
    Apply,
    Reverse,
}

pub struct ShipmentReconciler<O> {
    orders: O,
}

impl<O> ShipmentReconciler<O>
where
    O: DocumentStore<CustomerOrder>,
{
    pub fn new(orders: O) -> Self {
        Self { orders }
    }

    /// Run one reconciliation pass of `doc` over every linked order.
    ///
    /// Applying records each line item's declared quantity under the document
    /// number (replacing any earlier recording, so re-application is
    /// idempotent); reversing removes the document's entries. All errors are
    /// collected into the outcome — the caller's transition still commits.
    pub fn apply_shipment(
        &self,
        doc: &TransportDocument,
        direction: ShipmentDirection,
    ) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();
        let now = Utc::now();

        for order_id in &doc.linked_order_ids {
            let versioned = match self.orders.get(order_id) {
                Ok(Some(v)) => v,
                Ok(None) => {
                    warn!(order_id = %order_id, document = %doc.number, "linked order not found");
                    outcome
                        .warnings
                        .push(ReconciliationWarning::OrderNotFound { order_id: *order_id });
                    continue;
                }
                Err(e) => {
                    outcome.warnings.push(ReconciliationWarning::OrderPersistFailed {
                        order_id: *order_id,
                        reason: format!("load failed: {e}"),
                    });
                    continue;
                }
            };

            let mut order = versioned.doc;
            let mut touched = false;

            for (position, item) in doc.items.iter().enumerate() {
                // Resolve first, then re-fetch mutably; the matcher only
                // needs a shared view of the order.
                let resolution = match resolve_line(item, position, doc.items.len(), &order) {
                    MatchOutcome::Matched {
                        line,
                        stale_reference,
                        ..
                    } => Some((line.id, stale_reference)),
                    MatchOutcome::NoMatch => None,
                };

                let Some((line_id, stale_reference)) = resolution else {
                    outcome.warnings.push(ReconciliationWarning::Unmatched {
                        order_id: *order_id,
                        item_description: item.description.clone(),
                    });
                    continue;
                };

                if stale_reference {
                    outcome.warnings.push(ReconciliationWarning::StaleReference {
                        order_id: *order_id,
                        item_description: item.description.clone(),
                    });
                }

                if let Some(line) = order.line_item_mut(line_id) {
                    match direction {
                        ShipmentDirection::Apply => {
                            line.record_shipment(&doc.number, item.quantity, now);
                        }
                        ShipmentDirection::Reverse => {
                            line.reverse_shipment(&doc.number);
                        }
                    }
                    touched = true;
                    outcome.applied += 1;
                }
            }

            if !touched {
                continue;
            }

            if let Err(e) = self
                .orders
                .put(order, ExpectedVersion::Exact(versioned.version))
            {
                warn!(order_id = %order_id, error = %e, "failed to persist reconciled order");
                outcome.warnings.push(ReconciliationWarning::OrderPersistFailed {
                    order_id: *order_id,
                    reason: e.to_string(),
                });
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::NaiveDate;
    use waybill_core::OrderId;
    use waybill_orders::OrderLineItem;
    use waybill_store::InMemoryDocumentStore;
    use waybill_transport::TransportLineItem;

    struct Fixture {
        orders: Arc<InMemoryDocumentStore<CustomerOrder>>,
        reconciler: ShipmentReconciler<Arc<InMemoryDocumentStore<CustomerOrder>>>,
    }

    fn fixture() -> Fixture {
        let orders = Arc::new(InMemoryDocumentStore::new());
        let reconciler = ShipmentReconciler::new(orders.clone());
        Fixture { orders, reconciler }
    }

    fn seed_order(fx: &Fixture, lines: Vec<OrderLineItem>) -> CustomerOrder {
        let order = CustomerOrder {
            id: OrderId::new(),
            number: "SO-1".to_string(),
            customer_name: "Acme".to_string(),
            line_items: lines,
        };
        fx.orders.put(order.clone(), ExpectedVersion::Any).unwrap();
        order
    }

    fn doc_for(order: &CustomerOrder, items: Vec<TransportLineItem>) -> TransportDocument {
        let mut doc = TransportDocument::new(
            "CMR 05-03-2026",
            NaiveDate::from_ymd_opt(2026, 3, 5).unwrap(),
        );
        doc.link_order(order.id);
        doc.items = items;
        doc
    }

    fn reload(fx: &Fixture, order: &CustomerOrder) -> CustomerOrder {
        fx.orders.get(&order.id).unwrap().unwrap().doc
    }

    #[test]
    fn apply_records_shipment_on_the_matched_line() {
        let fx = fixture();
        let order = seed_order(&fx, vec![OrderLineItem::new("Widget", 10.0, "pcs", 2.0)]);
        let doc = doc_for(&order, vec![TransportLineItem::new("Widget", 10.0, "pcs")]);

        let outcome = fx.reconciler.apply_shipment(&doc, ShipmentDirection::Apply);
        assert_eq!(outcome.applied, 1);
        assert!(outcome.warnings.is_empty());

        let li = &reload(&fx, &order).line_items[0];
        assert_eq!(li.shipped_quantity, 10.0);
        assert_eq!(li.shipment_history.len(), 1);
        assert!(li.shipment_history.contains_key("CMR 05-03-2026"));
        assert!(li.shipped_matches_history());
    }

    #[test]
    fn reapply_is_idempotent() {
        let fx = fixture();
        let order = seed_order(&fx, vec![OrderLineItem::new("Widget", 10.0, "pcs", 2.0)]);
        let doc = doc_for(&order, vec![TransportLineItem::new("Widget", 10.0, "pcs")]);

        fx.reconciler.apply_shipment(&doc, ShipmentDirection::Apply);
        fx.reconciler.apply_shipment(&doc, ShipmentDirection::Apply);

        let li = &reload(&fx, &order).line_items[0];
        assert_eq!(li.shipped_quantity, 10.0);
        assert_eq!(li.shipment_history.len(), 1);
    }

    #[test]
    fn reverse_removes_the_document_entry() {
        let fx = fixture();
        let order = seed_order(&fx, vec![OrderLineItem::new("Widget", 10.0, "pcs", 2.0)]);
        let doc = doc_for(&order, vec![TransportLineItem::new("Widget", 10.0, "pcs")]);

        fx.reconciler.apply_shipment(&doc, ShipmentDirection::Apply);
        fx.reconciler.apply_shipment(&doc, ShipmentDirection::Reverse);

        let li = &reload(&fx, &order).line_items[0];
        assert_eq!(li.shipped_quantity, 0.0);
        assert!(li.shipment_history.is_empty());
    }

    #[test]
    fn unmatched_items_warn_without_blocking_others() {
        let fx = fixture();
        let order = seed_order(&fx, vec![OrderLineItem::new("Widget", 10.0, "pcs", 2.0)]);
        let doc = doc_for(
            &order,
            vec![
                TransportLineItem::new("Nothing Like It", 3.0, "pcs"),
                TransportLineItem::new("Widget", 10.0, "pcs"),
            ],
        );

        let outcome = fx.reconciler.apply_shipment(&doc, ShipmentDirection::Apply);
        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(matches!(
            outcome.warnings[0],
            ReconciliationWarning::Unmatched { .. }
        ));

        assert_eq!(reload(&fx, &order).line_items[0].shipped_quantity, 10.0);
    }

    #[test]
    fn missing_linked_order_is_a_warning() {
        let fx = fixture();
        let order = seed_order(&fx, vec![OrderLineItem::new("Widget", 10.0, "pcs", 2.0)]);
        let mut doc = doc_for(&order, vec![TransportLineItem::new("Widget", 10.0, "pcs")]);
        doc.link_order(OrderId::new());

        let outcome = fx.reconciler.apply_shipment(&doc, ShipmentDirection::Apply);
        assert_eq!(outcome.applied, 1);
        assert!(outcome
            .warnings
            .iter()
            .any(|w| matches!(w, ReconciliationWarning::OrderNotFound { .. })));
    }

    #[test]
    fn shipped_quantity_matches_history_on_every_line_after_a_pass() {
        let fx = fixture();
        let order = seed_order(
            &fx,
            vec![
                OrderLineItem::new("Widget", 10.0, "pcs", 2.0),
                OrderLineItem::new("Gadget", 4.0, "pcs", 3.0),
            ],
        );
        let doc = doc_for(
            &order,
            vec![
                TransportLineItem::new("Widget", 6.0, "pcs"),
                TransportLineItem::new("Gadget", 4.0, "pcs"),
            ],
        );

        fx.reconciler.apply_shipment(&doc, ShipmentDirection::Apply);

        for li in &reload(&fx, &order).line_items {
            assert!(li.shipped_matches_history());
        }
    }
}
