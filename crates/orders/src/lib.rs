//! Customer order domain module.
//!
//! Owns the shipped-quantity ledger on order line items. The reconciler in
//! `waybill-engine` mutates orders exclusively through the operations here, so
//! the `shipped_quantity == Σ shipment_history` invariant is maintained in one
//! place.

pub mod order;

pub use order::{CustomerOrder, OrderLineItem, ShipmentRecord};
