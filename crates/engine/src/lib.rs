//! `waybill-engine` — orchestration over the document store.
//!
//! Wires the pure domain crates together: the transport document state
//! machine validates a requested status change, drives the inventory ledger
//! (reserve/release/issue) and the shipment reconciler as side effects, and
//! persists the document with the version token read at entry.

pub mod error;
pub mod ledger;
pub mod notify;
pub mod outcome;
pub mod reconciler;
pub mod state_machine;


pub use error::EngineError;
pub use ledger::InventoryLedger;
pub use notify::{NotificationSink, Notification, NotifyError, NullNotifier, RecordingNotifier};
pub use outcome::{
    AllocationFailure, AllocationOutcome, AllocationStats, ReconcileOutcome,
    ReconciliationWarning, TransitionReport,
};
pub use reconciler::{ShipmentDirection, ShipmentReconciler};
pub use state_machine::TransportStateMachine;
