//! `waybill-store` — document store gateway.
//!
//! Generic get/put/delete/query access to the aggregates this system works
//! over: transport documents, customer orders, inventory batches, and detached
//! reservation records. Single-document reads and writes only; there is no
//! transaction spanning aggregates.

pub mod gateway;
pub mod in_memory;

pub use gateway::{Document, DocumentStore, StoreError, Versioned};
pub use in_memory::InMemoryDocumentStore;
