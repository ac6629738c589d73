//! Inventory domain module.
//!
//! This crate contains batch stock and reservation records, implemented purely
//! as deterministic domain logic (no IO, no HTTP, no storage). The store-backed
//! reserve/release/issue operations live in `waybill-engine`.

pub mod allocation;
pub mod batch;
pub mod reservation;

pub use allocation::proportional_split;
pub use batch::Batch;
pub use reservation::{AllocationToken, Reservation, ReservationMethod};
