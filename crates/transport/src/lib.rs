//! Transport (consignment) document domain module.
//!
//! Owns the CMR document shape, the status edge table, the line-item matcher,
//! and document numbering. Pure logic only; the orchestration that turns a
//! status change into ledger and reconciliation side effects lives in
//! `waybill-engine`.

pub mod document;
pub mod matcher;
pub mod numbering;
pub mod status;

pub use document::{BatchAllocation, OrderLineRef, TransportDocument, TransportLineItem};
pub use matcher::{resolve_line, MatchOutcome, MatchTier};
pub use numbering::{DateAffixNumbering, TransportNumbering};
pub use status::{PaymentStatus, PaymentStatusChange, StatusChange, TransportStatus};
