use thiserror::Error;

use waybill_core::DomainError;
use waybill_store::StoreError;

/// Failure of an engine operation as a whole.
///
/// Per-batch allocation failures and unmatched line items are *not* errors:
/// they ride inside the operation's outcome payload while the status change
/// still commits. This type covers the fatal cases only — precondition
/// validation and store-level faults (including optimistic version conflicts).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
