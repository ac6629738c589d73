//! Optimistic concurrency tokens.
//!
//! There is no transactional substrate underneath this system: every status
//! transition is a sequential read-modify-write against single documents. The
//! version token read at the start of a transition is carried through to the
//! persist, so two concurrent transitions on the same document cannot both win.

use crate::error::{DomainError, DomainResult};

/// Version expectation checked when persisting a document.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (useful for idempotent writes, migrations, etc.).
    Any,
    /// Require the stored document to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}
