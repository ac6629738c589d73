use std::cmp::Ordering;
use std::sync::Arc;

use thiserror::Error;

use waybill_core::ExpectedVersion;

/// A document stored in one of the gateway's logical collections.
pub trait Document: Clone + Send + Sync + 'static {
    /// Strongly-typed document identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug + Send + Sync + 'static;

    /// Logical collection name (e.g. `"transport_documents"`).
    const COLLECTION: &'static str;

    fn document_id(&self) -> Self::Id;
}

/// A document together with the store version it was read at.
///
/// The version read here is what a caller passes back as
/// `ExpectedVersion::Exact` when persisting, so a concurrent writer that got
/// in between is rejected instead of silently overwritten.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<D> {
    pub doc: D,
    pub version: u64,
}

/// Store-level failure.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    /// Optimistic concurrency check failed at persist time.
    #[error("version conflict on '{collection}': expected {expected:?}, actual {actual}")]
    Conflict {
        collection: &'static str,
        expected: ExpectedVersion,
        actual: u64,
    },

    /// The backend itself failed (lock poisoned, connection lost, ...).
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Generic document store over a single collection.
///
/// Versions start at 0 for an absent document and increase by 1 per `put`.
pub trait DocumentStore<D: Document>: Send + Sync {
    fn get(&self, id: &D::Id) -> Result<Option<Versioned<D>>, StoreError>;

    /// Persist `doc`, enforcing `expected` against the currently stored
    /// version (0 if absent). Returns the new version on success.
    fn put(&self, doc: D, expected: ExpectedVersion) -> Result<u64, StoreError>;

    /// Remove a document. Returns whether anything was deleted.
    fn delete(&self, id: &D::Id) -> Result<bool, StoreError>;

    /// All documents matching `predicate`, optionally sorted by `order_by`.
    fn query(
        &self,
        predicate: &dyn Fn(&D) -> bool,
        order_by: Option<&dyn Fn(&D, &D) -> Ordering>,
    ) -> Result<Vec<Versioned<D>>, StoreError>;
}

impl<D, S> DocumentStore<D> for Arc<S>
where
    D: Document,
    S: DocumentStore<D> + ?Sized,
{
    fn get(&self, id: &D::Id) -> Result<Option<Versioned<D>>, StoreError> {
        (**self).get(id)
    }

    fn put(&self, doc: D, expected: ExpectedVersion) -> Result<u64, StoreError> {
        (**self).put(doc, expected)
    }

    fn delete(&self, id: &D::Id) -> Result<bool, StoreError> {
        (**self).delete(id)
    }

    fn query(
        &self,
        predicate: &dyn Fn(&D) -> bool,
        order_by: Option<&dyn Fn(&D, &D) -> Ordering>,
    ) -> Result<Vec<Versioned<D>>, StoreError> {
        (**self).query(predicate, order_by)
    }
}
