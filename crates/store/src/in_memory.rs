use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use waybill_core::ExpectedVersion;

use crate::gateway::{Document, DocumentStore, StoreError, Versioned};

/// In-memory document store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug)]
pub struct InMemoryDocumentStore<D: Document> {
    docs: RwLock<HashMap<D::Id, Versioned<D>>>,
}

impl<D: Document> InMemoryDocumentStore<D> {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
        }
    }
}

impl<D: Document> Default for InMemoryDocumentStore<D> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

impl<D: Document> DocumentStore<D> for InMemoryDocumentStore<D> {
    fn get(&self, id: &D::Id) -> Result<Option<Versioned<D>>, StoreError> {
        let docs = self.docs.read().map_err(|_| poisoned())?;
        Ok(docs.get(id).cloned())
    }

    fn put(&self, doc: D, expected: ExpectedVersion) -> Result<u64, StoreError> {
        let mut docs = self.docs.write().map_err(|_| poisoned())?;

        let id = doc.document_id();
        let current = docs.get(&id).map(|v| v.version).unwrap_or(0);

        if !expected.matches(current) {
            return Err(StoreError::Conflict {
                collection: D::COLLECTION,
                expected,
                actual: current,
            });
        }

        let version = current + 1;
        docs.insert(id, Versioned { doc, version });
        Ok(version)
    }

    fn delete(&self, id: &D::Id) -> Result<bool, StoreError> {
        let mut docs = self.docs.write().map_err(|_| poisoned())?;
        Ok(docs.remove(id).is_some())
    }

    fn query(
        &self,
        predicate: &dyn Fn(&D) -> bool,
        order_by: Option<&dyn Fn(&D, &D) -> Ordering>,
    ) -> Result<Vec<Versioned<D>>, StoreError> {
        let docs = self.docs.read().map_err(|_| poisoned())?;

        let mut hits: Vec<Versioned<D>> = docs
            .values()
            .filter(|v| predicate(&v.doc))
            .cloned()
            .collect();

        if let Some(cmp) = order_by {
            hits.sort_by(|a, b| cmp(&a.doc, &b.doc));
        }

        Ok(hits)
    }
}
