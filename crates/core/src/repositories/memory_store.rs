//! In-memory document store for tests and ephemeral deployments.

use super::store::{Collection, DocumentStore, StoreResult};
use medairon_uuid::RecordId;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<(Collection, RecordId), String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn put(&self, collection: Collection, id: &RecordId, body: &str) -> StoreResult<()> {
        self.docs.write().insert((collection, *id), body.to_string());
        Ok(())
    }

    fn get(&self, collection: Collection, id: &RecordId) -> StoreResult<Option<String>> {
        Ok(self.docs.read().get(&(collection, *id)).cloned())
    }

    fn list(&self, collection: Collection) -> StoreResult<Vec<String>> {
        Ok(self
            .docs
            .read()
            .iter()
            .filter(|((c, _), _)| *c == collection)
            .map(|(_, body)| body.clone())
            .collect())
    }
}
