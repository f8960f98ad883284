//! Test doubles shared by unit tests across the crate.

use crate::notifier::{Delivery, Notifier, NotifyError, Topic};
use crate::repositories::store::{Collection, DocumentStore, StoreError, StoreResult};
use crate::repositories::MemoryStore;
use medairon_uuid::RecordId;
use parking_lot::Mutex;

/// Records every publish and reports one delivery per call.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    published: Mutex<Vec<(Topic, String, serde_json::Value)>>,
}

impl RecordingNotifier {
    pub(crate) fn published(&self) -> Vec<(Topic, String, serde_json::Value)> {
        self.published.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn publish(
        &self,
        topic: &Topic,
        event: &str,
        payload: &serde_json::Value,
    ) -> Result<Delivery, NotifyError> {
        self.published
            .lock()
            .push((topic.clone(), event.to_string(), payload.clone()));
        Ok(Delivery {
            delivered: 1,
            dropped: 0,
        })
    }
}

pub(crate) struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn publish(&self, _: &Topic, _: &str, _: &serde_json::Value) -> Result<Delivery, NotifyError> {
        Err(NotifyError::Unavailable("broker offline".into()))
    }
}

/// In-memory store whose writes to one collection always fail.
pub(crate) struct FailingStore {
    inner: MemoryStore,
    failing: Collection,
}

impl FailingStore {
    pub(crate) fn failing(collection: Collection) -> Self {
        Self {
            inner: MemoryStore::new(),
            failing: collection,
        }
    }
}

impl DocumentStore for FailingStore {
    fn put(&self, collection: Collection, id: &RecordId, body: &str) -> StoreResult<()> {
        if collection == self.failing {
            return Err(StoreError::Unavailable(format!("{collection} is read-only")));
        }
        self.inner.put(collection, id, body)
    }

    fn get(&self, collection: Collection, id: &RecordId) -> StoreResult<Option<String>> {
        self.inner.get(collection, id)
    }

    fn list(&self, collection: Collection) -> StoreResult<Vec<String>> {
        self.inner.list(collection)
    }
}

/// In-memory store that counts writes per collection.
#[derive(Default)]
pub(crate) struct CountingStore {
    inner: MemoryStore,
    writes: Mutex<Vec<Collection>>,
}

impl CountingStore {
    pub(crate) fn writes(&self, collection: Collection) -> usize {
        self.writes.lock().iter().filter(|c| **c == collection).count()
    }
}

impl DocumentStore for CountingStore {
    fn put(&self, collection: Collection, id: &RecordId, body: &str) -> StoreResult<()> {
        self.writes.lock().push(collection);
        self.inner.put(collection, id, body)
    }

    fn get(&self, collection: Collection, id: &RecordId) -> StoreResult<Option<String>> {
        self.inner.get(collection, id)
    }

    fn list(&self, collection: Collection) -> StoreResult<Vec<String>> {
        self.inner.list(collection)
    }
}
