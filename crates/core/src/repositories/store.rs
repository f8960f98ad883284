//! Document store abstraction.
//!
//! Every persisted entity is a YAML document keyed by `(Collection, RecordId)`. Services talk to
//! the store through the object-safe [`DocumentStore`] trait and use the typed helpers in this
//! module to encode and decode documents.

use crate::constants::{ALERTS_DIR_NAME, PATIENTS_DIR_NAME, STAFF_DIR_NAME, VITALS_DIR_NAME};
use medairon_uuid::RecordId;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;

/// Named document collections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Patients,
    Staff,
    Vitals,
    Alerts,
}

impl Collection {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Collection::Patients => PATIENTS_DIR_NAME,
            Collection::Staff => STAFF_DIR_NAME,
            Collection::Vitals => VITALS_DIR_NAME,
            Collection::Alerts => ALERTS_DIR_NAME,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to create storage directory: {0}")]
    DirCreation(std::io::Error),
    #[error("failed to write document: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read document: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialise document: {0}")]
    Serialization(serde_yaml::Error),
    #[error("document schema mismatch at {path}: {message}")]
    Deserialization { path: String, message: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence boundary for all collections.
///
/// Implementations must be safe to share between request handlers. A `put` replaces any
/// existing document with the same id.
pub trait DocumentStore: Send + Sync {
    fn put(&self, collection: Collection, id: &RecordId, body: &str) -> StoreResult<()>;

    fn get(&self, collection: Collection, id: &RecordId) -> StoreResult<Option<String>>;

    /// Returns every document body in the collection, in no particular order.
    fn list(&self, collection: Collection) -> StoreResult<Vec<String>>;
}

pub(crate) fn encode<T: Serialize>(doc: &T) -> StoreResult<String> {
    serde_yaml::to_string(doc).map_err(StoreError::Serialization)
}

/// Decode a YAML document, reporting the path of the first mismatching field.
pub(crate) fn decode<T: DeserializeOwned>(text: &str) -> StoreResult<T> {
    let deserializer = serde_yaml::Deserializer::from_str(text);
    serde_path_to_error::deserialize::<_, T>(deserializer).map_err(|err| {
        let path = err.path().to_string();
        let path = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        StoreError::Deserialization {
            path,
            message: err.into_inner().to_string(),
        }
    })
}

pub(crate) fn put_document<T: Serialize>(
    store: &dyn DocumentStore,
    collection: Collection,
    id: &RecordId,
    doc: &T,
) -> StoreResult<()> {
    let body = encode(doc)?;
    store.put(collection, id, &body)
}

pub(crate) fn get_document<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: Collection,
    id: &RecordId,
) -> StoreResult<Option<T>> {
    store.get(collection, id)?.map(|body| decode(&body)).transpose()
}

/// Load every document in a collection.
///
/// A document that fails to decode is logged and skipped so that one corrupt file does not
/// hide the rest of the collection.
pub(crate) fn list_documents<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: Collection,
) -> StoreResult<Vec<T>> {
    let bodies = store.list(collection)?;
    let mut docs = Vec::with_capacity(bodies.len());
    for body in bodies {
        match decode(&body) {
            Ok(doc) => docs.push(doc),
            Err(e) => tracing::warn!(%collection, "skipping undecodable document: {}", e),
        }
    }
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    #[serde(deny_unknown_fields)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn decode_reports_failing_field_path() {
        let err = decode::<Sample>("name: x\ncount: lots\n").unwrap_err();
        match err {
            StoreError::Deserialization { path, .. } => assert_eq!(path, "count"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn encode_then_decode_preserves_document() {
        let doc = Sample {
            name: "ward 3".into(),
            count: 2,
        };
        let text = encode(&doc).unwrap();
        assert_eq!(decode::<Sample>(&text).unwrap(), doc);
    }
}
