use crate::repositories::store::{Collection, StoreError};
use std::fmt;

/// Errors returned by core operations.
///
/// `NotFound`, `Forbidden` and `InvalidInput` describe caller mistakes and are surfaced
/// as-is. `Persistence` is a storage fault. Notification failures are never represented
/// here: they are [`crate::notifier::NotifyError`] and stay inside the services that publish.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to persist {collection}: {source}")]
    Persistence {
        collection: Collection,
        #[source]
        source: StoreError,
    },
}

impl CoreError {
    pub(crate) fn not_found(kind: &'static str, id: impl fmt::Display) -> Self {
        CoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Returns a mapper suitable for `map_err` on store results.
    pub(crate) fn persistence(collection: Collection) -> impl FnOnce(StoreError) -> Self {
        move |source| CoreError::Persistence { collection, source }
    }
}

impl From<medairon_uuid::UuidError> for CoreError {
    fn from(err: medairon_uuid::UuidError) -> Self {
        CoreError::InvalidInput(err.to_string())
    }
}

impl From<medairon_types::TextError> for CoreError {
    fn from(err: medairon_types::TextError) -> Self {
        CoreError::InvalidInput(err.to_string())
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
