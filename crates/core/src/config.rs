//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services.
//! Request handling never reads process-wide environment variables, which keeps behaviour
//! consistent across threads and test harnesses.

use crate::constants::{DEFAULT_SUBSCRIBER_BUFFER, MAX_SUBSCRIBER_BUFFER};
use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    subscriber_buffer: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if `data_dir` is empty or `subscriber_buffer` is
    /// outside `1..=MAX_SUBSCRIBER_BUFFER`.
    pub fn new(data_dir: PathBuf, subscriber_buffer: usize) -> CoreResult<Self> {
        if data_dir.as_os_str().is_empty() {
            return Err(CoreError::InvalidInput("data_dir cannot be empty".into()));
        }

        if !(1..=MAX_SUBSCRIBER_BUFFER).contains(&subscriber_buffer) {
            return Err(CoreError::InvalidInput(format!(
                "subscriber_buffer must be between 1 and {MAX_SUBSCRIBER_BUFFER}, got {subscriber_buffer}"
            )));
        }

        Ok(Self {
            data_dir,
            subscriber_buffer,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn subscriber_buffer(&self) -> usize {
        self.subscriber_buffer
    }
}

/// Parse the per-connection notifier buffer from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default buffer size. Range checks are
/// left to [`CoreConfig::new`].
pub fn subscriber_buffer_from_env_value(value: Option<String>) -> CoreResult<usize> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(DEFAULT_SUBSCRIBER_BUFFER),
        Some(v) => v.parse::<usize>().map_err(|_| {
            CoreError::InvalidInput(format!("NOTIFIER_BUFFER must be a positive integer, got '{v}'"))
        }),
    }
}
