//! Record identifiers and sharded-path utilities.
//!
//! Every stored document (patients, staff, vital readings, alerts) is keyed by a
//! [`RecordId`]: a UUID held in a *canonical* representation of **32 lowercase hexadecimal
//! characters** (no hyphens).
//!
//! ## Canonical form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Canonical form is *required* for identifiers arriving from outside (HTTP paths, bearer
//! token subjects, CLI arguments). Hyphenated or uppercase values are rejected rather than
//! normalised, so one record can never be addressed by two different strings.
//!
//! ## Sharded layout
//! For an id `u`, file-backed storage places the document at
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>.<ext>`, keeping directory fan-out small.

mod record_id;

pub use record_id::{RecordId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
