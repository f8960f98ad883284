//! Constants used throughout the MedAIron core crate.
//!
//! Storage names, notification event names and bounds live here so that the store, the
//! pipeline and the API layer agree on them.

/// Default directory for hospital data when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "hospital_data";

/// File extension for stored documents.
pub const DOCUMENT_EXTENSION: &str = "yaml";

/// Directory names for each document collection.
pub const PATIENTS_DIR_NAME: &str = "patients";
pub const STAFF_DIR_NAME: &str = "staff";
pub const VITALS_DIR_NAME: &str = "vitals";
pub const ALERTS_DIR_NAME: &str = "alerts";

/// Event published to clinical staff when a vital-sign reading raises alerts.
pub const VITAL_ALERT_EVENT: &str = "vital_alert";

/// Event published to administrators when staff are assigned to a patient.
pub const PATIENT_ASSIGNED_EVENT: &str = "patient:assigned";

/// Group topic joined by administrative dashboards.
pub const ADMINS_TOPIC: &str = "admins";

/// Default number of undelivered events buffered per real-time connection.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;

/// Upper bound for the per-connection event buffer.
pub const MAX_SUBSCRIBER_BUFFER: usize = 4096;

/// Maximum length of free-text notes attached to a vital-sign reading.
pub const MAX_NOTES_LEN: usize = 2000;
