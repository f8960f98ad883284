//! # MedAIron Core
//!
//! Domain logic for the MedAIron hospital backend's vital-sign alerting subsystem.
//!
//! - Threshold rules and a pure evaluator that turns a reading into alert drafts
//! - The ingestion pipeline: persist the reading, persist alerts best-effort, notify the
//!   patient's care team
//! - Alert lifecycle (acknowledge, dismiss) and reading history/trends
//! - Patients, staff and care-team assignment, which the pipeline reads
//! - A document store abstraction with file-backed and in-memory backends
//!
//! **No API concerns**: authentication, HTTP and WebSocket handling belong in `api-shared`
//! and `api-rest`. Callers arrive here already resolved to a [`Caller`].

pub mod access;
pub mod alerts;
pub mod config;
pub mod constants;
pub mod error;
pub mod notifier;
pub mod patients;
pub mod repositories;
pub mod staff;
pub mod validation;
pub mod vitals;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

pub use access::Caller;
pub use alerts::{Alert, AlertDraft, AlertFilter, AlertService, ConfidenceScore, Severity};
pub use config::CoreConfig;
pub use error::{CoreError, CoreResult};
pub use notifier::{Notifier, NotifyError, Topic, TopicRegistry};
pub use patients::{Patient, PatientService};
pub use repositories::{Collection, DocumentStore, FileStore, MemoryStore};
pub use staff::{StaffMember, StaffService};
pub use vitals::history::{DailyTrend, VitalsService};
pub use vitals::ingestion::{RecordOutcome, VitalIngestionPipeline};
pub use vitals::{Channel, VitalMeasurements, VitalReading, VitalReadingPayload};

/// Every core service, wired to one store and one notifier.
#[derive(Clone)]
pub struct Hospital {
    pub staff: StaffService,
    pub patients: PatientService,
    pub vitals: VitalsService,
    pub ingestion: VitalIngestionPipeline,
    pub alerts: AlertService,
}

impl Hospital {
    pub fn new(store: Arc<dyn DocumentStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            staff: StaffService::new(store.clone()),
            patients: PatientService::new(store.clone(), notifier.clone()),
            vitals: VitalsService::new(store.clone(), notifier.clone()),
            ingestion: VitalIngestionPipeline::new(store.clone(), notifier),
            alerts: AlertService::new(store),
        }
    }

    /// Services over the file store rooted at the configured data directory.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the data directory cannot be created.
    pub fn open(cfg: &CoreConfig, notifier: Arc<dyn Notifier>) -> CoreResult<Self> {
        let store = FileStore::open(cfg.data_dir()).map_err(|source| CoreError::Persistence {
            collection: Collection::Patients,
            source,
        })?;
        Ok(Self::new(Arc::new(store), notifier))
    }
}
