//! Vital ingestion pipeline.
//!
//! One call to [`VitalIngestionPipeline::record`] runs these steps, in this order:
//!
//! 1. role check, resolve the patient (`NotFound`), clinical access check (`Forbidden`),
//!    resolve the caller as a registered staff member (`Forbidden`),
//! 2. payload validation (`InvalidInput`),
//! 3. persist the reading, which is the durability boundary: failure aborts the call,
//! 4. evaluate the reading against the threshold rules,
//! 5. persist every draft independently, collecting one result per draft,
//! 6. if anything was persisted, publish one `vital_alert` batch to each care-team topic.
//!
//! Steps 5 and 6 never fail the call and never roll back the reading.

use super::evaluator::evaluate;
use super::{VitalReading, VitalReadingPayload};
use crate::access::{ensure_clinical_access, ensure_role, Caller};
use crate::alerts::{Alert, AlertDraft, AlertService};
use crate::constants::VITAL_ALERT_EVENT;
use crate::notifier::{Delivery, Notifier, NotifyError, Topic};
use crate::patients::{Patient, PatientService};
use crate::repositories::store::{put_document, Collection, DocumentStore};
use crate::staff::{StaffMember, StaffService};
use crate::validation::{validate_measurements, validate_notes};
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use medairon_types::Role;
use medairon_uuid::RecordId;
use serde::Serialize;
use std::sync::Arc;

/// A draft whose alert could not be persisted.
#[derive(Debug)]
pub struct FailedAlert {
    pub draft: AlertDraft,
    pub error: CoreError,
}

/// Per-draft persistence result, in evaluator order.
pub type AlertAttempt = Result<Alert, FailedAlert>;

/// Outcome of publishing the batch to one topic.
#[derive(Debug)]
pub struct Publication {
    pub topic: Topic,
    pub result: Result<Delivery, NotifyError>,
}

/// Everything one `record` call did after the reading was saved.
#[derive(Debug)]
pub struct RecordOutcome {
    pub reading: VitalReading,
    pub attempts: Vec<AlertAttempt>,
    pub publications: Vec<Publication>,
}

impl RecordOutcome {
    /// Alerts that were persisted, in evaluator order.
    pub fn alerts(&self) -> impl Iterator<Item = &Alert> {
        self.attempts.iter().filter_map(|a| a.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &FailedAlert> {
        self.attempts.iter().filter_map(|a| a.as_ref().err())
    }

    /// Splits into the reading and its persisted alerts, discarding failure details.
    pub fn into_reading_and_alerts(self) -> (VitalReading, Vec<Alert>) {
        let alerts = self.attempts.into_iter().filter_map(Result::ok).collect();
        (self.reading, alerts)
    }
}

/// Payload of the `vital_alert` event.
#[derive(Clone, Debug, Serialize)]
pub struct VitalAlertBatch<'a> {
    pub patient_id: RecordId,
    pub alerts: Vec<&'a Alert>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone)]
pub struct VitalIngestionPipeline {
    store: Arc<dyn DocumentStore>,
    patients: PatientService,
    staff: StaffService,
    alerts: AlertService,
    notifier: Arc<dyn Notifier>,
}

impl VitalIngestionPipeline {
    pub fn new(store: Arc<dyn DocumentStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            patients: PatientService::new(store.clone(), notifier.clone()),
            staff: StaffService::new(store.clone()),
            alerts: AlertService::new(store.clone()),
            store,
            notifier,
        }
    }

    /// Records a reading for `patient_id` on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the caller's role may not record vitals, the caller is neither an
    ///   administrator nor assigned to the patient, or the caller is not a registered staff
    ///   member holding that role,
    /// - `NotFound` if the patient does not exist,
    /// - `InvalidInput` if the payload fails validation,
    /// - `Persistence` if the reading itself cannot be written.
    ///
    /// None of these leave anything persisted. Alert and notification failures are reported
    /// in the returned [`RecordOutcome`] instead.
    pub fn record(
        &self,
        caller: &Caller,
        patient_id: &RecordId,
        payload: VitalReadingPayload,
    ) -> CoreResult<RecordOutcome> {
        ensure_role(caller, Role::CLINICAL)?;
        let patient = self.patients.find(patient_id)?;
        ensure_clinical_access(caller, &patient)?;
        let recorder = self.resolve_recorder(caller)?;

        validate_measurements(&payload.measurements)?;
        let notes = payload
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        validate_notes(notes.as_deref())?;

        let reading = VitalReading {
            id: RecordId::new(),
            patient_id: patient.id,
            recorded_by: recorder.id,
            measurements: payload.measurements,
            notes,
            recorded_at: Utc::now(),
        };
        put_document(self.store.as_ref(), Collection::Vitals, &reading.id, &reading)
            .map_err(CoreError::persistence(Collection::Vitals))?;
        tracing::info!(
            patient_id = %patient.id,
            reading_id = %reading.id,
            recorded_by = %caller.id,
            "vital reading persisted"
        );

        let attempts: Vec<AlertAttempt> = evaluate(&reading.measurements)
            .into_iter()
            .map(|draft| self.persist_alert(&patient, draft))
            .collect();

        let mut outcome = RecordOutcome {
            reading,
            attempts,
            publications: Vec::new(),
        };
        outcome.publications = self.publish_batch(&patient, &outcome);

        tracing::info!(
            patient_id = %patient.id,
            reading_id = %outcome.reading.id,
            alerts = outcome.alerts().count(),
            failed = outcome.failures().count(),
            topics = outcome.publications.len(),
            "vital ingestion complete"
        );
        Ok(outcome)
    }

    /// The staff member the reading is attributed to.
    fn resolve_recorder(&self, caller: &Caller) -> CoreResult<StaffMember> {
        let member = match self.staff.get(&caller.id) {
            Ok(member) => member,
            Err(CoreError::NotFound { .. }) => {
                return Err(CoreError::Forbidden(format!(
                    "caller {} is not a registered staff member",
                    caller.id
                )))
            }
            Err(e) => return Err(e),
        };
        if member.role != caller.role {
            return Err(CoreError::Forbidden(format!(
                "caller {} is registered as {}, not {}",
                caller.id, member.role, caller.role
            )));
        }
        Ok(member)
    }

    fn persist_alert(&self, patient: &Patient, draft: AlertDraft) -> AlertAttempt {
        match self.alerts.create_from_draft(patient.id, &draft) {
            Ok(alert) => Ok(alert),
            Err(error) => {
                tracing::warn!(
                    patient_id = %patient.id,
                    title = %draft.title,
                    "failed to persist alert: {}",
                    error
                );
                Err(FailedAlert { draft, error })
            }
        }
    }

    /// Publishes the persisted alerts to the care team. Returns one entry per topic tried.
    fn publish_batch(&self, patient: &Patient, outcome: &RecordOutcome) -> Vec<Publication> {
        let alerts: Vec<&Alert> = outcome.alerts().collect();
        if alerts.is_empty() {
            return Vec::new();
        }

        let batch = VitalAlertBatch {
            patient_id: patient.id,
            alerts,
            timestamp: Utc::now(),
        };
        let payload = match serde_json::to_value(&batch) {
            Ok(payload) => payload,
            Err(source) => {
                tracing::warn!(patient_id = %patient.id, "failed to encode vital alert batch: {}", source);
                return patient
                    .care_team_topics()
                    .into_iter()
                    .map(|topic| Publication {
                        topic,
                        result: Err(NotifyError::Unavailable("batch could not be encoded".into())),
                    })
                    .collect();
            }
        };

        patient
            .care_team_topics()
            .into_iter()
            .map(|topic| {
                let result = self.notifier.publish(&topic, VITAL_ALERT_EVENT, &payload);
                match &result {
                    Ok(delivery) => tracing::debug!(
                        topic = %topic,
                        delivered = delivery.delivered,
                        dropped = delivery.dropped,
                        "vital alert published"
                    ),
                    Err(e) => tracing::warn!(topic = %topic, "vital alert not delivered: {}", e),
                }
                Publication { topic, result }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{AlertFilter, Severity};
    use crate::patients::{Gender, NewPatient, StaffAssignment};
    use crate::repositories::store::list_documents;
    use crate::repositories::MemoryStore;
    use crate::staff::NewStaffMember;
    use crate::test_support::{FailingNotifier, FailingStore, RecordingNotifier};
    use crate::vitals::VitalMeasurements;
    use chrono::NaiveDate;

    struct Ward {
        store: Arc<dyn DocumentStore>,
        patients: PatientService,
        admin: Caller,
        doctor: Caller,
        nurse: Caller,
    }

    impl Ward {
        fn new(store: Arc<dyn DocumentStore>) -> Self {
            let operator = Caller::operator();
            let staff = StaffService::new(store.clone());
            let hire = |role: Role| {
                let member = staff
                    .register(
                        &operator,
                        NewStaffMember {
                            full_name: format!("Ward {role}"),
                            role,
                            license_number: Some("RN445566".into()),
                            department: None,
                        },
                    )
                    .unwrap();
                Caller::new(member.id, role)
            };
            let admin = hire(Role::Admin);
            let doctor = hire(Role::Doctor);
            let nurse = hire(Role::Nurse);
            Self {
                patients: PatientService::new(store.clone(), Arc::new(RecordingNotifier::default())),
                store,
                admin,
                doctor,
                nurse,
            }
        }

        fn admit(&self, assignment: StaffAssignment) -> Patient {
            let patient = self
                .patients
                .register(
                    &self.admin,
                    NewPatient {
                        full_name: "Tomas Lindqvist".into(),
                        date_of_birth: NaiveDate::from_ymd_opt(1948, 11, 3).unwrap(),
                        gender: Gender::Male,
                    },
                )
                .unwrap();
            if assignment.doctor.is_none() && assignment.nurse.is_none() {
                return patient;
            }
            self.patients
                .assign_staff(&self.admin, &patient.id, assignment)
                .unwrap()
        }

        fn full_team(&self) -> StaffAssignment {
            StaffAssignment {
                doctor: Some(self.doctor.id),
                nurse: Some(self.nurse.id),
            }
        }

        fn count(&self, collection: Collection) -> usize {
            self.store.list(collection).unwrap().len()
        }
    }

    fn payload(measurements: VitalMeasurements) -> VitalReadingPayload {
        VitalReadingPayload {
            measurements,
            notes: None,
        }
    }

    #[test]
    fn in_range_reading_stores_one_reading_and_no_alerts() {
        let ward = Ward::new(Arc::new(MemoryStore::new()));
        let patient = ward.admit(ward.full_team());
        let notifier = Arc::new(RecordingNotifier::default());
        let pipeline = VitalIngestionPipeline::new(ward.store.clone(), notifier.clone());

        let outcome = pipeline
            .record(
                &ward.doctor,
                &patient.id,
                payload(VitalMeasurements {
                    heart_rate: Some(70.0),
                    ..Default::default()
                }),
            )
            .unwrap();

        assert_eq!(outcome.alerts().count(), 0);
        assert!(outcome.publications.is_empty());
        assert_eq!(outcome.reading.recorded_by, ward.doctor.id);
        assert_eq!(ward.count(Collection::Vitals), 1);
        assert_eq!(ward.count(Collection::Alerts), 0);
        assert!(notifier.published().is_empty());
    }

    #[test]
    fn low_oxygen_creates_critical_alert_and_notifies_each_assignee() {
        let ward = Ward::new(Arc::new(MemoryStore::new()));
        let patient = ward.admit(ward.full_team());
        let notifier = Arc::new(RecordingNotifier::default());
        let pipeline = VitalIngestionPipeline::new(ward.store.clone(), notifier.clone());

        let outcome = pipeline
            .record(
                &ward.nurse,
                &patient.id,
                payload(VitalMeasurements {
                    oxygen_saturation: Some(85.0),
                    ..Default::default()
                }),
            )
            .unwrap();

        let alerts: Vec<&Alert> = outcome.alerts().collect();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[0].patient_id, patient.id);
        assert_eq!(ward.count(Collection::Alerts), 1);

        let published = notifier.published();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].0, Topic::Doctor(ward.doctor.id));
        assert_eq!(published[1].0, Topic::Nurse(ward.nurse.id));
        for (_, event, body) in &published {
            assert_eq!(event, VITAL_ALERT_EVENT);
            assert_eq!(body["patient_id"], patient.id.to_string());
            assert_eq!(body["alerts"].as_array().unwrap().len(), 1);
            assert!(body["timestamp"].is_string());
        }
    }

    #[test]
    fn missing_assignment_skips_its_topic() {
        let ward = Ward::new(Arc::new(MemoryStore::new()));
        let patient = ward.admit(StaffAssignment {
            doctor: Some(ward.doctor.id),
            nurse: None,
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let pipeline = VitalIngestionPipeline::new(ward.store.clone(), notifier.clone());

        pipeline
            .record(
                &ward.admin,
                &patient.id,
                payload(VitalMeasurements {
                    heart_rate: Some(105.0),
                    blood_pressure_systolic: Some(145.0),
                    ..Default::default()
                }),
            )
            .unwrap();

        let published = notifier.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, Topic::Doctor(ward.doctor.id));
        assert_eq!(published[0].2["alerts"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn unknown_patient_is_not_found_and_persists_nothing() {
        let ward = Ward::new(Arc::new(MemoryStore::new()));
        let pipeline =
            VitalIngestionPipeline::new(ward.store.clone(), Arc::new(RecordingNotifier::default()));

        let result = pipeline.record(
            &ward.admin,
            &RecordId::new(),
            payload(VitalMeasurements {
                oxygen_saturation: Some(85.0),
                ..Default::default()
            }),
        );
        assert!(matches!(result, Err(CoreError::NotFound { kind: "patient", .. })));
        assert_eq!(ward.count(Collection::Vitals), 0);
        assert_eq!(ward.count(Collection::Alerts), 0);
    }

    #[test]
    fn unassigned_clinician_is_forbidden_and_persists_nothing() {
        let ward = Ward::new(Arc::new(MemoryStore::new()));
        let patient = ward.admit(StaffAssignment {
            doctor: None,
            nurse: Some(ward.nurse.id),
        });
        let pipeline =
            VitalIngestionPipeline::new(ward.store.clone(), Arc::new(RecordingNotifier::default()));

        let result = pipeline.record(
            &ward.doctor,
            &patient.id,
            payload(VitalMeasurements {
                oxygen_saturation: Some(85.0),
                ..Default::default()
            }),
        );
        assert!(matches!(result, Err(CoreError::Forbidden(_))));
        assert_eq!(ward.count(Collection::Vitals), 0);
        assert_eq!(ward.count(Collection::Alerts), 0);
    }

    #[test]
    fn unregistered_recorder_is_forbidden_and_persists_nothing() {
        let ward = Ward::new(Arc::new(MemoryStore::new()));
        let patient = ward.admit(ward.full_team());
        let pipeline =
            VitalIngestionPipeline::new(ward.store.clone(), Arc::new(RecordingNotifier::default()));
        let low_oxygen = || {
            payload(VitalMeasurements {
                oxygen_saturation: Some(85.0),
                ..Default::default()
            })
        };

        let unregistered_admin = Caller::new(RecordId::new(), Role::Admin);
        for caller in [Caller::operator(), unregistered_admin] {
            let result = pipeline.record(&caller, &patient.id, low_oxygen());
            assert!(matches!(result, Err(CoreError::Forbidden(_))));
        }

        let nurse_claiming_doctor = Caller::new(ward.nurse.id, Role::Doctor);
        let result = pipeline.record(&nurse_claiming_doctor, &patient.id, low_oxygen());
        assert!(matches!(result, Err(CoreError::Forbidden(_))));

        assert_eq!(ward.count(Collection::Vitals), 0);
        assert_eq!(ward.count(Collection::Alerts), 0);
    }

    #[test]
    fn recorded_by_resolves_to_staff_member() {
        let ward = Ward::new(Arc::new(MemoryStore::new()));
        let patient = ward.admit(ward.full_team());
        let pipeline =
            VitalIngestionPipeline::new(ward.store.clone(), Arc::new(RecordingNotifier::default()));

        let outcome = pipeline
            .record(&ward.admin, &patient.id, payload(VitalMeasurements::default()))
            .unwrap();
        let recorder = StaffService::new(ward.store.clone())
            .get(&outcome.reading.recorded_by)
            .unwrap();
        assert_eq!(recorder.id, ward.admin.id);
        assert_eq!(recorder.role, Role::Admin);
    }

    #[test]
    fn invalid_payload_persists_nothing() {
        let ward = Ward::new(Arc::new(MemoryStore::new()));
        let patient = ward.admit(ward.full_team());
        let pipeline =
            VitalIngestionPipeline::new(ward.store.clone(), Arc::new(RecordingNotifier::default()));

        let result = pipeline.record(
            &ward.doctor,
            &patient.id,
            payload(VitalMeasurements {
                oxygen_saturation: Some(120.0),
                ..Default::default()
            }),
        );
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
        assert_eq!(ward.count(Collection::Vitals), 0);
    }

    #[test]
    fn alert_store_failure_keeps_reading() {
        let store = Arc::new(FailingStore::failing(Collection::Alerts));
        let ward = Ward::new(store.clone());
        let patient = ward.admit(ward.full_team());
        let notifier = Arc::new(RecordingNotifier::default());
        let pipeline = VitalIngestionPipeline::new(store.clone(), notifier.clone());

        let outcome = pipeline
            .record(
                &ward.doctor,
                &patient.id,
                payload(VitalMeasurements {
                    heart_rate: Some(105.0),
                    oxygen_saturation: Some(85.0),
                    ..Default::default()
                }),
            )
            .unwrap();

        assert_eq!(outcome.attempts.len(), 2);
        assert_eq!(outcome.alerts().count(), 0);
        assert_eq!(outcome.failures().count(), 2);
        assert!(notifier.published().is_empty());

        let stored: Vec<VitalReading> =
            list_documents(store.as_ref(), Collection::Vitals).unwrap();
        assert_eq!(stored, vec![outcome.reading.clone()]);
        let alerts = AlertService::new(store.clone());
        assert!(alerts.list(&ward.admin, AlertFilter::all()).unwrap().is_empty());
    }

    #[test]
    fn reading_store_failure_aborts() {
        let store = Arc::new(FailingStore::failing(Collection::Vitals));
        let ward = Ward::new(store.clone());
        let patient = ward.admit(ward.full_team());
        let pipeline =
            VitalIngestionPipeline::new(store.clone(), Arc::new(RecordingNotifier::default()));

        let result = pipeline.record(
            &ward.doctor,
            &patient.id,
            payload(VitalMeasurements {
                oxygen_saturation: Some(85.0),
                ..Default::default()
            }),
        );
        assert!(matches!(
            result,
            Err(CoreError::Persistence {
                collection: Collection::Vitals,
                ..
            })
        ));
        assert_eq!(ward.count(Collection::Alerts), 0);
    }

    #[test]
    fn notifier_failure_does_not_fail_record() {
        let ward = Ward::new(Arc::new(MemoryStore::new()));
        let patient = ward.admit(ward.full_team());
        let pipeline = VitalIngestionPipeline::new(ward.store.clone(), Arc::new(FailingNotifier));

        let outcome = pipeline
            .record(
                &ward.doctor,
                &patient.id,
                payload(VitalMeasurements {
                    temperature: Some(103.0),
                    ..Default::default()
                }),
            )
            .unwrap();

        assert_eq!(outcome.alerts().count(), 1);
        assert_eq!(outcome.publications.len(), 2);
        assert!(outcome.publications.iter().all(|p| p.result.is_err()));
        assert_eq!(ward.count(Collection::Alerts), 1);
    }

    #[test]
    fn notes_are_trimmed_and_blank_notes_dropped() {
        let ward = Ward::new(Arc::new(MemoryStore::new()));
        let patient = ward.admit(ward.full_team());
        let pipeline =
            VitalIngestionPipeline::new(ward.store.clone(), Arc::new(RecordingNotifier::default()));

        let outcome = pipeline
            .record(
                &ward.doctor,
                &patient.id,
                VitalReadingPayload {
                    measurements: VitalMeasurements::default(),
                    notes: Some("  resting  ".into()),
                },
            )
            .unwrap();
        assert_eq!(outcome.reading.notes.as_deref(), Some("resting"));

        let blank = pipeline
            .record(
                &ward.doctor,
                &patient.id,
                VitalReadingPayload {
                    measurements: VitalMeasurements::default(),
                    notes: Some("   ".into()),
                },
            )
            .unwrap();
        assert_eq!(blank.reading.notes, None);
    }
}
