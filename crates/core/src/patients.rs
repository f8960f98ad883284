//! Patient records and staff assignment.
//!
//! The vital-sign subsystem only reads patients: it needs the assigned doctor and nurse to
//! authorise writers and to route notifications. Registration and assignment live here so the
//! system can be exercised end to end.

use crate::access::{ensure_clinical_access, ensure_role, Caller};
use crate::constants::PATIENT_ASSIGNED_EVENT;
use crate::notifier::{Notifier, NotifyError, Topic};
use crate::repositories::store::{get_document, put_document, Collection, DocumentStore};
use crate::staff::StaffService;
use crate::{CoreError, CoreResult};
use chrono::{DateTime, NaiveDate, Utc};
use medairon_types::{NonEmptyText, Role};
use medairon_uuid::RecordId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl FromStr for Gender {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(CoreError::InvalidInput(format!(
                "gender must be male, female or other, got '{other}'"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatientStatus {
    #[default]
    Active,
    Discharged,
    Transferred,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Patient {
    pub id: RecordId,
    pub full_name: NonEmptyText,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    #[serde(default)]
    pub status: PatientStatus,
    #[serde(default)]
    pub assigned_doctor: Option<RecordId>,
    #[serde(default)]
    pub assigned_nurse: Option<RecordId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    /// Notification topics of the staff clinically responsible for this patient.
    ///
    /// Doctor first, then nurse; an absent assignment contributes no topic.
    pub fn care_team_topics(&self) -> Vec<Topic> {
        self.assigned_doctor
            .map(Topic::Doctor)
            .into_iter()
            .chain(self.assigned_nurse.map(Topic::Nurse))
            .collect()
    }
}

/// Input for [`PatientService::register`].
#[derive(Clone, Debug)]
pub struct NewPatient {
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
}

/// Requested staff assignment. Absent fields keep the current assignment.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaffAssignment {
    pub doctor: Option<RecordId>,
    pub nurse: Option<RecordId>,
}

/// Payload of the `patient:assigned` event.
#[derive(Clone, Debug, Serialize)]
struct PatientAssigned {
    patient_id: RecordId,
    assigned_doctor: Option<RecordId>,
    assigned_nurse: Option<RecordId>,
}

impl PatientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatientStatus::Active => "active",
            PatientStatus::Discharged => "discharged",
            PatientStatus::Transferred => "transferred",
        }
    }
}

#[derive(Clone)]
pub struct PatientService {
    store: Arc<dyn DocumentStore>,
    staff: StaffService,
    notifier: Arc<dyn Notifier>,
    // Serialises care-team read-modify-write so partial assignments cannot overwrite each other.
    assignments: Arc<Mutex<()>>,
}

impl PatientService {
    pub fn new(store: Arc<dyn DocumentStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            staff: StaffService::new(store.clone()),
            store,
            notifier,
            assignments: Arc::new(Mutex::new(())),
        }
    }

    /// Registers a new patient with no care team. Administrators only.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the caller is not an administrator,
    /// - `InvalidInput` if the name is blank or the date of birth is in the future,
    /// - `Persistence` if the record cannot be written.
    pub fn register(&self, caller: &Caller, new: NewPatient) -> CoreResult<Patient> {
        ensure_role(caller, &[Role::Admin])?;

        let full_name = NonEmptyText::new(&new.full_name)?;
        let now = Utc::now();
        if new.date_of_birth > now.date_naive() {
            return Err(CoreError::InvalidInput(
                "date_of_birth cannot be in the future".into(),
            ));
        }

        let patient = Patient {
            id: RecordId::new(),
            full_name,
            date_of_birth: new.date_of_birth,
            gender: new.gender,
            status: PatientStatus::Active,
            assigned_doctor: None,
            assigned_nurse: None,
            created_at: now,
            updated_at: now,
        };

        self.save(&patient)?;
        tracing::info!(patient_id = %patient.id, "patient registered");
        Ok(patient)
    }

    /// Returns the patient if the caller may see their chart.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-clinical roles or staff not assigned to the patient; `NotFound` if
    /// the id does not resolve.
    pub fn get(&self, caller: &Caller, id: &RecordId) -> CoreResult<Patient> {
        ensure_role(caller, Role::CLINICAL)?;
        let patient = self.find(id)?;
        ensure_clinical_access(caller, &patient)?;
        Ok(patient)
    }

    /// Loads a patient without any access check.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id does not resolve.
    pub fn find(&self, id: &RecordId) -> CoreResult<Patient> {
        get_document(self.store.as_ref(), Collection::Patients, id)
            .map_err(CoreError::persistence(Collection::Patients))?
            .ok_or_else(|| CoreError::not_found("patient", id))
    }

    /// Assigns a doctor and/or nurse to a patient. Administrators only.
    ///
    /// On success a `patient:assigned` event goes to the `admins` topic. That publish is best
    /// effort: a failure is logged and does not undo the assignment.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the caller is not an administrator,
    /// - `InvalidInput` if neither doctor nor nurse is given, or a referenced staff member does
    ///   not exist or has the wrong role,
    /// - `NotFound` if the patient does not exist.
    pub fn assign_staff(
        &self,
        caller: &Caller,
        patient_id: &RecordId,
        assignment: StaffAssignment,
    ) -> CoreResult<Patient> {
        ensure_role(caller, &[Role::Admin])?;

        if assignment.doctor.is_none() && assignment.nurse.is_none() {
            return Err(CoreError::InvalidInput(
                "must assign at least a doctor or a nurse".into(),
            ));
        }
        if let Some(doctor) = assignment.doctor {
            self.ensure_staff_role(&doctor, Role::Doctor)?;
        }
        if let Some(nurse) = assignment.nurse {
            self.ensure_staff_role(&nurse, Role::Nurse)?;
        }

        let patient = {
            let _guard = self.assignments.lock();
            let mut patient = self.find(patient_id)?;
            if assignment.doctor.is_some() {
                patient.assigned_doctor = assignment.doctor;
            }
            if assignment.nurse.is_some() {
                patient.assigned_nurse = assignment.nurse;
            }
            patient.updated_at = Utc::now();
            self.save(&patient)?;
            patient
        };

        tracing::info!(
            patient_id = %patient.id,
            assigned_doctor = ?patient.assigned_doctor.map(|d| d.to_string()),
            assigned_nurse = ?patient.assigned_nurse.map(|n| n.to_string()),
            "care team assigned"
        );
        self.announce_assignment(&patient);

        Ok(patient)
    }

    fn ensure_staff_role(&self, id: &RecordId, expected: Role) -> CoreResult<()> {
        let member = match self.staff.get(id) {
            Ok(member) => member,
            Err(CoreError::NotFound { .. }) => {
                return Err(CoreError::InvalidInput(format!(
                    "assigned {expected} {id} not found"
                )))
            }
            Err(e) => return Err(e),
        };
        if member.role != expected {
            return Err(CoreError::InvalidInput(format!(
                "staff member {id} is a {}, not a {expected}",
                member.role
            )));
        }
        Ok(())
    }

    fn announce_assignment(&self, patient: &Patient) {
        let event = PatientAssigned {
            patient_id: patient.id,
            assigned_doctor: patient.assigned_doctor,
            assigned_nurse: patient.assigned_nurse,
        };
        let topic = Topic::admins();
        let result = serde_json::to_value(&event)
            .map_err(|source| NotifyError::Encode {
                event: PATIENT_ASSIGNED_EVENT.into(),
                source,
            })
            .and_then(|payload| self.notifier.publish(&topic, PATIENT_ASSIGNED_EVENT, &payload));
        if let Err(e) = result {
            tracing::warn!(patient_id = %patient.id, topic = %topic, "assignment notification failed: {}", e);
        }
    }

    fn save(&self, patient: &Patient) -> CoreResult<()> {
        put_document(self.store.as_ref(), Collection::Patients, &patient.id, patient)
            .map_err(CoreError::persistence(Collection::Patients))
    }
}

/// A stored-shape patient with no care team, for tests across the crate.
#[cfg(test)]
pub(crate) fn test_patient() -> Patient {
    let now = Utc::now();
    Patient {
        id: RecordId::new(),
        full_name: NonEmptyText::new("Grace Mensah").unwrap(),
        date_of_birth: NaiveDate::from_ymd_opt(1961, 4, 12).unwrap(),
        gender: Gender::Female,
        status: PatientStatus::Active,
        assigned_doctor: None,
        assigned_nurse: None,
        created_at: now,
        updated_at: now,
    }
}
