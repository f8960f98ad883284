//! Wire types for the HTTP API.
//!
//! Identifiers are canonical 32-character hex strings and timestamps are RFC 3339 strings.
//! Request types convert into core inputs with validation; response types convert from core
//! entities.

use chrono::NaiveDate;
use medairon_core::alerts::Alert;
use medairon_core::patients::{NewPatient, Patient, StaffAssignment};
use medairon_core::staff::{NewStaffMember, StaffMember};
use medairon_core::vitals::history::DailyTrend;
use medairon_core::vitals::{VitalMeasurements, VitalReading, VitalReadingPayload};
use medairon_core::{CoreError, CoreResult};
use medairon_types::Role;
use medairon_uuid::RecordId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateStaffReq {
    pub full_name: String,
    /// One of `admin`, `doctor`, `nurse`.
    pub role: String,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

impl CreateStaffReq {
    pub fn into_new_staff(self) -> CoreResult<NewStaffMember> {
        let role: Role = self
            .role
            .parse()
            .map_err(|e: medairon_types::RoleError| CoreError::InvalidInput(e.to_string()))?;
        Ok(NewStaffMember {
            full_name: self.full_name,
            role,
            license_number: self.license_number,
            department: self.department,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StaffRes {
    pub id: String,
    pub full_name: String,
    pub role: String,
    pub license_number: Option<String>,
    pub department: Option<String>,
    pub created_at: String,
}

impl From<&StaffMember> for StaffRes {
    fn from(m: &StaffMember) -> Self {
        Self {
            id: m.id.to_string(),
            full_name: m.full_name.to_string(),
            role: m.role.to_string(),
            license_number: m.license_number.clone(),
            department: m.department.clone(),
            created_at: m.created_at.to_rfc3339(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreatePatientReq {
    pub full_name: String,
    /// `YYYY-MM-DD`
    pub date_of_birth: String,
    /// One of `male`, `female`, `other`.
    pub gender: String,
}

impl CreatePatientReq {
    pub fn into_new_patient(self) -> CoreResult<NewPatient> {
        let date_of_birth = NaiveDate::parse_from_str(self.date_of_birth.trim(), "%Y-%m-%d")
            .map_err(|_| {
                CoreError::InvalidInput(format!(
                    "date_of_birth must be YYYY-MM-DD, got '{}'",
                    self.date_of_birth
                ))
            })?;
        Ok(NewPatient {
            full_name: self.full_name,
            date_of_birth,
            gender: self.gender.parse()?,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PatientRes {
    pub id: String,
    pub full_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub status: String,
    pub assigned_doctor: Option<String>,
    pub assigned_nurse: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Patient> for PatientRes {
    fn from(p: &Patient) -> Self {
        Self {
            id: p.id.to_string(),
            full_name: p.full_name.to_string(),
            date_of_birth: p.date_of_birth.format("%Y-%m-%d").to_string(),
            gender: p.gender.as_str().to_string(),
            status: p.status.as_str().to_string(),
            assigned_doctor: p.assigned_doctor.map(|d| d.to_string()),
            assigned_nurse: p.assigned_nurse.map(|n| n.to_string()),
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AssignStaffReq {
    #[serde(default)]
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub nurse_id: Option<String>,
}

impl AssignStaffReq {
    pub fn into_assignment(self) -> CoreResult<StaffAssignment> {
        Ok(StaffAssignment {
            doctor: self.doctor_id.as_deref().map(RecordId::parse).transpose()?,
            nurse: self.nurse_id.as_deref().map(RecordId::parse).transpose()?,
        })
    }
}

/// Body of `POST /patients/{id}/vitals`. Omitted or `null` channels were not measured.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RecordVitalsReq {
    #[serde(default)]
    pub heart_rate: Option<f64>,
    #[serde(default)]
    pub blood_pressure_systolic: Option<f64>,
    #[serde(default)]
    pub blood_pressure_diastolic: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub oxygen_saturation: Option<f64>,
    #[serde(default)]
    pub respiratory_rate: Option<f64>,
    #[serde(default)]
    pub glucose_level: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<RecordVitalsReq> for VitalReadingPayload {
    fn from(req: RecordVitalsReq) -> Self {
        VitalReadingPayload {
            measurements: VitalMeasurements {
                heart_rate: req.heart_rate,
                blood_pressure_systolic: req.blood_pressure_systolic,
                blood_pressure_diastolic: req.blood_pressure_diastolic,
                temperature: req.temperature,
                oxygen_saturation: req.oxygen_saturation,
                respiratory_rate: req.respiratory_rate,
                glucose_level: req.glucose_level,
            },
            notes: req.notes,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct VitalReadingRes {
    pub id: String,
    pub patient_id: String,
    pub recorded_by: String,
    pub heart_rate: Option<f64>,
    pub blood_pressure_systolic: Option<f64>,
    pub blood_pressure_diastolic: Option<f64>,
    pub temperature: Option<f64>,
    pub oxygen_saturation: Option<f64>,
    pub respiratory_rate: Option<f64>,
    pub glucose_level: Option<f64>,
    pub notes: Option<String>,
    pub recorded_at: String,
}

impl From<&VitalReading> for VitalReadingRes {
    fn from(r: &VitalReading) -> Self {
        let m = &r.measurements;
        Self {
            id: r.id.to_string(),
            patient_id: r.patient_id.to_string(),
            recorded_by: r.recorded_by.to_string(),
            heart_rate: m.heart_rate,
            blood_pressure_systolic: m.blood_pressure_systolic,
            blood_pressure_diastolic: m.blood_pressure_diastolic,
            temperature: m.temperature,
            oxygen_saturation: m.oxygen_saturation,
            respiratory_rate: m.respiratory_rate,
            glucose_level: m.glucose_level,
            notes: r.notes.clone(),
            recorded_at: r.recorded_at.to_rfc3339(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AlertRes {
    pub id: String,
    pub patient_id: String,
    /// One of `critical`, `warning`, `info`.
    pub severity: String,
    pub title: String,
    pub message: String,
    pub created_at: String,
    pub confidence: Option<u8>,
    pub acknowledged: bool,
    pub dismissed: bool,
}

impl From<&Alert> for AlertRes {
    fn from(a: &Alert) -> Self {
        Self {
            id: a.id.to_string(),
            patient_id: a.patient_id.to_string(),
            severity: a.severity.to_string(),
            title: a.title.clone(),
            message: a.message.clone(),
            created_at: a.created_at.to_rfc3339(),
            confidence: a.confidence.map(|c| c.value()),
            acknowledged: a.acknowledged,
            dismissed: a.dismissed,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordVitalsRes {
    pub reading: VitalReadingRes,
    /// Alerts that were persisted for this reading, in rule order.
    pub alerts: Vec<AlertRes>,
}

impl RecordVitalsRes {
    pub fn new(reading: &VitalReading, alerts: &[Alert]) -> Self {
        Self {
            reading: reading.into(),
            alerts: alerts.iter().map(AlertRes::from).collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DailyTrendRes {
    /// `YYYY-MM-DD` (UTC)
    pub date: String,
    pub reading_count: usize,
    pub avg_heart_rate: Option<f64>,
    pub avg_blood_pressure_systolic: Option<f64>,
    pub avg_blood_pressure_diastolic: Option<f64>,
    pub avg_temperature: Option<f64>,
    pub avg_oxygen_saturation: Option<f64>,
    pub avg_respiratory_rate: Option<f64>,
    pub avg_glucose_level: Option<f64>,
    /// Readings that breached at least one threshold.
    pub alert_count: usize,
}

impl From<&DailyTrend> for DailyTrendRes {
    fn from(t: &DailyTrend) -> Self {
        let a = &t.averages;
        Self {
            date: t.date.format("%Y-%m-%d").to_string(),
            reading_count: t.reading_count,
            avg_heart_rate: a.heart_rate,
            avg_blood_pressure_systolic: a.blood_pressure_systolic,
            avg_blood_pressure_diastolic: a.blood_pressure_diastolic,
            avg_temperature: a.temperature,
            avg_oxygen_saturation: a.oxygen_saturation,
            avg_respiratory_rate: a.respiratory_rate,
            avg_glucose_level: a.glucose_level,
            alert_count: t.alert_readings,
        }
    }
}
