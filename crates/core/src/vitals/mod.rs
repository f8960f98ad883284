//! Vital-sign readings and the alerting pipeline built on them.
//!
//! - [`thresholds`]: the fixed clinical rule table
//! - [`evaluator`]: pure reading → alert drafts evaluation
//! - [`ingestion`]: the write path (persist reading, persist alerts, notify care team)
//! - [`history`]: the read path (reading history and daily trends)

pub mod evaluator;
pub mod history;
pub mod ingestion;
pub mod thresholds;

use chrono::{DateTime, Utc};
use medairon_uuid::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One physiological measurement type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    HeartRate,
    BloodPressureSystolic,
    BloodPressureDiastolic,
    Temperature,
    OxygenSaturation,
    RespiratoryRate,
    GlucoseLevel,
}

impl Channel {
    /// All channels in evaluation order.
    pub const ALL: [Channel; 7] = [
        Channel::HeartRate,
        Channel::BloodPressureSystolic,
        Channel::BloodPressureDiastolic,
        Channel::Temperature,
        Channel::OxygenSaturation,
        Channel::RespiratoryRate,
        Channel::GlucoseLevel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::HeartRate => "heart_rate",
            Channel::BloodPressureSystolic => "blood_pressure_systolic",
            Channel::BloodPressureDiastolic => "blood_pressure_diastolic",
            Channel::Temperature => "temperature",
            Channel::OxygenSaturation => "oxygen_saturation",
            Channel::RespiratoryRate => "respiratory_rate",
            Channel::GlucoseLevel => "glucose_level",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel values of one observation.
///
/// `None` means "not measured"; `Some(0.0)` is a real zero reading and is evaluated like any
/// other value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VitalMeasurements {
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
}

impl VitalMeasurements {
    pub fn value(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::HeartRate => self.heart_rate,
            Channel::BloodPressureSystolic => self.blood_pressure_systolic,
            Channel::BloodPressureDiastolic => self.blood_pressure_diastolic,
            Channel::Temperature => self.temperature,
            Channel::OxygenSaturation => self.oxygen_saturation,
            Channel::RespiratoryRate => self.respiratory_rate,
            Channel::GlucoseLevel => self.glucose_level,
        }
    }

    pub fn is_empty(&self) -> bool {
        Channel::ALL.iter().all(|c| self.value(*c).is_none())
    }
}

/// Client-supplied content of a new reading.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VitalReadingPayload {
    pub measurements: VitalMeasurements,
    pub notes: Option<String>,
}

/// One stored observation for one patient. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VitalReading {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub recorded_by: RecordId,
    pub measurements: VitalMeasurements,
    #[serde(default)]
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}
