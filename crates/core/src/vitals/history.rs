//! Reading history and daily trends for one patient.

use super::evaluator::evaluate;
use super::{Channel, VitalMeasurements, VitalReading};
use crate::access::{ensure_clinical_access, ensure_role, Caller};
use crate::notifier::Notifier;
use crate::patients::PatientService;
use crate::repositories::store::{list_documents, Collection, DocumentStore};
use crate::{CoreError, CoreResult};
use chrono::NaiveDate;
use medairon_types::Role;
use medairon_uuid::RecordId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Aggregate of one patient's readings over one UTC calendar day.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DailyTrend {
    pub date: NaiveDate,
    pub reading_count: usize,
    /// Mean of each channel over the readings where it was present; `None` if it never was.
    pub averages: VitalMeasurements,
    /// Readings that triggered at least one threshold rule.
    pub alert_readings: usize,
}

#[derive(Clone)]
pub struct VitalsService {
    store: Arc<dyn DocumentStore>,
    patients: PatientService,
}

impl VitalsService {
    pub fn new(store: Arc<dyn DocumentStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            patients: PatientService::new(store.clone(), notifier),
            store,
        }
    }

    /// A patient's readings, most recent first.
    ///
    /// # Errors
    ///
    /// Same access rules as recording: `Forbidden` for callers who may not see the patient,
    /// `NotFound` for an unknown patient.
    pub fn list(&self, caller: &Caller, patient_id: &RecordId) -> CoreResult<Vec<VitalReading>> {
        ensure_role(caller, Role::CLINICAL)?;
        let patient = self.patients.find(patient_id)?;
        ensure_clinical_access(caller, &patient)?;

        let mut readings = self.readings_of(&patient.id)?;
        readings.sort_by(|a, b| {
            b.recorded_at
                .cmp(&a.recorded_at)
                .then(b.id.cmp(&a.id))
        });
        Ok(readings)
    }

    /// Per-day aggregates, oldest day first.
    ///
    /// # Errors
    ///
    /// Same as [`VitalsService::list`].
    pub fn trends(&self, caller: &Caller, patient_id: &RecordId) -> CoreResult<Vec<DailyTrend>> {
        ensure_role(caller, Role::CLINICAL)?;
        let patient = self.patients.find(patient_id)?;
        ensure_clinical_access(caller, &patient)?;

        Ok(daily_trends(&self.readings_of(&patient.id)?))
    }

    fn readings_of(&self, patient_id: &RecordId) -> CoreResult<Vec<VitalReading>> {
        let all: Vec<VitalReading> = list_documents(self.store.as_ref(), Collection::Vitals)
            .map_err(CoreError::persistence(Collection::Vitals))?;
        Ok(all
            .into_iter()
            .filter(|r| &r.patient_id == patient_id)
            .collect())
    }
}

#[derive(Default)]
struct DayAccumulator {
    readings: usize,
    alert_readings: usize,
    sums: [f64; Channel::ALL.len()],
    counts: [usize; Channel::ALL.len()],
}

impl DayAccumulator {
    fn add(&mut self, reading: &VitalReading) {
        self.readings += 1;
        if !evaluate(&reading.measurements).is_empty() {
            self.alert_readings += 1;
        }
        for (i, channel) in Channel::ALL.iter().enumerate() {
            if let Some(value) = reading.measurements.value(*channel) {
                self.sums[i] += value;
                self.counts[i] += 1;
            }
        }
    }

    fn average(&self, channel: Channel) -> Option<f64> {
        let i = Channel::ALL.iter().position(|c| *c == channel)?;
        (self.counts[i] > 0).then(|| self.sums[i] / self.counts[i] as f64)
    }

    fn finish(self, date: NaiveDate) -> DailyTrend {
        let averages = VitalMeasurements {
            heart_rate: self.average(Channel::HeartRate),
            blood_pressure_systolic: self.average(Channel::BloodPressureSystolic),
            blood_pressure_diastolic: self.average(Channel::BloodPressureDiastolic),
            temperature: self.average(Channel::Temperature),
            oxygen_saturation: self.average(Channel::OxygenSaturation),
            respiratory_rate: self.average(Channel::RespiratoryRate),
            glucose_level: self.average(Channel::GlucoseLevel),
        };
        DailyTrend {
            date,
            reading_count: self.readings,
            averages,
            alert_readings: self.alert_readings,
        }
    }
}

/// Groups readings by UTC day. Alert-bearing readings are recomputed from the rule table so
/// stored readings never need to reference their alerts.
pub fn daily_trends(readings: &[VitalReading]) -> Vec<DailyTrend> {
    let mut days: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();
    for reading in readings {
        days.entry(reading.recorded_at.date_naive())
            .or_default()
            .add(reading);
    }
    days.into_iter()
        .map(|(date, acc)| acc.finish(date))
        .collect()
}
