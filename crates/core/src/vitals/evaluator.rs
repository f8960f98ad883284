//! Alert evaluation.
//!
//! Pure and deterministic: no I/O, no clock. Every satisfied rule yields one draft, in rule
//! table order, with no suppression or deduplication.

use super::thresholds::{ThresholdRule, THRESHOLD_RULES};
use super::VitalMeasurements;
use crate::alerts::AlertDraft;

/// Evaluate a reading against the standard rule table.
pub fn evaluate(measurements: &VitalMeasurements) -> Vec<AlertDraft> {
    evaluate_with(THRESHOLD_RULES, measurements)
}

/// Evaluate a reading against an explicit rule table.
///
/// Channels absent from the reading contribute nothing.
pub fn evaluate_with(rules: &[ThresholdRule], measurements: &VitalMeasurements) -> Vec<AlertDraft> {
    rules
        .iter()
        .filter(|rule| {
            measurements
                .value(rule.channel)
                .is_some_and(|value| rule.is_violated_by(value))
        })
        .map(AlertDraft::from_rule)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::Severity;
    use crate::vitals::thresholds::Comparison;
    use crate::vitals::Channel;

    fn only(channel: Channel, value: f64) -> VitalMeasurements {
        let mut m = VitalMeasurements::default();
        match channel {
            Channel::HeartRate => m.heart_rate = Some(value),
            Channel::BloodPressureSystolic => m.blood_pressure_systolic = Some(value),
            Channel::BloodPressureDiastolic => m.blood_pressure_diastolic = Some(value),
            Channel::Temperature => m.temperature = Some(value),
            Channel::OxygenSaturation => m.oxygen_saturation = Some(value),
            Channel::RespiratoryRate => m.respiratory_rate = Some(value),
            Channel::GlucoseLevel => m.glucose_level = Some(value),
        }
        m
    }

    #[test]
    fn empty_reading_yields_no_drafts() {
        assert!(evaluate(&VitalMeasurements::default()).is_empty());
    }

    #[test]
    fn in_range_reading_yields_no_drafts() {
        let m = VitalMeasurements {
            heart_rate: Some(70.0),
            blood_pressure_systolic: Some(120.0),
            blood_pressure_diastolic: Some(80.0),
            temperature: Some(98.6),
            oxygen_saturation: Some(97.0),
            respiratory_rate: Some(16.0),
            glucose_level: Some(110.0),
        };
        assert!(evaluate(&m).is_empty());
    }

    #[test]
    fn single_violation_matches_rule_severity() {
        for rule in THRESHOLD_RULES {
            let value = match rule.comparison {
                Comparison::Above => rule.bound + 1.0,
                Comparison::Below => rule.bound - 1.0,
            };
            let drafts = evaluate(&only(rule.channel, value));
            assert_eq!(drafts.len(), 1, "{}", rule.title);
            assert_eq!(drafts[0].severity, rule.severity);
            assert_eq!(drafts[0].title, rule.title);
        }
    }

    #[test]
    fn multiple_violations_keep_table_order() {
        let m = VitalMeasurements {
            heart_rate: Some(105.0),
            blood_pressure_systolic: Some(145.0),
            ..Default::default()
        };
        let drafts = evaluate(&m);
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].title, "High Heart Rate");
        assert_eq!(drafts[0].severity, Severity::Critical);
        assert_eq!(drafts[1].title, "High Systolic BP");
        assert_eq!(drafts[1].severity, Severity::Warning);
    }

    #[test]
    fn low_oxygen_is_critical() {
        let drafts = evaluate(&only(Channel::OxygenSaturation, 85.0));
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].severity, Severity::Critical);
        assert_eq!(drafts[0].title, "Low Oxygen Saturation");
    }

    #[test]
    fn zero_reading_is_evaluated() {
        let drafts = evaluate(&only(Channel::HeartRate, 0.0));
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "Low Heart Rate");
    }
}
