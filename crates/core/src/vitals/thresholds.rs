//! Clinical threshold rules.
//!
//! Bounds are exclusive: a heart rate of exactly 100 bpm does not fire the `> 100` rule.
//! Temperatures are in °F, blood pressure in mmHg, glucose in mg/dL.

use super::Channel;
use crate::alerts::Severity;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    /// Fires when the value is strictly greater than the bound.
    Above,
    /// Fires when the value is strictly less than the bound.
    Below,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThresholdRule {
    pub channel: Channel,
    pub comparison: Comparison,
    pub bound: f64,
    pub severity: Severity,
    pub title: &'static str,
    pub message: &'static str,
}

impl ThresholdRule {
    pub fn is_violated_by(&self, value: f64) -> bool {
        match self.comparison {
            Comparison::Above => value > self.bound,
            Comparison::Below => value < self.bound,
        }
    }
}

const fn rule(
    channel: Channel,
    comparison: Comparison,
    bound: f64,
    severity: Severity,
    title: &'static str,
    message: &'static str,
) -> ThresholdRule {
    ThresholdRule {
        channel,
        comparison,
        bound,
        severity,
        title,
        message,
    }
}

/// The rule table, ordered by channel and, within a channel, high bound before low bound.
///
/// Oxygen saturation has no upper rule: it cannot exceed 100%.
pub const THRESHOLD_RULES: &[ThresholdRule] = &[
    rule(
        Channel::HeartRate,
        Comparison::Above,
        100.0,
        Severity::Critical,
        "High Heart Rate",
        "Heart rate exceeds maximum threshold (100 bpm).",
    ),
    rule(
        Channel::HeartRate,
        Comparison::Below,
        60.0,
        Severity::Warning,
        "Low Heart Rate",
        "Heart rate below minimum threshold (60 bpm).",
    ),
    rule(
        Channel::BloodPressureSystolic,
        Comparison::Above,
        140.0,
        Severity::Warning,
        "High Systolic BP",
        "Systolic blood pressure exceeds maximum (140 mmHg).",
    ),
    rule(
        Channel::BloodPressureSystolic,
        Comparison::Below,
        90.0,
        Severity::Critical,
        "Low Systolic BP",
        "Systolic blood pressure below minimum (90 mmHg).",
    ),
    rule(
        Channel::BloodPressureDiastolic,
        Comparison::Above,
        90.0,
        Severity::Warning,
        "High Diastolic BP",
        "Diastolic blood pressure exceeds maximum (90 mmHg).",
    ),
    rule(
        Channel::BloodPressureDiastolic,
        Comparison::Below,
        60.0,
        Severity::Critical,
        "Low Diastolic BP",
        "Diastolic blood pressure below minimum (60 mmHg).",
    ),
    rule(
        Channel::Temperature,
        Comparison::Above,
        100.4,
        Severity::Warning,
        "High Temperature",
        "Temperature exceeds maximum (100.4°F).",
    ),
    rule(
        Channel::Temperature,
        Comparison::Below,
        95.0,
        Severity::Critical,
        "Low Temperature",
        "Temperature below minimum (95°F).",
    ),
    rule(
        Channel::OxygenSaturation,
        Comparison::Below,
        90.0,
        Severity::Critical,
        "Low Oxygen Saturation",
        "Oxygen saturation below minimum (90%).",
    ),
    rule(
        Channel::RespiratoryRate,
        Comparison::Above,
        20.0,
        Severity::Warning,
        "High Respiratory Rate",
        "Respiratory rate exceeds maximum (20 breaths/min).",
    ),
    rule(
        Channel::RespiratoryRate,
        Comparison::Below,
        12.0,
        Severity::Critical,
        "Low Respiratory Rate",
        "Respiratory rate below minimum (12 breaths/min).",
    ),
    rule(
        Channel::GlucoseLevel,
        Comparison::Above,
        180.0,
        Severity::Warning,
        "High Glucose Level",
        "Glucose level exceeds maximum (180 mg/dL).",
    ),
    rule(
        Channel::GlucoseLevel,
        Comparison::Below,
        70.0,
        Severity::Critical,
        "Low Glucose Level",
        "Glucose level below minimum (70 mg/dL).",
    ),
];

/// Rules for one channel, in table order.
pub fn rules_for(channel: Channel) -> impl Iterator<Item = &'static ThresholdRule> {
    THRESHOLD_RULES.iter().filter(move |r| r.channel == channel)
}
