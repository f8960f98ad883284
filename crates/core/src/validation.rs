//! Input validation utilities.
//!
//! These checks run before anything is persisted, so a rejected payload never leaves a partial
//! record behind.

use crate::constants::MAX_NOTES_LEN;
use crate::vitals::{Channel, VitalMeasurements};
use crate::{CoreError, CoreResult};

/// Validates a professional license number: 6 to 12 characters of `A-Z` or `0-9`.
///
/// # Errors
///
/// Returns `CoreError::InvalidInput` if the license number is malformed.
pub fn validate_license_number(license: &str) -> CoreResult<()> {
    let ok = (6..=12).contains(&license.len())
        && license
            .bytes()
            .all(|b| matches!(b, b'A'..=b'Z' | b'0'..=b'9'));

    if !ok {
        return Err(CoreError::InvalidInput(
            "license_number must be 6-12 uppercase letters or digits".into(),
        ));
    }
    Ok(())
}

/// Validates the structural and range constraints of a vital-sign payload.
///
/// Every present channel must be a finite, non-negative number; oxygen saturation must also
/// not exceed 100. Absent channels are always valid.
///
/// # Errors
///
/// Returns `CoreError::InvalidInput` naming the first offending channel.
pub fn validate_measurements(measurements: &VitalMeasurements) -> CoreResult<()> {
    for channel in Channel::ALL {
        let Some(value) = measurements.value(channel) else {
            continue;
        };

        if !value.is_finite() {
            return Err(CoreError::InvalidInput(format!(
                "{channel} must be a finite number"
            )));
        }
        if value < 0.0 {
            return Err(CoreError::InvalidInput(format!(
                "{channel} cannot be negative"
            )));
        }
        if channel == Channel::OxygenSaturation && value > 100.0 {
            return Err(CoreError::InvalidInput(format!(
                "{channel} cannot exceed 100"
            )));
        }
    }
    Ok(())
}

pub fn validate_notes(notes: Option<&str>) -> CoreResult<()> {
    match notes {
        Some(n) if n.chars().count() > MAX_NOTES_LEN => Err(CoreError::InvalidInput(format!(
            "notes exceed maximum length of {MAX_NOTES_LEN} characters"
        ))),
        _ => Ok(()),
    }
}
