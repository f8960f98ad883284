//! Alert lifecycle.
//!
//! Alerts are created by vital ingestion and afterwards only change through two idempotent
//! transitions, [`AlertService::acknowledge`] and [`AlertService::dismiss`]. Nothing deletes an
//! alert; dismissal is a soft, terminal flag.

use crate::access::{ensure_role, Caller};
use crate::repositories::store::{
    get_document, list_documents, put_document, Collection, DocumentStore,
};
use crate::vitals::thresholds::ThresholdRule;
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use medairon_types::Role;
use medairon_uuid::RecordId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An evaluator-produced candidate alert, not yet persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlertDraft {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl AlertDraft {
    pub fn from_rule(rule: &ThresholdRule) -> Self {
        Self {
            severity: rule.severity,
            title: rule.title.to_string(),
            message: rule.message.to_string(),
        }
    }
}

/// Confidence attached to an alert, as a percentage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ConfidenceScore(u8);

impl ConfidenceScore {
    pub const MAX: u8 = 100;

    pub fn new(value: u8) -> CoreResult<Self> {
        if value > Self::MAX {
            return Err(CoreError::InvalidInput(format!(
                "confidence must be between 0 and {}, got {value}",
                Self::MAX
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for ConfidenceScore {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).map_err(|e| e.to_string())
    }
}

impl From<ConfidenceScore> for u8 {
    fn from(score: ConfidenceScore) -> Self {
        score.0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Alert {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub confidence: Option<ConfidenceScore>,
    #[serde(default)]
    pub acknowledged: bool,
    #[serde(default)]
    pub dismissed: bool,
}

/// Selection criteria for [`AlertService::list`]. `None` fields match everything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AlertFilter {
    pub dismissed: Option<bool>,
    pub patient_id: Option<RecordId>,
}

impl AlertFilter {
    /// The active-alerts view: everything not dismissed.
    pub fn active() -> Self {
        Self {
            dismissed: Some(false),
            patient_id: None,
        }
    }

    /// Every alert, dismissed or not.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_patient(mut self, patient_id: RecordId) -> Self {
        self.patient_id = Some(patient_id);
        self
    }

    pub fn matches(&self, alert: &Alert) -> bool {
        self.dismissed.map_or(true, |d| alert.dismissed == d)
            && self.patient_id.map_or(true, |p| alert.patient_id == p)
    }
}

#[derive(Clone)]
pub struct AlertService {
    store: Arc<dyn DocumentStore>,
    // Serialises read-modify-write transitions so concurrent acknowledge/dismiss on the same
    // alert cannot lose a flag.
    transitions: Arc<Mutex<()>>,
}

impl AlertService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            transitions: Arc::new(Mutex::new(())),
        }
    }

    /// Persists a new, unacknowledged alert for `patient_id` from an evaluator draft.
    ///
    /// The caller is responsible for having resolved the patient.
    pub fn create_from_draft(&self, patient_id: RecordId, draft: &AlertDraft) -> CoreResult<Alert> {
        let alert = Alert {
            id: RecordId::new(),
            patient_id,
            severity: draft.severity,
            title: draft.title.clone(),
            message: draft.message.clone(),
            created_at: Utc::now(),
            confidence: None,
            acknowledged: false,
            dismissed: false,
        };
        self.save(&alert)?;
        Ok(alert)
    }

    /// Alerts matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless the caller is an administrator, doctor or nurse.
    pub fn list(&self, caller: &Caller, filter: AlertFilter) -> CoreResult<Vec<Alert>> {
        ensure_role(caller, Role::CLINICAL)?;
        let mut alerts: Vec<Alert> = list_documents(self.store.as_ref(), Collection::Alerts)
            .map_err(CoreError::persistence(Collection::Alerts))?
            .into_iter()
            .filter(|a| filter.matches(a))
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(alerts)
    }

    /// Marks an alert acknowledged. Acknowledging twice succeeds without a write.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-clinical roles, `NotFound` for an unknown id.
    pub fn acknowledge(&self, caller: &Caller, id: &RecordId) -> CoreResult<Alert> {
        self.transition(caller, id, "acknowledged", |alert| {
            std::mem::replace(&mut alert.acknowledged, true)
        })
    }

    /// Marks an alert dismissed. The alert stays stored and is only hidden from the active view.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-clinical roles, `NotFound` for an unknown id.
    pub fn dismiss(&self, caller: &Caller, id: &RecordId) -> CoreResult<Alert> {
        self.transition(caller, id, "dismissed", |alert| {
            std::mem::replace(&mut alert.dismissed, true)
        })
    }

    /// Applies `set_flag`, which returns the flag's previous value, and saves only on change.
    fn transition(
        &self,
        caller: &Caller,
        id: &RecordId,
        action: &'static str,
        set_flag: impl FnOnce(&mut Alert) -> bool,
    ) -> CoreResult<Alert> {
        ensure_role(caller, Role::CLINICAL)?;

        let _guard = self.transitions.lock();
        let mut alert = self.find(id)?;
        let already_set = set_flag(&mut alert);
        if !already_set {
            self.save(&alert)?;
            tracing::info!(alert_id = %alert.id, caller = %caller.id, "alert {}", action);
        }
        Ok(alert)
    }

    fn find(&self, id: &RecordId) -> CoreResult<Alert> {
        get_document(self.store.as_ref(), Collection::Alerts, id)
            .map_err(CoreError::persistence(Collection::Alerts))?
            .ok_or_else(|| CoreError::not_found("alert", id))
    }

    fn save(&self, alert: &Alert) -> CoreResult<()> {
        put_document(self.store.as_ref(), Collection::Alerts, &alert.id, alert)
            .map_err(CoreError::persistence(Collection::Alerts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MemoryStore;
    use crate::test_support::CountingStore;

    fn service() -> AlertService {
        AlertService::new(Arc::new(MemoryStore::new()))
    }

    fn nurse() -> Caller {
        Caller::new(RecordId::new(), Role::Nurse)
    }

    fn draft(title: &str) -> AlertDraft {
        AlertDraft {
            severity: Severity::Critical,
            title: title.into(),
            message: "check patient".into(),
        }
    }

    #[test]
    fn acknowledge_is_idempotent_and_leaves_dismissed() {
        let alerts = service();
        let alert = alerts.create_from_draft(RecordId::new(), &draft("Low Oxygen Saturation")).unwrap();

        let first = alerts.acknowledge(&nurse(), &alert.id).unwrap();
        let second = alerts.acknowledge(&nurse(), &alert.id).unwrap();
        assert!(first.acknowledged);
        assert_eq!(first, second);
        assert!(!second.dismissed);
    }

    #[test]
    fn acknowledging_a_dismissed_alert_keeps_it_dismissed() {
        let store = Arc::new(CountingStore::default());
        let alerts = AlertService::new(store.clone());
        let alert = alerts.create_from_draft(RecordId::new(), &draft("Low Systolic BP")).unwrap();
        alerts.dismiss(&nurse(), &alert.id).unwrap();

        let first = alerts.acknowledge(&nurse(), &alert.id).unwrap();
        assert!(first.acknowledged && first.dismissed);
        let writes = store.writes(Collection::Alerts);

        let second = alerts.acknowledge(&nurse(), &alert.id).unwrap();
        assert_eq!(second, first);
        assert_eq!(store.writes(Collection::Alerts), writes);
        assert_eq!(writes, 3);
    }

    #[test]
    fn dismissed_alert_leaves_active_view_but_is_kept() {
        let alerts = service();
        let patient = RecordId::new();
        let keep = alerts.create_from_draft(patient, &draft("High Heart Rate")).unwrap();
        let gone = alerts.create_from_draft(patient, &draft("Low Heart Rate")).unwrap();

        let dismissed = alerts.dismiss(&nurse(), &gone.id).unwrap();
        assert!(dismissed.dismissed);
        assert!(!dismissed.acknowledged);
        assert!(alerts.dismiss(&nurse(), &gone.id).unwrap().dismissed);

        let active = alerts.list(&nurse(), AlertFilter::active()).unwrap();
        assert_eq!(active.iter().map(|a| a.id).collect::<Vec<_>>(), vec![keep.id]);

        let all = alerts.list(&nurse(), AlertFilter::all()).unwrap();
        assert_eq!(all.len(), 2);
        let only_dismissed = alerts
            .list(
                &nurse(),
                AlertFilter {
                    dismissed: Some(true),
                    patient_id: None,
                },
            )
            .unwrap();
        assert_eq!(only_dismissed.len(), 1);
        assert_eq!(only_dismissed[0].id, gone.id);
    }

    #[test]
    fn acknowledged_alert_can_still_be_dismissed() {
        let alerts = service();
        let alert = alerts.create_from_draft(RecordId::new(), &draft("High Glucose Level")).unwrap();
        alerts.acknowledge(&nurse(), &alert.id).unwrap();
        let updated = alerts.dismiss(&nurse(), &alert.id).unwrap();
        assert!(updated.acknowledged && updated.dismissed);
    }

    #[test]
    fn list_is_newest_first_and_filters_by_patient() {
        let alerts = service();
        let a = RecordId::new();
        let b = RecordId::new();
        let first = alerts.create_from_draft(a, &draft("one")).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = alerts.create_from_draft(a, &draft("two")).unwrap();
        alerts.create_from_draft(b, &draft("other")).unwrap();

        let listed = alerts
            .list(&nurse(), AlertFilter::active().for_patient(a))
            .unwrap();
        assert_eq!(
            listed.iter().map(|a| a.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );
    }

    #[test]
    fn unknown_alert_is_not_found() {
        let alerts = service();
        assert!(matches!(
            alerts.acknowledge(&nurse(), &RecordId::new()),
            Err(CoreError::NotFound { kind: "alert", .. })
        ));
        assert!(matches!(
            alerts.dismiss(&nurse(), &RecordId::new()),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn patients_cannot_manage_alerts() {
        let alerts = service();
        let alert = alerts.create_from_draft(RecordId::new(), &draft("x")).unwrap();
        let patient = Caller::new(RecordId::new(), Role::Patient);
        assert!(matches!(
            alerts.acknowledge(&patient, &alert.id),
            Err(CoreError::Forbidden(_))
        ));
        assert!(matches!(
            alerts.list(&patient, AlertFilter::active()),
            Err(CoreError::Forbidden(_))
        ));
    }

    #[test]
    fn confidence_is_bounded() {
        assert_eq!(ConfidenceScore::new(100).unwrap().value(), 100);
        assert!(ConfidenceScore::new(101).is_err());
        assert!(serde_json::from_str::<ConfidenceScore>("150").is_err());
    }
}
