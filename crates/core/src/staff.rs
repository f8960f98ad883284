//! Staff directory.
//!
//! Holds the doctors, nurses and administrators that patients can be assigned to. Patient
//! assignment uses it to check that a referenced staff member exists and holds the expected
//! role.

use crate::access::{ensure_role, Caller};
use crate::repositories::store::{get_document, put_document, Collection, DocumentStore};
use crate::validation::validate_license_number;
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use medairon_types::{NonEmptyText, Role};
use medairon_uuid::RecordId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaffMember {
    pub id: RecordId,
    pub full_name: NonEmptyText,
    pub role: Role,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for [`StaffService::register`].
#[derive(Clone, Debug)]
pub struct NewStaffMember {
    pub full_name: String,
    pub role: Role,
    pub license_number: Option<String>,
    pub department: Option<String>,
}

#[derive(Clone)]
pub struct StaffService {
    store: Arc<dyn DocumentStore>,
}

impl StaffService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Registers a staff member. Administrators only.
    ///
    /// Doctors and nurses must carry a license number (6-12 uppercase letters or digits).
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the caller is not an administrator,
    /// - `InvalidInput` if the name is blank or the license number is missing/malformed,
    /// - `Persistence` if the record cannot be written.
    pub fn register(&self, caller: &Caller, new: NewStaffMember) -> CoreResult<StaffMember> {
        ensure_role(caller, &[Role::Admin])?;

        let full_name = NonEmptyText::new(&new.full_name)?;
        let license_number = new
            .license_number
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());

        match (&new.role, &license_number) {
            (Role::Doctor | Role::Nurse, None) => {
                return Err(CoreError::InvalidInput(format!(
                    "license_number is required for role {}",
                    new.role
                )))
            }
            (_, Some(license)) => validate_license_number(license)?,
            _ => {}
        }

        let member = StaffMember {
            id: RecordId::new(),
            full_name,
            role: new.role,
            license_number,
            department: new
                .department
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            created_at: Utc::now(),
        };

        put_document(self.store.as_ref(), Collection::Staff, &member.id, &member)
            .map_err(CoreError::persistence(Collection::Staff))?;

        tracing::info!(staff_id = %member.id, role = %member.role, "staff member registered");
        Ok(member)
    }

    /// Looks up a staff member by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no staff member has this id.
    pub fn get(&self, id: &RecordId) -> CoreResult<StaffMember> {
        get_document(self.store.as_ref(), Collection::Staff, id)
            .map_err(CoreError::persistence(Collection::Staff))?
            .ok_or_else(|| CoreError::not_found("staff member", id))
    }
}
