//! Caller identity and the access rules shared by clinical operations.
//!
//! Authentication happens outside the core: the API layer resolves a bearer credential to a
//! [`Caller`] and passes it in. The core only decides what that caller may do.

use crate::patients::Patient;
use crate::{CoreError, CoreResult};
use medairon_types::Role;
use medairon_uuid::RecordId;

/// Authenticated identity on whose behalf an operation runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Caller {
    pub id: RecordId,
    pub role: Role,
}

impl Caller {
    pub fn new(id: RecordId, role: Role) -> Self {
        Self { id, role }
    }

    /// The local operator identity used by administrative tooling. Acts as an administrator
    /// with the nil id, which never belongs to a staff member.
    pub fn operator() -> Self {
        Self::new(RecordId::from(medairon_uuid::Uuid::nil()), Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// True when the caller is the patient's assigned doctor or assigned nurse.
    pub fn is_assigned_to(&self, patient: &Patient) -> bool {
        patient.assigned_doctor == Some(self.id) || patient.assigned_nurse == Some(self.id)
    }
}

/// Fails with `Forbidden` unless the caller holds one of `allowed`.
pub fn ensure_role(caller: &Caller, allowed: &[Role]) -> CoreResult<()> {
    if allowed.contains(&caller.role) {
        return Ok(());
    }
    Err(CoreError::Forbidden(format!(
        "role {} is not authorised for this action",
        caller.role
    )))
}

/// Fails with `Forbidden` unless the caller is an administrator or is clinically responsible
/// for the patient.
pub fn ensure_clinical_access(caller: &Caller, patient: &Patient) -> CoreResult<()> {
    if caller.is_admin() || caller.is_assigned_to(patient) {
        return Ok(());
    }
    Err(CoreError::Forbidden(format!(
        "caller {} is not assigned to patient {}",
        caller.id, patient.id
    )))
}
