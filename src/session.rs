//! Explicit session and patient-data access checks.
//!
//! The session is a plain value built once by the hosting app after login
//! and passed by reference to every view that needs it. There is no
//! ambient or persisted copy, so the role seen by a view is always the one
//! the session was built with.
//!
//! Access cascade for patient data, default-deny, checked in order:
//! 1. Patient viewing their own record → ALLOW
//! 2. Doctor viewing a patient on their roster → ALLOW
//! 3. Default → DENY

use serde::Serialize;

use crate::models::{RecordId, Role};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Patient id for patients, doctor id for doctors.
    profile_id: RecordId,
    role: Role,
}

impl Session {
    pub fn patient(patient_id: impl Into<RecordId>) -> Self {
        Self {
            profile_id: patient_id.into(),
            role: Role::Patient,
        }
    }

    pub fn doctor(doctor_id: impl Into<RecordId>) -> Self {
        Self {
            profile_id: doctor_id.into(),
            role: Role::Doctor,
        }
    }

    pub fn profile_id(&self) -> &RecordId {
        &self.profile_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Route-level guard.
    pub fn require_role(&self, required: Role) -> Result<(), AccessError> {
        if self.role == required {
            Ok(())
        } else {
            Err(AccessError::WrongRole {
                required,
                actual: self.role,
            })
        }
    }
}

/// Why access was granted (or denied).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessReason {
    OwnRecord,
    RosterPatient,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: AccessReason,
}

impl AccessDecision {
    fn allow(reason: AccessReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    fn deny() -> Self {
        Self {
            allowed: false,
            reason: AccessReason::Denied,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("{role} {profile_id} may not view patient {patient_id}")]
    Denied {
        role: Role,
        profile_id: RecordId,
        patient_id: RecordId,
    },
    #[error("This view requires the {required} role, session is {actual}")]
    WrongRole { required: Role, actual: Role },
}

// ═══════════════════════════════════════════════════════════
// Access check
// ═══════════════════════════════════════════════════════════

/// Evaluate the cascade. `roster` lists the patients assigned to the
/// session's doctor and is ignored for patient sessions.
pub fn check_patient_access(
    session: &Session,
    patient_id: &RecordId,
    roster: &[RecordId],
) -> AccessDecision {
    match session.role {
        // Rule 1: Own record
        Role::Patient if &session.profile_id == patient_id => {
            AccessDecision::allow(AccessReason::OwnRecord)
        }
        // Rule 2: Roster patient
        Role::Doctor if roster.contains(patient_id) => {
            AccessDecision::allow(AccessReason::RosterPatient)
        }
        // Rule 3: Default deny
        _ => AccessDecision::deny(),
    }
}

/// Like [`check_patient_access`] but turns a denial into an error.
pub fn authorize_patient_view(
    session: &Session,
    patient_id: &RecordId,
    roster: &[RecordId],
) -> Result<AccessReason, AccessError> {
    let decision = check_patient_access(session, patient_id, roster);
    if decision.allowed {
        Ok(decision.reason)
    } else {
        tracing::warn!(
            role = %session.role,
            profile_id = %session.profile_id,
            patient_id = %patient_id,
            "Patient view denied"
        );
        Err(AccessError::Denied {
            role: session.role,
            profile_id: session.profile_id.clone(),
            patient_id: patient_id.clone(),
        })
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
