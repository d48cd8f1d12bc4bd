//! Coarse role resolution.
//!
//! A role is a computed property of an identity, never a persisted field.
//! Both login and the "who am I" endpoint derive it through the same
//! function, so the two can never drift apart.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Coarse access label for an authenticated identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Patient,
    User,
}

impl Role {
    /// Derives the role from identity attributes. First match wins:
    /// staff flag, then a doctor profile, then a patient profile, then the
    /// bare `user` fallback.
    pub fn resolve(is_staff: bool, has_doctor: bool, has_patient: bool) -> Self {
        if is_staff {
            Role::Admin
        } else if has_doctor {
            Role::Doctor
        } else if has_patient {
            Role::Patient
        } else {
            Role::User
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Patient => "patient",
            Role::User => "user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod roles_tests {
    use super::*;

    #[test]
    fn staff_flag_wins_over_profiles() {
        assert_eq!(Role::resolve(true, true, true), Role::Admin);
        assert_eq!(Role::resolve(true, false, false), Role::Admin);
    }

    #[test]
    fn doctor_profile_wins_over_patient_profile() {
        assert_eq!(Role::resolve(false, true, true), Role::Doctor);
    }

    #[test]
    fn patient_profile_resolves_patient() {
        assert_eq!(Role::resolve(false, false, true), Role::Patient);
    }

    #[test]
    fn bare_identity_falls_back_to_user() {
        assert_eq!(Role::resolve(false, false, false), Role::User);
        assert_eq!(Role::User.as_str(), "user");
    }
}
