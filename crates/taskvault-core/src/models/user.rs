//! User domain model.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskvault_protect::ProtectedField;
use uuid::Uuid;

/// Closed role set. Anything outside this enumeration is a validation
/// error, never a new role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    User,
    Admin,
    SystemAdmin,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "User" => Some(Self::User),
            "Admin" => Some(Self::Admin),
            "SystemAdmin" => Some(Self::SystemAdmin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Admin => "Admin",
            Self::SystemAdmin => "SystemAdmin",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    /// Encrypted at rest, lookup-hashed for login by address.
    pub email: ProtectedField,
    /// Encrypted at rest, no equality lookup needed.
    pub display_name: ProtectedField,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub roles: BTreeSet<Role>,
    pub is_active: bool,
    /// Consecutive failed password checks, shared by every
    /// verification surface. Mutated only by the credential verifier.
    pub failed_access_count: u32,
    /// End of the active lockout window, if any.
    pub lockout_end: Option<DateTime<Utc>>,
    /// Set on the first deactivation, never overwritten.
    pub deactivated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Repository input for user creation. Protection happens before this
/// point: the registration service encrypts the PII and hashes the
/// password, so no raw value crosses the storage boundary.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: ProtectedField,
    pub display_name: ProtectedField,
    pub password_hash: String,
    pub roles: BTreeSet<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_is_closed() {
        assert_eq!(Role::parse("Admin"), Some(Role::Admin));
        assert_eq!(Role::parse("SystemAdmin"), Some(Role::SystemAdmin));
        assert_eq!(Role::parse("SuperAdmin"), None);
        assert_eq!(Role::parse("admin"), None);
    }

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::User, Role::Admin, Role::SystemAdmin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }
}
