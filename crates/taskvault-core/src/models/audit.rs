//! Audit log domain model.
//!
//! Append-only by design: no update or delete operation exists on this
//! entity at any privilege level.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sensitive actions that must leave an audit trail.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuditAction {
    ProtectedDataRevealed,
    UserDeactivated,
    UserReactivated,
    RoleAssigned,
    RoleRemoved,
}

impl AuditAction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ProtectedDataRevealed" => Some(Self::ProtectedDataRevealed),
            "UserDeactivated" => Some(Self::UserDeactivated),
            "UserReactivated" => Some(Self::UserReactivated),
            "RoleAssigned" => Some(Self::RoleAssigned),
            "RoleRemoved" => Some(Self::RoleRemoved),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProtectedDataRevealed => "ProtectedDataRevealed",
            Self::UserDeactivated => "UserDeactivated",
            Self::UserReactivated => "UserReactivated",
            Self::RoleAssigned => "RoleAssigned",
            Self::RoleRemoved => "RoleRemoved",
        }
    }
}

/// What kind of resource an entry refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResourceKind {
    User,
    Task,
}

impl ResourceKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "User" => Some(Self::User),
            "Task" => Some(Self::Task),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Task => "Task",
        }
    }
}

/// Closed justification set for break-the-glass reveals.
///
/// `Other` is only acceptable with non-empty free-text details.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RevealReason {
    UserRequest,
    SupportTicket,
    SecurityInvestigation,
    LegalCompliance,
    Other,
}

impl RevealReason {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "UserRequest" => Some(Self::UserRequest),
            "SupportTicket" => Some(Self::SupportTicket),
            "SecurityInvestigation" => Some(Self::SecurityInvestigation),
            "LegalCompliance" => Some(Self::LegalCompliance),
            "Other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserRequest => "UserRequest",
            Self::SupportTicket => "SupportTicket",
            Self::SecurityInvestigation => "SecurityInvestigation",
            Self::LegalCompliance => "LegalCompliance",
            Self::Other => "Other",
        }
    }

    pub fn requires_details(&self) -> bool {
        matches!(self, Self::Other)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub action: AuditAction,
    pub resource_type: ResourceKind,
    pub resource_id: Uuid,
    pub actor_id: Uuid,
    pub reason: Option<RevealReason>,
    /// Free-text context; mandatory when `reason` is `Other`. Must
    /// never contain plaintext PII.
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateAuditEntry {
    pub action: AuditAction,
    pub resource_type: ResourceKind,
    pub resource_id: Uuid,
    pub actor_id: Uuid,
    pub reason: Option<RevealReason>,
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_set_is_closed() {
        assert_eq!(RevealReason::parse("UserRequest"), Some(RevealReason::UserRequest));
        assert_eq!(RevealReason::parse("Curiosity"), None);
        assert_eq!(RevealReason::parse(""), None);
    }

    #[test]
    fn only_other_requires_details() {
        assert!(RevealReason::Other.requires_details());
        assert!(!RevealReason::UserRequest.requires_details());
        assert!(!RevealReason::SecurityInvestigation.requires_details());
    }

    #[test]
    fn action_round_trips() {
        for action in [
            AuditAction::ProtectedDataRevealed,
            AuditAction::UserDeactivated,
            AuditAction::UserReactivated,
            AuditAction::RoleAssigned,
            AuditAction::RoleRemoved,
        ] {
            assert_eq!(AuditAction::parse(action.as_str()), Some(action));
        }
    }
}
