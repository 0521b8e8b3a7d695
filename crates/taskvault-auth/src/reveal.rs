//! Break-the-glass reveal workflow.
//!
//! Self-reveal and admin-reveal share one contract, executed in a
//! fixed order: actor password first (through the shared lockout
//! machine), then reason validation, then target lookup, then
//! decryption, then exactly one audit entry, then the plaintext — in
//! the result only, never persisted, never logged.

use taskvault_core::error::{VaultError, VaultResult};
use taskvault_core::models::audit::{AuditAction, CreateAuditEntry, ResourceKind, RevealReason};
use taskvault_core::models::user::{Role, User};
use taskvault_core::repository::{AuditLogRepository, TaskRepository, UserRepository};
use taskvault_protect::FieldCipher;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::verifier::CredentialVerifier;

/// Plaintext profile fields released by a reveal.
///
/// Response-body material only. Callers must not store or log it.
#[derive(Debug)]
pub struct RevealedProfile {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: String,
}

/// Plaintext task note released by a reveal.
#[derive(Debug)]
pub struct RevealedNote {
    pub task_id: Uuid,
    pub note: String,
}

pub struct RevealService<U, T, A>
where
    U: UserRepository,
    T: TaskRepository,
    A: AuditLogRepository,
{
    users: U,
    tasks: T,
    audit: A,
    verifier: CredentialVerifier<U>,
    cipher: FieldCipher,
}

impl<U, T, A> RevealService<U, T, A>
where
    U: UserRepository + Clone,
    T: TaskRepository,
    A: AuditLogRepository,
{
    pub fn new(users: U, tasks: T, audit: A, cipher: FieldCipher, config: AuthConfig) -> Self {
        let verifier = CredentialVerifier::new(users.clone(), config);
        Self {
            users,
            tasks,
            audit,
            verifier,
            cipher,
        }
    }

    /// A user revealing their own record.
    pub async fn reveal_own_profile(
        &self,
        actor_id: Uuid,
        password: &str,
        reason: &str,
        details: Option<String>,
    ) -> VaultResult<RevealedProfile> {
        let actor = self.verifier.verify_by_id(actor_id, password).await?;
        let reason = validate_reason(reason, details.as_deref())?;
        self.release_profile(&actor, &actor, reason, details).await
    }

    /// A SystemAdmin revealing any user's record.
    pub async fn reveal_user(
        &self,
        actor_id: Uuid,
        password: &str,
        target_id: Uuid,
        reason: &str,
        details: Option<String>,
    ) -> VaultResult<RevealedProfile> {
        let actor = self.require_system_admin(actor_id, password).await?;
        let reason = validate_reason(reason, details.as_deref())?;
        let target = self.users.get_by_id(target_id).await?;
        self.release_profile(&actor, &target, reason, details).await
    }

    /// A SystemAdmin revealing a task's protected note.
    pub async fn reveal_task_note(
        &self,
        actor_id: Uuid,
        password: &str,
        task_id: Uuid,
        reason: &str,
        details: Option<String>,
    ) -> VaultResult<RevealedNote> {
        let actor = self.require_system_admin(actor_id, password).await?;
        let reason = validate_reason(reason, details.as_deref())?;
        let task = self.tasks.get_by_id(task_id).await?;

        let note = task
            .note
            .clone()
            .mark_reveal()?
            .wire_value(&self.cipher)
            .map_err(VaultError::from)?;

        self.audit
            .append(CreateAuditEntry {
                action: AuditAction::ProtectedDataRevealed,
                resource_type: ResourceKind::Task,
                resource_id: task.id,
                actor_id: actor.id,
                reason: Some(reason),
                details,
            })
            .await?;

        tracing::info!(actor_id = %actor.id, task_id = %task.id, "task note revealed");

        Ok(RevealedNote {
            task_id: task.id,
            note,
        })
    }

    /// Password check comes first and uniformly; the role check never
    /// runs against an unauthenticated caller.
    async fn require_system_admin(&self, actor_id: Uuid, password: &str) -> VaultResult<User> {
        let actor = self.verifier.verify_by_id(actor_id, password).await?;
        if !actor.has_role(Role::SystemAdmin) {
            return Err(VaultError::Forbidden {
                reason: "SystemAdmin role required".into(),
            });
        }
        Ok(actor)
    }

    async fn release_profile(
        &self,
        actor: &User,
        target: &User,
        reason: RevealReason,
        details: Option<String>,
    ) -> VaultResult<RevealedProfile> {
        // Reveal-pending is the only state the serializer decrypts;
        // plaintext goes straight into the result, never back onto
        // the user object.
        let email = target
            .email
            .clone()
            .mark_reveal()?
            .wire_value(&self.cipher)
            .map_err(VaultError::from)?;
        let display_name = target
            .display_name
            .clone()
            .mark_reveal()?
            .wire_value(&self.cipher)
            .map_err(VaultError::from)?;

        self.audit
            .append(CreateAuditEntry {
                action: AuditAction::ProtectedDataRevealed,
                resource_type: ResourceKind::User,
                resource_id: target.id,
                actor_id: actor.id,
                reason: Some(reason),
                details,
            })
            .await?;

        tracing::info!(
            actor_id = %actor.id,
            target_id = %target.id,
            reason = reason.as_str(),
            "protected profile revealed"
        );

        Ok(RevealedProfile {
            user_id: target.id,
            email,
            display_name,
        })
    }
}

/// Closed-enum reason validation; `Other` demands non-empty details.
fn validate_reason(reason: &str, details: Option<&str>) -> VaultResult<RevealReason> {
    let reason = RevealReason::parse(reason).ok_or_else(|| VaultError::Validation {
        message: "reason must come from the approved disclosure list".into(),
    })?;
    if reason.requires_details() && details.map_or(true, |d| d.trim().is_empty()) {
        return Err(VaultError::Validation {
            message: "details are required when reason is Other".into(),
        });
    }
    Ok(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_reason_is_a_validation_error() {
        let err = validate_reason("Curiosity", None).unwrap_err();
        assert!(matches!(err, VaultError::Validation { .. }));
    }

    #[test]
    fn other_requires_non_empty_details() {
        assert!(validate_reason("Other", None).is_err());
        assert!(validate_reason("Other", Some("   ")).is_err());
        assert!(validate_reason("Other", Some("GDPR export ticket 4711")).is_ok());
    }

    #[test]
    fn listed_reasons_need_no_details() {
        assert_eq!(
            validate_reason("SupportTicket", None).unwrap(),
            RevealReason::SupportTicket
        );
    }
}
