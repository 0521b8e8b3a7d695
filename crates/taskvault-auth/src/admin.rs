//! Registration and audited administrative actions.
//!
//! Deactivation, reactivation, and role changes are the sensitive
//! surface the audit log exists for; each successful transition
//! appends exactly one entry. State transitions are conditional at
//! the repository level, so a lost race surfaces as a conflict
//! instead of a silent double-apply.

use std::collections::BTreeSet;

use taskvault_core::error::{VaultError, VaultResult};
use taskvault_core::models::audit::{AuditAction, CreateAuditEntry, ResourceKind};
use taskvault_core::models::user::{CreateUser, Role, User};
use taskvault_core::repository::{AuditLogRepository, RefreshTokenRepository, UserRepository};
use taskvault_protect::{FieldCipher, ProtectedField, lookup_hash};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::password;

#[derive(Debug)]
pub struct RegisterInput {
    pub email: String,
    pub display_name: String,
    pub password: String,
}

pub struct AdminService<U, R, A>
where
    U: UserRepository,
    R: RefreshTokenRepository,
    A: AuditLogRepository,
{
    users: U,
    tokens: R,
    audit: A,
    cipher: FieldCipher,
    config: AuthConfig,
}

impl<U, R, A> AdminService<U, R, A>
where
    U: UserRepository,
    R: RefreshTokenRepository,
    A: AuditLogRepository,
{
    pub fn new(users: U, tokens: R, audit: A, cipher: FieldCipher, config: AuthConfig) -> Self {
        Self {
            users,
            tokens,
            audit,
            cipher,
            config,
        }
    }

    /// Create an account. The email is encrypted with a lookup hash,
    /// the display name encrypted without one, the password hashed
    /// with Argon2id — no raw PII crosses the storage boundary.
    pub async fn register(&self, input: RegisterInput) -> VaultResult<User> {
        let email = input.email.trim();
        if !email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'))
        {
            return Err(VaultError::Validation {
                message: "email address is malformed".into(),
            });
        }
        if input.password.chars().count() < self.config.min_password_length {
            return Err(VaultError::Validation {
                message: format!(
                    "password must be at least {} characters",
                    self.config.min_password_length
                ),
            });
        }

        match self.users.get_by_email_hash(&lookup_hash(email)).await {
            Ok(_) => {
                return Err(VaultError::Conflict {
                    message: "an account with this email already exists".into(),
                });
            }
            Err(VaultError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let password = input.password;
        let pepper = self.config.pepper.clone();
        let password_hash = tokio::task::spawn_blocking(move || {
            password::hash_password(&password, pepper.as_deref())
        })
        .await
        .map_err(|e| VaultError::Internal(format!("hashing task failed: {e}")))?
        .map_err(VaultError::from)?;

        let user = self
            .users
            .create(CreateUser {
                email: ProtectedField::protect(&self.cipher, email, true)?,
                display_name: ProtectedField::protect(&self.cipher, &input.display_name, false)?,
                password_hash,
                roles: BTreeSet::from([Role::User]),
            })
            .await?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Deactivate an account: one-way unless reactivated, revokes all
    /// live refresh tokens, audited. Already-inactive → conflict; the
    /// first deactivation timestamp is never overwritten.
    pub async fn deactivate(&self, actor_id: Uuid, target_id: Uuid) -> VaultResult<User> {
        let actor = self.require_system_admin(actor_id).await?;

        let Some(user) = self.users.deactivate(target_id).await? else {
            // No transition: distinguish missing from already-inactive.
            self.users.get_by_id(target_id).await?;
            return Err(VaultError::Conflict {
                message: "account is already inactive".into(),
            });
        };

        let revoked = self.tokens.revoke_all_for_user(target_id).await?;
        self.audit
            .append(CreateAuditEntry {
                action: AuditAction::UserDeactivated,
                resource_type: ResourceKind::User,
                resource_id: target_id,
                actor_id: actor.id,
                reason: None,
                details: None,
            })
            .await?;

        tracing::info!(
            actor_id = %actor.id,
            target_id = %target_id,
            revoked_tokens = revoked,
            "user deactivated"
        );
        Ok(user)
    }

    /// Reactivate a previously deactivated account. Already-active →
    /// conflict.
    pub async fn reactivate(&self, actor_id: Uuid, target_id: Uuid) -> VaultResult<User> {
        let actor = self.require_system_admin(actor_id).await?;

        let Some(user) = self.users.reactivate(target_id).await? else {
            self.users.get_by_id(target_id).await?;
            return Err(VaultError::Conflict {
                message: "account is already active".into(),
            });
        };

        self.audit
            .append(CreateAuditEntry {
                action: AuditAction::UserReactivated,
                resource_type: ResourceKind::User,
                resource_id: target_id,
                actor_id: actor.id,
                reason: None,
                details: None,
            })
            .await?;

        tracing::info!(actor_id = %actor.id, target_id = %target_id, "user reactivated");
        Ok(user)
    }

    /// Assign a role from the closed set. Unknown name → validation
    /// error; already assigned → conflict.
    pub async fn assign_role(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
        role_name: &str,
    ) -> VaultResult<User> {
        let actor = self.require_system_admin(actor_id).await?;
        let role = parse_role(role_name)?;

        let Some(user) = self.users.assign_role(target_id, role).await? else {
            self.users.get_by_id(target_id).await?;
            return Err(VaultError::Conflict {
                message: "role is already assigned".into(),
            });
        };

        self.append_role_audit(AuditAction::RoleAssigned, actor.id, target_id, role)
            .await?;
        Ok(user)
    }

    /// Remove a role. Unknown name → validation error; not assigned →
    /// conflict.
    pub async fn remove_role(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
        role_name: &str,
    ) -> VaultResult<User> {
        let actor = self.require_system_admin(actor_id).await?;
        let role = parse_role(role_name)?;

        let Some(user) = self.users.remove_role(target_id, role).await? else {
            self.users.get_by_id(target_id).await?;
            return Err(VaultError::Conflict {
                message: "role is not assigned".into(),
            });
        };

        self.append_role_audit(AuditAction::RoleRemoved, actor.id, target_id, role)
            .await?;
        Ok(user)
    }

    async fn append_role_audit(
        &self,
        action: AuditAction,
        actor_id: Uuid,
        target_id: Uuid,
        role: Role,
    ) -> VaultResult<()> {
        self.audit
            .append(CreateAuditEntry {
                action,
                resource_type: ResourceKind::User,
                resource_id: target_id,
                actor_id,
                reason: None,
                details: Some(role.as_str().to_string()),
            })
            .await?;
        Ok(())
    }

    async fn require_system_admin(&self, actor_id: Uuid) -> VaultResult<User> {
        let actor = self.users.get_by_id(actor_id).await?;
        if !actor.has_role(Role::SystemAdmin) {
            return Err(VaultError::Forbidden {
                reason: "SystemAdmin role required".into(),
            });
        }
        Ok(actor)
    }
}

fn parse_role(role_name: &str) -> VaultResult<Role> {
    Role::parse(role_name).ok_or_else(|| VaultError::Validation {
        message: format!("unknown role: {role_name}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_are_a_closed_set() {
        assert!(parse_role("Admin").is_ok());
        assert!(matches!(
            parse_role("SuperAdmin").unwrap_err(),
            VaultError::Validation { .. }
        ));
    }
}
