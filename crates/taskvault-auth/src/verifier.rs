//! Credential verification and the account lockout state machine.
//!
//! Every password-check entry point — login, self profile reveal,
//! admin reveal, task-note reveal — routes through this one verifier
//! and shares one failure counter per user. Spreading guesses across
//! endpoints still accumulates toward the same lockout.

use chrono::{Duration, Utc};
use taskvault_core::error::{VaultError, VaultResult};
use taskvault_core::models::user::User;
use taskvault_core::repository::UserRepository;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;

pub struct CredentialVerifier<U: UserRepository> {
    users: U,
    config: AuthConfig,
}

impl<U: UserRepository> CredentialVerifier<U> {
    pub fn new(users: U, config: AuthConfig) -> Self {
        Self { users, config }
    }

    /// Load a user by id and verify their password.
    ///
    /// A missing user maps to the uniform authentication failure so
    /// callers cannot probe for account existence.
    pub async fn verify_by_id(&self, user_id: Uuid, candidate: &str) -> VaultResult<User> {
        let user = match self.users.get_by_id(user_id).await {
            Ok(u) => u,
            Err(VaultError::NotFound { .. }) => return Err(AuthError::InvalidCredentials.into()),
            Err(e) => return Err(e),
        };
        self.verify_user(&user, candidate).await?;
        Ok(user)
    }

    /// Run the lockout state machine for one password check.
    ///
    /// Locked: rejected before any comparison, until the window
    /// elapses — then the counter auto-resets and the check proceeds.
    /// A failed comparison increments the shared counter atomically
    /// and locks the account when the threshold is reached. A
    /// successful comparison resets the counter.
    pub async fn verify_user(&self, user: &User, candidate: &str) -> VaultResult<()> {
        let now = Utc::now();

        if let Some(end) = user.lockout_end {
            if now < end {
                return Err(AuthError::AccountLocked.into());
            }
            // Window elapsed: back to Active with a clean counter.
            self.users.reset_failed_attempts(user.id).await?;
        }

        // Argon2id is CPU-heavy; keep it off the async workers.
        let candidate = candidate.to_string();
        let stored_hash = user.password_hash.clone();
        let pepper = self.config.pepper.clone();
        let matched = tokio::task::spawn_blocking(move || {
            password::verify_password(&candidate, &stored_hash, pepper.as_deref())
        })
        .await
        .map_err(|e| VaultError::Internal(format!("verification task failed: {e}")))?
        .map_err(VaultError::from)?;

        if !matched {
            let lockout_end = now + Duration::seconds(self.config.lockout_window_secs as i64);
            let updated = self
                .users
                .record_failed_attempt(user.id, self.config.max_failed_attempts, lockout_end)
                .await?;
            if updated.lockout_end.is_some() {
                tracing::warn!(
                    user_id = %user.id,
                    failures = updated.failed_access_count,
                    "account locked after repeated failed password checks"
                );
            }
            return Err(AuthError::InvalidCredentials.into());
        }

        // Correct password for a deactivated account still fails,
        // indistinguishably from a bad credential.
        if !user.is_active {
            return Err(AuthError::AccountInactive.into());
        }

        if user.failed_access_count > 0 || user.lockout_end.is_some() {
            self.users.reset_failed_attempts(user.id).await?;
        }

        Ok(())
    }
}
