//! Authentication service — login, refresh rotation, and logout
//! orchestration.

use chrono::{Duration, Utc};
use taskvault_core::error::{VaultError, VaultResult};
use taskvault_core::models::refresh_token::{CreateRefreshToken, RefreshToken};
use taskvault_core::repository::{RefreshTokenRepository, UserRepository};
use taskvault_protect::lookup_hash;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::token;
use crate::verifier::CredentialVerifier;

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Successful login result.
///
/// The raw refresh token goes into the scoped cookie and nowhere
/// else; it must not appear in a JSON body.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed JWT access token.
    pub access_token: String,
    /// Raw opaque refresh token (cookie only, not stored).
    pub refresh_token: String,
    /// Persisted id of the refresh token row.
    pub refresh_token_id: Uuid,
    /// Redacted email for display; plaintext requires a reveal.
    pub email_redacted: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Successful refresh result (new token pair).
#[derive(Debug)]
pub struct RefreshOutput {
    pub access_token: String,
    /// New opaque refresh token (replaces the consumed one).
    pub refresh_token: String,
    pub refresh_token_id: Uuid,
    pub expires_in: u64,
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer has
/// no dependency on the database crate.
pub struct AuthService<U, R>
where
    U: UserRepository,
    R: RefreshTokenRepository,
{
    users: U,
    tokens: R,
    verifier: CredentialVerifier<U>,
    config: AuthConfig,
}

impl<U, R> AuthService<U, R>
where
    U: UserRepository + Clone,
    R: RefreshTokenRepository,
{
    pub fn new(users: U, tokens: R, config: AuthConfig) -> Self {
        let verifier = CredentialVerifier::new(users.clone(), config.clone());
        Self {
            users,
            tokens,
            verifier,
            config,
        }
    }

    /// Authenticate with email + password and issue a token pair.
    pub async fn login(&self, input: LoginInput) -> VaultResult<LoginOutput> {
        // Lookup by deterministic hash; an unknown address produces
        // the same error as a wrong password.
        let user = match self.users.get_by_email_hash(&lookup_hash(&input.email)).await {
            Ok(u) => u,
            Err(VaultError::NotFound { .. }) => {
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        self.verifier.verify_user(&user, &input.password).await?;

        let (raw_refresh, refresh_row) = self.issue_refresh(user.id).await?;
        let access_token = token::issue_access_token(user.id, &user.roles, &self.config)?;

        Ok(LoginOutput {
            access_token,
            refresh_token: raw_refresh,
            refresh_token_id: refresh_row.id,
            email_redacted: user.email.redacted().unwrap_or("").to_string(),
            expires_in: self.config.access_token_lifetime_secs,
        })
    }

    /// Rotate a refresh token: atomically consume the presented one,
    /// then issue a successor linked into the rotation chain.
    ///
    /// Presenting an already-rotated token is a reuse-detection event:
    /// the request is rejected and the remaining chain is revoked.
    pub async fn refresh(&self, raw_refresh_token: &str) -> VaultResult<RefreshOutput> {
        let token_hash = token::hash_refresh_token(raw_refresh_token);

        let consumed = match self.tokens.consume(&token_hash).await? {
            Some(t) => t,
            None => return self.reject_unredeemable(&token_hash).await,
        };

        let user = match self.users.get_by_id(consumed.user_id).await {
            Ok(u) => u,
            Err(VaultError::NotFound { .. }) => return Err(AuthError::InvalidCredentials.into()),
            Err(e) => return Err(e),
        };
        if !user.is_active {
            return Err(AuthError::AccountInactive.into());
        }

        let (raw_refresh, refresh_row) = self.issue_refresh(user.id).await?;
        self.tokens
            .link_successor(consumed.id, refresh_row.id)
            .await?;

        let access_token = token::issue_access_token(user.id, &user.roles, &self.config)?;

        Ok(RefreshOutput {
            access_token,
            refresh_token: raw_refresh,
            refresh_token_id: refresh_row.id,
            expires_in: self.config.access_token_lifetime_secs,
        })
    }

    /// Revoke the presented refresh token (logout).
    pub async fn logout(&self, raw_refresh_token: &str) -> VaultResult<()> {
        let token_hash = token::hash_refresh_token(raw_refresh_token);
        match self.tokens.get_by_token_hash(&token_hash).await {
            Ok(t) => self.tokens.revoke(t.id).await,
            Err(VaultError::NotFound { .. }) => Err(AuthError::InvalidCredentials.into()),
            Err(e) => Err(e),
        }
    }

    /// Revoke every live refresh token for a user (logout-everywhere,
    /// deactivation). Returns the number revoked.
    pub async fn revoke_all(&self, user_id: Uuid) -> VaultResult<u64> {
        self.tokens.revoke_all_for_user(user_id).await
    }

    async fn issue_refresh(&self, user_id: Uuid) -> VaultResult<(String, RefreshToken)> {
        let raw = token::generate_refresh_token();
        let row = self
            .tokens
            .create(CreateRefreshToken {
                user_id,
                token_hash: token::hash_refresh_token(&raw),
                expires_at: Utc::now()
                    + Duration::seconds(self.config.refresh_token_lifetime_secs as i64),
            })
            .await?;
        Ok((raw, row))
    }

    /// The presented token was not atomically redeemable. Work out why
    /// and, on reuse of a revoked token, burn the rest of the chain.
    async fn reject_unredeemable(&self, token_hash: &str) -> VaultResult<RefreshOutput> {
        match self.tokens.get_by_token_hash(token_hash).await {
            Ok(stale) if stale.revoked_at.is_some() => {
                tracing::warn!(
                    token_id = %stale.id,
                    user_id = %stale.user_id,
                    "revoked refresh token presented again; revoking remaining chain"
                );
                self.revoke_chain(stale).await?;
                Err(AuthError::TokenInvalid("refresh token already used".into()).into())
            }
            Ok(_expired) => Err(AuthError::TokenExpired.into()),
            Err(VaultError::NotFound { .. }) => {
                Err(AuthError::TokenInvalid("unknown refresh token".into()).into())
            }
            Err(e) => Err(e),
        }
    }

    /// Follow `replaced_by_token_id` links from `start`, revoking every
    /// still-live descendant. Defends the whole session after theft.
    async fn revoke_chain(&self, start: RefreshToken) -> VaultResult<u64> {
        let mut revoked = 0u64;
        let mut current = start;
        loop {
            if current.revoked_at.is_none() {
                self.tokens.revoke(current.id).await?;
                revoked += 1;
            }
            match current.replaced_by_token_id {
                Some(next_id) => {
                    current = match self.tokens.get_by_id(next_id).await {
                        Ok(t) => t,
                        // Broken link: nothing further to revoke.
                        Err(VaultError::NotFound { .. }) => break,
                        Err(e) => return Err(e),
                    };
                }
                None => break,
            }
        }
        Ok(revoked)
    }
}
