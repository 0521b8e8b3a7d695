//! Authentication error types.
//!
//! The conversion into [`VaultError`] is where enumeration resistance
//! is enforced: every credential- or token-shaped failure collapses
//! into the single uniform `AuthenticationFailed` variant. Only the
//! lockout state is distinguishable from outside.

use taskvault_core::error::VaultError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is locked")]
    AccountLocked,

    #[error("account is inactive")]
    AccountInactive,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for VaultError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::AccountInactive
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_) => VaultError::AuthenticationFailed,
            AuthError::AccountLocked => VaultError::AccountLocked,
            AuthError::Crypto(msg) => VaultError::Crypto(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failures_collapse_to_uniform_error() {
        for err in [
            AuthError::InvalidCredentials,
            AuthError::AccountInactive,
            AuthError::TokenExpired,
            AuthError::TokenInvalid("garbage".into()),
        ] {
            let mapped: VaultError = err.into();
            assert!(matches!(mapped, VaultError::AuthenticationFailed));
            assert_eq!(mapped.to_string(), "invalid credentials");
        }
    }

    #[test]
    fn lockout_stays_distinct() {
        let mapped: VaultError = AuthError::AccountLocked.into();
        assert!(matches!(mapped, VaultError::AccountLocked));
    }
}
