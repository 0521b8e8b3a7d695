//! Error types for the TASKVAULT system.
//!
//! Every reveal/verification entry point must produce identical
//! externally observable errors for equivalent failure classes, so the
//! authentication variants deliberately carry no detail: wrong password
//! and unknown account are indistinguishable from outside.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    /// Bad credential or unknown identity. Always the same message —
    /// never reveals whether the account exists.
    #[error("invalid credentials")]
    AuthenticationFailed,

    /// Lockout window active; rejected before any credential comparison.
    #[error("account temporarily locked")]
    AccountLocked,

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("insufficient privileges: {reason}")]
    Forbidden { reason: String },

    #[error("entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("cryptography error: {0}")]
    Crypto(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl VaultError {
    /// Normative HTTP status mapping for the boundary layer.
    ///
    /// Internal variants map to 500; the boundary must serialize a
    /// generic body for them, never the message.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::AuthenticationFailed => 401,
            Self::AccountLocked => 429,
            Self::Validation { .. } => 400,
            Self::Forbidden { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::Conflict { .. } => 409,
            Self::Crypto(_) | Self::Database(_) | Self::Internal(_) => 500,
        }
    }
}

impl From<taskvault_protect::ProtectError> for VaultError {
    fn from(err: taskvault_protect::ProtectError) -> Self {
        VaultError::Crypto(err.to_string())
    }
}

pub type VaultResult<T> = Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_failure_is_uniform() {
        // Same body regardless of whether the account exists.
        assert_eq!(
            VaultError::AuthenticationFailed.to_string(),
            "invalid credentials"
        );
    }

    #[test]
    fn status_mapping() {
        assert_eq!(VaultError::AuthenticationFailed.status_code(), 401);
        assert_eq!(VaultError::AccountLocked.status_code(), 429);
        assert_eq!(
            VaultError::Validation {
                message: "bad reason".into()
            }
            .status_code(),
            400
        );
        assert_eq!(
            VaultError::Forbidden {
                reason: "role".into()
            }
            .status_code(),
            403
        );
        assert_eq!(
            VaultError::NotFound {
                entity: "user".into(),
                id: "x".into()
            }
            .status_code(),
            404
        );
        assert_eq!(
            VaultError::Conflict {
                message: "dup".into()
            }
            .status_code(),
            409
        );
        assert_eq!(VaultError::Crypto("key mismatch".into()).status_code(), 500);
    }
}
