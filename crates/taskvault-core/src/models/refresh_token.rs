//! Refresh token domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One link in a per-session rotation chain.
///
/// The raw opaque token never touches storage; only its SHA-256 hash
/// does. Each successful refresh revokes the presented token and
/// creates exactly one successor, linked via `replaced_by_token_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Revocation is terminal.
    pub revoked_at: Option<DateTime<Utc>>,
    /// Successor in the rotation chain, set when this token is rotated.
    pub replaced_by_token_id: Option<Uuid>,
}

impl RefreshToken {
    /// Valid iff never revoked and not past expiry.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && now < self.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct CreateRefreshToken {
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(revoked: bool, expired: bool) -> RefreshToken {
        let now = Utc::now();
        RefreshToken {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token_hash: "hash".into(),
            issued_at: now - Duration::minutes(5),
            expires_at: if expired {
                now - Duration::seconds(1)
            } else {
                now + Duration::days(30)
            },
            revoked_at: revoked.then(|| now - Duration::minutes(1)),
            replaced_by_token_id: None,
        }
    }

    #[test]
    fn validity_requires_unrevoked_and_unexpired() {
        let now = Utc::now();
        assert!(token(false, false).is_valid(now));
        assert!(!token(true, false).is_valid(now));
        assert!(!token(false, true).is_valid(now));
        assert!(!token(true, true).is_valid(now));
    }
}
