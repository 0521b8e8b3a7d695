//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. The user/refresh-token traits
//! expose the atomic primitives the credential verifier and token
//! rotation depend on; callers never read-modify-write those rows.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::VaultResult;
use crate::models::{
    audit::{AuditAction, AuditEntry, CreateAuditEntry, ResourceKind},
    refresh_token::{CreateRefreshToken, RefreshToken},
    task::{CreateTask, Task},
    user::{CreateUser, Role, User},
};

/// Hard ceiling on page size for any list query.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Pagination {
    /// Clamp the limit into `1..=MAX_PAGE_SIZE`. Absurd page sizes are
    /// bounded, never rejected with a crash or materialized unbounded.
    pub fn clamped(self) -> Self {
        Self {
            offset: self.offset,
            limit: self.limit.clamp(1, MAX_PAGE_SIZE),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = VaultResult<User>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = VaultResult<User>> + Send;

    /// Equality lookup via the deterministic email hash; plaintext
    /// never reaches the storage layer.
    fn get_by_email_hash(
        &self,
        email_hash: &str,
    ) -> impl Future<Output = VaultResult<User>> + Send;

    /// Atomically record one failed password check: increment the
    /// shared counter and, when it reaches `max_attempts`, set the
    /// lockout window end to `lockout_end`. One statement — two racing
    /// failures must both count.
    fn record_failed_attempt(
        &self,
        id: Uuid,
        max_attempts: u32,
        lockout_end: DateTime<Utc>,
    ) -> impl Future<Output = VaultResult<User>> + Send;

    /// Reset the failure counter and clear any lockout. Used on
    /// successful verification and on lockout-window expiry.
    fn reset_failed_attempts(&self, id: Uuid) -> impl Future<Output = VaultResult<User>> + Send;

    /// Deactivate iff currently active. `Ok(None)` means no transition
    /// happened (already inactive, or no such row); the caller decides
    /// whether that is a conflict or a 404. The first deactivation
    /// timestamp is never overwritten.
    fn deactivate(&self, id: Uuid) -> impl Future<Output = VaultResult<Option<User>>> + Send;

    /// Reactivate iff currently inactive. Same `Ok(None)` contract.
    fn reactivate(&self, id: Uuid) -> impl Future<Output = VaultResult<Option<User>>> + Send;

    /// Add a role iff not already present. `Ok(None)` means no change.
    fn assign_role(
        &self,
        id: Uuid,
        role: Role,
    ) -> impl Future<Output = VaultResult<Option<User>>> + Send;

    /// Remove a role iff present. `Ok(None)` means no change.
    fn remove_role(
        &self,
        id: Uuid,
        role: Role,
    ) -> impl Future<Output = VaultResult<Option<User>>> + Send;
}

// ---------------------------------------------------------------------------
// Refresh tokens
// ---------------------------------------------------------------------------

pub trait RefreshTokenRepository: Send + Sync {
    fn create(
        &self,
        input: CreateRefreshToken,
    ) -> impl Future<Output = VaultResult<RefreshToken>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = VaultResult<RefreshToken>> + Send;

    /// Lookup by hash regardless of state — needed to distinguish
    /// "unknown token" from "revoked token presented again" (reuse).
    fn get_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = VaultResult<RefreshToken>> + Send;

    /// Atomic single-use redemption: revoke the token iff it is still
    /// valid (`revoked_at IS NONE AND expires_at > now`) and return it.
    /// `Ok(None)` when the token was not redeemable — two concurrent
    /// refreshes with the same token cannot both succeed.
    fn consume(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = VaultResult<Option<RefreshToken>>> + Send;

    /// Record the rotation link from a consumed token to its successor.
    fn link_successor(
        &self,
        id: Uuid,
        successor_id: Uuid,
    ) -> impl Future<Output = VaultResult<()>> + Send;

    /// Revoke a single token. Idempotent; revocation is terminal.
    fn revoke(&self, id: Uuid) -> impl Future<Output = VaultResult<()>> + Send;

    /// Revoke every live token for a user (logout-everywhere,
    /// deactivation). Returns the number revoked.
    fn revoke_all_for_user(&self, user_id: Uuid) -> impl Future<Output = VaultResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Tasks (reveal targets only)
// ---------------------------------------------------------------------------

pub trait TaskRepository: Send + Sync {
    fn create(&self, input: CreateTask) -> impl Future<Output = VaultResult<Task>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = VaultResult<Task>> + Send;
}

// ---------------------------------------------------------------------------
// Audit (append-only)
// ---------------------------------------------------------------------------

/// Query filters for audit entries.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub action: Option<AuditAction>,
    pub resource_type: Option<ResourceKind>,
    pub resource_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

pub trait AuditLogRepository: Send + Sync {
    /// Append a new audit entry. The only write operation — no update
    /// or delete exists at any privilege level.
    fn append(
        &self,
        input: CreateAuditEntry,
    ) -> impl Future<Output = VaultResult<AuditEntry>> + Send;

    fn list(
        &self,
        filter: AuditFilter,
        pagination: Pagination,
    ) -> impl Future<Output = VaultResult<PaginatedResult<AuditEntry>>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps_absurd_limits() {
        assert_eq!(Pagination { offset: 0, limit: 0 }.clamped().limit, 1);
        assert_eq!(
            Pagination {
                offset: 0,
                limit: u64::MAX
            }
            .clamped()
            .limit,
            MAX_PAGE_SIZE
        );
        assert_eq!(Pagination { offset: 5, limit: 20 }.clamped().limit, 20);
    }
}
