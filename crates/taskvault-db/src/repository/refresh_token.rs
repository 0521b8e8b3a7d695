//! SurrealDB implementation of [`RefreshTokenRepository`].
//!
//! Only the SHA-256 hash of a refresh token is ever stored. The
//! `consume` operation is the single-use redemption primitive: one
//! UPDATE that revokes the row iff it is still valid, so two
//! concurrent refreshes with the same token cannot both succeed.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use taskvault_core::error::VaultResult;
use taskvault_core::models::refresh_token::{CreateRefreshToken, RefreshToken};
use taskvault_core::repository::RefreshTokenRepository;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct RefreshTokenRow {
    user_id: String,
    token_hash: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
    replaced_by_token_id: Option<String>,
}

#[derive(Debug, SurrealValue)]
struct RefreshTokenRowWithId {
    record_id: String,
    user_id: String,
    token_hash: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
    replaced_by_token_id: Option<String>,
}

fn parse_uuid(s: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
}

impl RefreshTokenRow {
    fn into_token(self, id: Uuid) -> Result<RefreshToken, DbError> {
        Ok(RefreshToken {
            id,
            user_id: parse_uuid(&self.user_id, "user")?,
            token_hash: self.token_hash,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            revoked_at: self.revoked_at,
            replaced_by_token_id: self
                .replaced_by_token_id
                .as_deref()
                .map(|s| parse_uuid(s, "successor"))
                .transpose()?,
        })
    }
}

impl RefreshTokenRowWithId {
    fn try_into_token(self) -> Result<RefreshToken, DbError> {
        let id = parse_uuid(&self.record_id, "token")?;
        Ok(RefreshToken {
            id,
            user_id: parse_uuid(&self.user_id, "user")?,
            token_hash: self.token_hash,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            revoked_at: self.revoked_at,
            replaced_by_token_id: self
                .replaced_by_token_id
                .as_deref()
                .map(|s| parse_uuid(s, "successor"))
                .transpose()?,
        })
    }
}

/// SurrealDB implementation of the refresh token repository.
#[derive(Clone)]
pub struct SurrealRefreshTokenRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRefreshTokenRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RefreshTokenRepository for SurrealRefreshTokenRepository<C> {
    async fn create(&self, input: CreateRefreshToken) -> VaultResult<RefreshToken> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('refresh_token', $id) SET \
                 user_id = $user_id, \
                 token_hash = $token_hash, \
                 expires_at = $expires_at, \
                 revoked_at = NONE, \
                 replaced_by_token_id = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("token_hash", input.token_hash))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<RefreshTokenRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "refresh_token".into(),
            id: id_str,
        })?;

        Ok(row.into_token(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> VaultResult<RefreshToken> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('refresh_token', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RefreshTokenRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "refresh_token".into(),
            id: id_str,
        })?;

        Ok(row.into_token(id)?)
    }

    async fn get_by_token_hash(&self, token_hash: &str) -> VaultResult<RefreshToken> {
        let token_hash_owned = token_hash.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM refresh_token \
                 WHERE token_hash = $token_hash",
            )
            .bind(("token_hash", token_hash_owned))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RefreshTokenRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "refresh_token".into(),
            id: "token_hash".into(),
        })?;

        Ok(row.try_into_token()?)
    }

    async fn consume(&self, token_hash: &str) -> VaultResult<Option<RefreshToken>> {
        let token_hash_owned = token_hash.to_string();

        // Atomic redeem: the row is revoked in the same statement that
        // selects it, so a second presenter gets an empty result.
        let result = self
            .db
            .query(
                "UPDATE refresh_token SET revoked_at = time::now() \
                 WHERE token_hash = $token_hash \
                 AND revoked_at IS NONE \
                 AND expires_at > time::now() \
                 RETURN meta::id(id) AS record_id, user_id, token_hash, \
                 issued_at, expires_at, revoked_at, replaced_by_token_id",
            )
            .bind(("token_hash", token_hash_owned))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<RefreshTokenRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_token()?)),
            None => Ok(None),
        }
    }

    async fn link_successor(&self, id: Uuid, successor_id: Uuid) -> VaultResult<()> {
        self.db
            .query(
                "UPDATE type::record('refresh_token', $id) SET \
                 replaced_by_token_id = $successor_id",
            )
            .bind(("id", id.to_string()))
            .bind(("successor_id", successor_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(())
    }

    async fn revoke(&self, id: Uuid) -> VaultResult<()> {
        // Revocation is terminal: an already-revoked row keeps its
        // original timestamp.
        self.db
            .query(
                "UPDATE type::record('refresh_token', $id) SET \
                 revoked_at = time::now() \
                 WHERE revoked_at IS NONE",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> VaultResult<u64> {
        let result = self
            .db
            .query(
                "UPDATE refresh_token SET revoked_at = time::now() \
                 WHERE user_id = $user_id \
                 AND revoked_at IS NONE \
                 RETURN meta::id(id) AS record_id, user_id, token_hash, \
                 issued_at, expires_at, revoked_at, replaced_by_token_id",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<RefreshTokenRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows.len() as u64)
    }
}
