//! SurrealDB implementation of [`UserRepository`].
//!
//! Protected fields arrive already encrypted and are stored
//! decomposed: ciphertext, redacted display form, and (for the email)
//! the deterministic lookup hash. The lockout counter mutations are
//! single UPDATE statements so racing failures all count.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use taskvault_core::error::VaultResult;
use taskvault_core::models::user::{CreateUser, Role, User};
use taskvault_core::repository::UserRepository;
use taskvault_protect::ProtectedField;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    email_ciphertext: String,
    email_redacted: String,
    email_hash: String,
    display_name_ciphertext: String,
    display_name_redacted: String,
    password_hash: String,
    roles: Vec<String>,
    is_active: bool,
    failed_access_count: u32,
    lockout_end: Option<DateTime<Utc>>,
    deactivated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    email_ciphertext: String,
    email_redacted: String,
    email_hash: String,
    display_name_ciphertext: String,
    display_name_redacted: String,
    password_hash: String,
    roles: Vec<String>,
    is_active: bool,
    failed_access_count: u32,
    lockout_end: Option<DateTime<Utc>>,
    deactivated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_roles(names: Vec<String>) -> Result<BTreeSet<Role>, DbError> {
    names
        .into_iter()
        .map(|name| {
            Role::parse(&name).ok_or_else(|| DbError::Decode(format!("unknown role: {name}")))
        })
        .collect()
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, DbError> {
        Ok(User {
            id,
            email: ProtectedField::Encrypted {
                ciphertext: self.email_ciphertext,
                redacted: self.email_redacted,
                hash: Some(self.email_hash),
            },
            display_name: ProtectedField::Encrypted {
                ciphertext: self.display_name_ciphertext,
                redacted: self.display_name_redacted,
                hash: None,
            },
            password_hash: self.password_hash,
            roles: parse_roles(self.roles)?,
            is_active: self.is_active,
            failed_access_count: self.failed_access_count,
            lockout_end: self.lockout_end,
            deactivated_at: self.deactivated_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        Ok(User {
            id,
            email: ProtectedField::Encrypted {
                ciphertext: self.email_ciphertext,
                redacted: self.email_redacted,
                hash: Some(self.email_hash),
            },
            display_name: ProtectedField::Encrypted {
                ciphertext: self.display_name_ciphertext,
                redacted: self.display_name_redacted,
                hash: None,
            },
            password_hash: self.password_hash,
            roles: parse_roles(self.roles)?,
            is_active: self.is_active,
            failed_access_count: self.failed_access_count,
            lockout_end: self.lockout_end,
            deactivated_at: self.deactivated_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Pull (ciphertext, redacted) out of an at-rest protected field.
fn encrypted_parts(field: &ProtectedField, name: &str) -> Result<(String, String), DbError> {
    match (field.ciphertext(), field.redacted()) {
        (Some(c), Some(r)) => Ok((c.to_string(), r.to_string())),
        _ => Err(DbError::Decode(format!(
            "{name} must be in the encrypted state before storage"
        ))),
    }
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> VaultResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let (email_ciphertext, email_redacted) = encrypted_parts(&input.email, "email")?;
        let email_hash = input
            .email
            .hash()
            .ok_or_else(|| DbError::Decode("email must carry a lookup hash".into()))?
            .to_string();
        let (display_name_ciphertext, display_name_redacted) =
            encrypted_parts(&input.display_name, "display_name")?;
        let roles: Vec<String> = input.roles.iter().map(|r| r.as_str().to_string()).collect();

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 email_ciphertext = $email_ciphertext, \
                 email_redacted = $email_redacted, \
                 email_hash = $email_hash, \
                 display_name_ciphertext = $display_name_ciphertext, \
                 display_name_redacted = $display_name_redacted, \
                 password_hash = $password_hash, \
                 roles = $roles, \
                 is_active = true, \
                 failed_access_count = 0, \
                 lockout_end = NONE, \
                 deactivated_at = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("email_ciphertext", email_ciphertext))
            .bind(("email_redacted", email_redacted))
            .bind(("email_hash", email_hash))
            .bind(("display_name_ciphertext", display_name_ciphertext))
            .bind(("display_name_redacted", display_name_redacted))
            .bind(("password_hash", input.password_hash))
            .bind(("roles", roles))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> VaultResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_email_hash(&self, email_hash: &str) -> VaultResult<User> {
        let email_hash_owned = email_hash.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE email_hash = $email_hash",
            )
            .bind(("email_hash", email_hash_owned))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            // Hash, not address: errors must not leak the lookup key.
            id: "email_hash".into(),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn record_failed_attempt(
        &self,
        id: Uuid,
        max_attempts: u32,
        lockout_end: DateTime<Utc>,
    ) -> VaultResult<User> {
        let id_str = id.to_string();

        // One statement so concurrent failures each count. The IF
        // evaluates against the pre-update document, so the threshold
        // compares the pre-image counter plus the failure being
        // recorded.
        let result = self
            .db
            .query(
                "UPDATE type::record('user', $id) SET \
                 failed_access_count += 1, \
                 lockout_end = IF failed_access_count + 1 >= $max_attempts \
                 { $lockout_end } ELSE { lockout_end }, \
                 updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("max_attempts", max_attempts))
            .bind(("lockout_end", lockout_end))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn reset_failed_attempts(&self, id: Uuid) -> VaultResult<User> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('user', $id) SET \
                 failed_access_count = 0, \
                 lockout_end = NONE, \
                 updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn deactivate(&self, id: Uuid) -> VaultResult<Option<User>> {
        let id_str = id.to_string();

        // Conditional transition; the first deactivation timestamp is
        // kept across any later reactivate/deactivate cycles.
        let result = self
            .db
            .query(
                "UPDATE type::record('user', $id) SET \
                 is_active = false, \
                 deactivated_at = deactivated_at ?? time::now(), \
                 updated_at = time::now() \
                 WHERE is_active = true",
            )
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.into_user(id)?)),
            None => Ok(None),
        }
    }

    async fn reactivate(&self, id: Uuid) -> VaultResult<Option<User>> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('user', $id) SET \
                 is_active = true, \
                 updated_at = time::now() \
                 WHERE is_active = false",
            )
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.into_user(id)?)),
            None => Ok(None),
        }
    }

    async fn assign_role(&self, id: Uuid, role: Role) -> VaultResult<Option<User>> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('user', $id) SET \
                 roles += $role, \
                 updated_at = time::now() \
                 WHERE roles CONTAINSNOT $role",
            )
            .bind(("id", id_str))
            .bind(("role", role.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.into_user(id)?)),
            None => Ok(None),
        }
    }

    async fn remove_role(&self, id: Uuid, role: Role) -> VaultResult<Option<User>> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('user', $id) SET \
                 roles -= $role, \
                 updated_at = time::now() \
                 WHERE roles CONTAINS $role",
            )
            .bind(("id", id_str))
            .bind(("role", role.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.into_user(id)?)),
            None => Ok(None),
        }
    }
}
