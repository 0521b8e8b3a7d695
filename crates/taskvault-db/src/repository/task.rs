//! SurrealDB implementation of [`TaskRepository`].
//!
//! Only the slice the reveal workflow needs: create a task with its
//! protected note and fetch it back by id.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use taskvault_core::error::VaultResult;
use taskvault_core::models::task::{CreateTask, Task};
use taskvault_core::repository::TaskRepository;
use taskvault_protect::ProtectedField;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct TaskRow {
    owner_id: String,
    title: String,
    note_ciphertext: String,
    note_redacted: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TaskRow {
    fn into_task(self, id: Uuid) -> Result<Task, DbError> {
        let owner_id = Uuid::parse_str(&self.owner_id)
            .map_err(|e| DbError::Decode(format!("invalid owner UUID: {e}")))?;
        Ok(Task {
            id,
            owner_id,
            title: self.title,
            note: ProtectedField::Encrypted {
                ciphertext: self.note_ciphertext,
                redacted: self.note_redacted,
                hash: None,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Task repository.
#[derive(Clone)]
pub struct SurrealTaskRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTaskRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TaskRepository for SurrealTaskRepository<C> {
    async fn create(&self, input: CreateTask) -> VaultResult<Task> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let (note_ciphertext, note_redacted) = match (
            input.note.ciphertext(),
            input.note.redacted(),
        ) {
            (Some(c), Some(r)) => (c.to_string(), r.to_string()),
            _ => {
                return Err(
                    DbError::Decode("note must be in the encrypted state before storage".into())
                        .into(),
                );
            }
        };

        let result = self
            .db
            .query(
                "CREATE type::record('task', $id) SET \
                 owner_id = $owner_id, \
                 title = $title, \
                 note_ciphertext = $note_ciphertext, \
                 note_redacted = $note_redacted",
            )
            .bind(("id", id_str.clone()))
            .bind(("owner_id", input.owner_id.to_string()))
            .bind(("title", input.title))
            .bind(("note_ciphertext", note_ciphertext))
            .bind(("note_redacted", note_redacted))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<TaskRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "task".into(),
            id: id_str,
        })?;

        Ok(row.into_task(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> VaultResult<Task> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('task', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TaskRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "task".into(),
            id: id_str,
        })?;

        Ok(row.into_task(id)?)
    }
}
