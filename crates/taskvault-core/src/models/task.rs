//! Task domain model.
//!
//! Only the slice of the task domain this core touches: the protected
//! note that can be revealed through the break-the-glass workflow.
//! Board/column/assignment logic lives outside this core.

use chrono::{DateTime, Utc};
use serde::Serialize;
use taskvault_protect::ProtectedField;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    /// Encrypted at rest; no equality lookup.
    pub note: ProtectedField,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Repository input; the note arrives already protected.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub owner_id: Uuid,
    pub title: String,
    pub note: ProtectedField,
}
