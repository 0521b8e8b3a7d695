//! SurrealDB implementation of [`AuditLogRepository`].
//!
//! Append and list are the entire surface; the table permissions in
//! the schema forbid update and delete outright. Page sizes are
//! clamped here, at the storage boundary, so no caller can request an
//! unbounded result set.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use taskvault_core::error::VaultResult;
use taskvault_core::models::audit::{
    AuditAction, AuditEntry, CreateAuditEntry, ResourceKind, RevealReason,
};
use taskvault_core::repository::{AuditFilter, AuditLogRepository, PaginatedResult, Pagination};
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AuditRow {
    action: String,
    resource_type: String,
    resource_id: String,
    actor_id: String,
    reason: Option<String>,
    details: Option<String>,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct AuditRowWithId {
    record_id: String,
    action: String,
    resource_type: String,
    resource_id: String,
    actor_id: String,
    reason: Option<String>,
    details: Option<String>,
    timestamp: DateTime<Utc>,
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_uuid(s: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
}

fn row_to_entry(row: AuditRow, id: Uuid) -> Result<AuditEntry, DbError> {
    Ok(AuditEntry {
        id,
        action: AuditAction::parse(&row.action)
            .ok_or_else(|| DbError::Decode(format!("unknown audit action: {}", row.action)))?,
        resource_type: ResourceKind::parse(&row.resource_type).ok_or_else(|| {
            DbError::Decode(format!("unknown resource kind: {}", row.resource_type))
        })?,
        resource_id: parse_uuid(&row.resource_id, "resource")?,
        actor_id: parse_uuid(&row.actor_id, "actor")?,
        reason: row
            .reason
            .as_deref()
            .map(|r| {
                RevealReason::parse(r)
                    .ok_or_else(|| DbError::Decode(format!("unknown reveal reason: {r}")))
            })
            .transpose()?,
        details: row.details,
        timestamp: row.timestamp,
    })
}

impl AuditRowWithId {
    fn try_into_entry(self) -> Result<AuditEntry, DbError> {
        let id = parse_uuid(&self.record_id, "entry")?;
        row_to_entry(
            AuditRow {
                action: self.action,
                resource_type: self.resource_type,
                resource_id: self.resource_id,
                actor_id: self.actor_id,
                reason: self.reason,
                details: self.details,
                timestamp: self.timestamp,
            },
            id,
        )
    }
}

/// SurrealDB implementation of the audit log repository.
#[derive(Clone)]
pub struct SurrealAuditLogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAuditLogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AuditLogRepository for SurrealAuditLogRepository<C> {
    async fn append(&self, input: CreateAuditEntry) -> VaultResult<AuditEntry> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('audit_entry', $id) SET \
                 action = $action, \
                 resource_type = $resource_type, \
                 resource_id = $resource_id, \
                 actor_id = $actor_id, \
                 reason = $reason, \
                 details = $details",
            )
            .bind(("id", id_str.clone()))
            .bind(("action", input.action.as_str().to_string()))
            .bind(("resource_type", input.resource_type.as_str().to_string()))
            .bind(("resource_id", input.resource_id.to_string()))
            .bind(("actor_id", input.actor_id.to_string()))
            .bind(("reason", input.reason.map(|r| r.as_str().to_string())))
            .bind(("details", input.details))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<AuditRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "audit_entry".into(),
            id: id_str,
        })?;

        Ok(row_to_entry(row, id)?)
    }

    async fn list(
        &self,
        filter: AuditFilter,
        pagination: Pagination,
    ) -> VaultResult<PaginatedResult<AuditEntry>> {
        let pagination = pagination.clamped();

        let mut conditions = Vec::new();
        if filter.action.is_some() {
            conditions.push("action = $action");
        }
        if filter.resource_type.is_some() {
            conditions.push("resource_type = $resource_type");
        }
        if filter.resource_id.is_some() {
            conditions.push("resource_id = $resource_id");
        }
        if filter.actor_id.is_some() {
            conditions.push("actor_id = $actor_id");
        }
        if filter.from.is_some() {
            conditions.push("timestamp >= $from");
        }
        if filter.to.is_some() {
            conditions.push("timestamp < $to");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let count_query =
            format!("SELECT count() AS total FROM audit_entry{where_clause} GROUP ALL");
        let page_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM audit_entry{where_clause} \
             ORDER BY timestamp DESC \
             LIMIT $limit START $offset"
        );

        let mut count_builder = self.db.query(&count_query);
        if let Some(action) = filter.action {
            count_builder = count_builder.bind(("action", action.as_str().to_string()));
        }
        if let Some(resource_type) = filter.resource_type {
            count_builder =
                count_builder.bind(("resource_type", resource_type.as_str().to_string()));
        }
        if let Some(resource_id) = filter.resource_id {
            count_builder = count_builder.bind(("resource_id", resource_id.to_string()));
        }
        if let Some(actor_id) = filter.actor_id {
            count_builder = count_builder.bind(("actor_id", actor_id.to_string()));
        }
        if let Some(from) = filter.from {
            count_builder = count_builder.bind(("from", from));
        }
        if let Some(to) = filter.to {
            count_builder = count_builder.bind(("to", to));
        }

        let mut count_result = count_builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut builder = self
            .db
            .query(&page_query)
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        if let Some(action) = filter.action {
            builder = builder.bind(("action", action.as_str().to_string()));
        }
        if let Some(resource_type) = filter.resource_type {
            builder = builder.bind(("resource_type", resource_type.as_str().to_string()));
        }
        if let Some(resource_id) = filter.resource_id {
            builder = builder.bind(("resource_id", resource_id.to_string()));
        }
        if let Some(actor_id) = filter.actor_id {
            builder = builder.bind(("actor_id", actor_id.to_string()));
        }
        if let Some(from) = filter.from {
            builder = builder.bind(("from", from));
        }
        if let Some(to) = filter.to {
            builder = builder.bind(("to", to));
        }

        let mut result = builder.await.map_err(DbError::from)?;

        let rows: Vec<AuditRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_entry())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
