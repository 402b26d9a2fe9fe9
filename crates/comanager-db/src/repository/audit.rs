//! SurrealDB implementation of [`AuditLogRepository`].
//!
//! The `audit_log` table denies `update` and `delete` at the schema
//! level; this repository only ever issues `CREATE` and `SELECT`.

use chrono::{DateTime, Utc};
use comanager_core::error::ComanagerResult;
use comanager_core::models::audit::{ActorKind, AuditRecord, CreateAuditRecord};
use comanager_core::repository::{AuditFilter, AuditLogRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AuditRow {
    owner_id: String,
    actor_id: String,
    actor_kind: String,
    action: String,
    resource: String,
    resource_id: Option<String>,
    success: bool,
    error_detail: Option<String>,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct AuditRowWithId {
    record_id: String,
    owner_id: String,
    actor_id: String,
    actor_kind: String,
    action: String,
    resource: String,
    resource_id: Option<String>,
    success: bool,
    error_detail: Option<String>,
    timestamp: DateTime<Utc>,
}

fn parse_actor_kind(s: &str) -> Result<ActorKind, DbError> {
    match s {
        "Owner" => Ok(ActorKind::Owner),
        "Delegate" => Ok(ActorKind::Delegate),
        other => Err(DbError::Decode(format!("unknown actor kind: {other}"))),
    }
}

fn actor_kind_to_string(kind: ActorKind) -> &'static str {
    match kind {
        ActorKind::Owner => "Owner",
        ActorKind::Delegate => "Delegate",
    }
}

impl AuditRow {
    fn into_record(self, id: Uuid) -> Result<AuditRecord, DbError> {
        Ok(AuditRecord {
            id,
            timestamp: self.timestamp,
            actor_id: parse_uuid("actor", &self.actor_id)?,
            actor_kind: parse_actor_kind(&self.actor_kind)?,
            owner_id: parse_uuid("owner", &self.owner_id)?,
            action: self.action,
            resource: self.resource,
            resource_id: self.resource_id,
            success: self.success,
            error_detail: self.error_detail,
        })
    }
}

impl AuditRowWithId {
    fn try_into_record(self) -> Result<AuditRecord, DbError> {
        let id = parse_uuid("audit", &self.record_id)?;
        AuditRow {
            owner_id: self.owner_id,
            actor_id: self.actor_id,
            actor_kind: self.actor_kind,
            action: self.action,
            resource: self.resource,
            resource_id: self.resource_id,
            success: self.success,
            error_detail: self.error_detail,
            timestamp: self.timestamp,
        }
        .into_record(id)
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
    async fn append(&self, input: CreateAuditRecord) -> ComanagerResult<AuditRecord> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('audit_log', $id) SET \
                 owner_id = $owner_id, \
                 actor_id = $actor_id, \
                 actor_kind = $actor_kind, \
                 action = $action, \
                 resource = $resource, \
                 resource_id = $resource_id, \
                 success = $success, \
                 error_detail = $error_detail",
            )
            .bind(("id", id_str.clone()))
            .bind(("owner_id", input.owner_id.to_string()))
            .bind(("actor_id", input.actor_id.to_string()))
            .bind(("actor_kind", actor_kind_to_string(input.actor_kind).to_string()))
            .bind(("action", input.action))
            .bind(("resource", input.resource))
            .bind(("resource_id", input.resource_id))
            .bind(("success", input.success))
            .bind(("error_detail", input.error_detail))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_write("audit_log", e))?;

        let rows: Vec<AuditRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "audit_log".into(),
            id: id_str,
        })?;

        Ok(row.into_record(id)?)
    }

    async fn query(&self, filter: AuditFilter, limit: u64) -> ComanagerResult<Vec<AuditRecord>> {
        let mut conditions = Vec::new();
        if filter.owner_id.is_some() {
            conditions.push("owner_id = $owner_id");
        }
        if filter.delegate_id.is_some() {
            conditions.push("actor_id = $delegate_id AND actor_kind = 'Delegate'");
        }
        if filter.resource.is_some() {
            conditions.push("resource = $resource");
        }
        if filter.resource_id.is_some() {
            conditions.push("resource_id = $resource_id");
        }
        if conditions.is_empty() {
            // An unscoped scan would cross tenants.
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM audit_log \
             WHERE {} \
             ORDER BY timestamp DESC \
             LIMIT $limit",
            conditions.join(" AND ")
        );

        let mut builder = self.db.query(&query).bind(("limit", limit));
        if let Some(owner_id) = filter.owner_id {
            builder = builder.bind(("owner_id", owner_id.to_string()));
        }
        if let Some(delegate_id) = filter.delegate_id {
            builder = builder.bind(("delegate_id", delegate_id.to_string()));
        }
        if let Some(resource) = filter.resource {
            builder = builder.bind(("resource", resource));
        }
        if let Some(resource_id) = filter.resource_id {
            builder = builder.bind(("resource_id", resource_id));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<AuditRowWithId> = result.take(0).map_err(DbError::from)?;

        let records = rows
            .into_iter()
            .map(|row| row.try_into_record())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(records)
    }
}
