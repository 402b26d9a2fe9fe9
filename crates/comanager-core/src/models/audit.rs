//! Audit log domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    Owner,
    Delegate,
}

/// An immutable audit entry. Never updated or deleted once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: Uuid,
    /// Server-side append time.
    pub timestamp: DateTime<Utc>,
    pub actor_id: Uuid,
    pub actor_kind: ActorKind,
    /// Tenant scope the action happened in.
    pub owner_id: Uuid,
    pub action: String,
    pub resource: String,
    pub resource_id: Option<String>,
    pub success: bool,
    pub error_detail: Option<String>,
}

/// Fields supplied by the caller when appending. The timestamp is
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct CreateAuditRecord {
    pub actor_id: Uuid,
    pub actor_kind: ActorKind,
    pub owner_id: Uuid,
    pub action: String,
    pub resource: String,
    pub resource_id: Option<String>,
    pub success: bool,
    pub error_detail: Option<String>,
}
