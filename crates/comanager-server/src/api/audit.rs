//! Tenant-scoped audit log queries.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use comanager_core::models::audit::AuditRecord;
use comanager_core::repository::AuditFilter;
use serde::Deserialize;
use uuid::Uuid;

use super::auth::Principal;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/audit-logs", get(query_audit_logs))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub owner_id: Option<Uuid>,
    pub delegate_id: Option<Uuid>,
    pub resource: Option<String>,
    pub resource_id: Option<String>,
    pub limit: Option<u64>,
}

/// Owner-only. The `ownerId` criterion is always the caller's own tenant;
/// naming another tenant is refused rather than silently rewritten.
async fn query_audit_logs(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditRecord>>, ApiError> {
    let owner_id = principal.require_owner()?;
    if query.owner_id.is_some_and(|requested| requested != owner_id) {
        return Err(ApiError::Forbidden(
            "audit logs of another tenant".into(),
        ));
    }

    let filter = AuditFilter {
        owner_id: Some(owner_id),
        delegate_id: query.delegate_id,
        resource: query.resource,
        resource_id: query.resource_id,
    };
    let records = state.audit.query(filter, query.limit).await?;
    Ok(Json(records))
}
