//! The permission gate called by the external record store before it
//! applies any change.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use comanager_auth::{PermissionDecision, check_permission};
use comanager_core::models::permission::{Action, Resource};
use serde::Deserialize;
use uuid::Uuid;

use super::auth::Principal;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/authorize", post(authorize))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeRequest {
    pub resource: String,
    pub action: String,
    pub resource_id: Option<String>,
    /// Owner of the target record, when the operation needs the
    /// ownership cross-check.
    pub resource_owner_id: Option<Uuid>,
}

async fn authorize(
    State(state): State<AppState>,
    Principal(ctx): Principal,
    Json(req): Json<AuthorizeRequest>,
) -> Result<(StatusCode, Json<PermissionDecision>), ApiError> {
    let resource: Resource = req.resource.parse()?;
    let action: Action = req.action.parse()?;

    let decision = check_permission(&ctx, resource, action, req.resource_owner_id);
    state
        .audit
        .record_decision(
            &ctx,
            action.as_str(),
            resource.as_str(),
            req.resource_id,
            &decision,
        )
        .await;

    let status = if decision.allowed {
        StatusCode::OK
    } else {
        StatusCode::FORBIDDEN
    };
    Ok((status, Json(decision)))
}
