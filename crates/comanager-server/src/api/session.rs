//! Login, password rotation and context introspection.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use comanager_auth::AuthContext;
use comanager_core::models::delegate::DelegateProfile;
use comanager_core::models::permission::PermissionMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::auth::Principal;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/change-password", post(change_password))
        .route("/me", get(me))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub delegate_id: Uuid,
    pub owner_id: Uuid,
    pub permissions: PermissionMap,
    pub token: String,
    pub requires_password_change: bool,
    pub expires_in: u64,
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let auth = match state
        .issuer
        .authenticate_delegate(&req.email, &req.password)
        .await
    {
        Ok(auth) => auth,
        Err(e) => {
            // Unknown emails have no tenant to file the attempt under.
            if let Some((delegate_id, owner_id)) = state.issuer.principal_for(&req.email).await {
                let ctx = AuthContext::Delegate {
                    delegate_id,
                    owner_id,
                    permissions: PermissionMap::new(),
                };
                state
                    .audit
                    .record(&ctx, "login", "session", None, Err(e.to_string()))
                    .await;
            }
            return Err(e.into());
        }
    };

    let ctx = AuthContext::Delegate {
        delegate_id: auth.delegate.id,
        owner_id: auth.owner_id,
        permissions: auth.permissions.clone(),
    };
    state.audit.record(&ctx, "login", "session", None, Ok(())).await;

    Ok(Json(LoginResponse {
        delegate_id: auth.delegate.id,
        owner_id: auth.owner_id,
        permissions: auth.permissions,
        token: auth.token,
        requires_password_change: auth.requires_password_change,
        expires_in: auth.expires_in,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub delegate_id: Uuid,
    pub current_password: String,
    pub new_password: String,
}

async fn change_password(
    State(state): State<AppState>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .credentials
        .change_password(req.delegate_id, &req.current_password, &req.new_password)
        .await?;
    state.resolver.invalidate_profile(req.delegate_id);

    Ok(Json(serde_json::json!({ "changed": true })))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub kind: String,
    pub owner_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delegate_id: Option<Uuid>,
    pub permissions: PermissionMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<DelegateProfile>,
}

async fn me(
    State(state): State<AppState>,
    Principal(ctx): Principal,
) -> Json<MeResponse> {
    let profile = state.resolver.display_profile(&ctx).await;
    let delegate_id = match &ctx {
        AuthContext::Owner { .. } => None,
        AuthContext::Delegate { delegate_id, .. } => Some(*delegate_id),
    };

    Json(MeResponse {
        kind: if ctx.acting_as_delegate() { "delegate" } else { "owner" }.to_string(),
        owner_id: ctx.owner_id(),
        delegate_id,
        permissions: ctx.permissions().into_owned(),
        profile,
    })
}
