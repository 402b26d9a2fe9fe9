//! Owner-only Delegate management. Every call is audited, including the
//! ones refused because the caller is a Delegate.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use comanager_auth::{AuthContext, DelegateInput};
use comanager_core::models::delegate::DelegateProfile;
use comanager_core::models::permission::PermissionMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::auth::Principal;
use crate::error::ApiError;
use crate::state::AppState;

const RESOURCE: &str = "delegates";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/delegates", post(create_delegate).get(list_delegates))
        .route("/delegates/{id}", get(get_delegate).delete(delete_delegate))
        .route("/delegates/{id}/suspend", post(suspend_delegate))
        .route("/delegates/{id}/reactivate", post(reactivate_delegate))
        .route("/delegates/{id}/grants", put(update_grants))
        .route("/delegates/{id}/reset-password", post(reset_password))
}

/// Record the outcome of a management call and hand the result back.
async fn audited<T>(
    state: &AppState,
    ctx: &AuthContext,
    action: &str,
    resource_id: Option<Uuid>,
    result: Result<T, ApiError>,
) -> Result<T, ApiError> {
    let outcome = match &result {
        Ok(_) => Ok(()),
        Err(e) => Err(e.to_string()),
    };
    state
        .audit
        .record(
            ctx,
            action,
            RESOURCE,
            resource_id.map(|id| id.to_string()),
            outcome,
        )
        .await;
    result
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDelegateRequest {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub grants: PermissionMap,
    /// Initial password. Without one the Delegate is only invited.
    pub password: Option<String>,
    /// Force a password change on first login.
    #[serde(default)]
    pub temporary_password: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDelegateResponse {
    pub delegate_id: Uuid,
}

async fn create_delegate(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<CreateDelegateRequest>,
) -> Result<(StatusCode, Json<CreateDelegateResponse>), ApiError> {
    let result = async {
        let owner_id = principal.require_owner()?;
        let input = DelegateInput {
            owner_id,
            email: req.email,
            name: req.name,
            grants: req.grants.to_grants(),
            created_by: owner_id,
            temporary_password: req.temporary_password,
        };
        let id = match req.password {
            Some(password) => state.credentials.create(input, &password).await?,
            None => state.credentials.invite(input).await?,
        };
        Ok::<_, ApiError>(id)
    }
    .await;

    let created_id = result.as_ref().ok().copied();
    let id = audited(&state, &principal.0, "delegate.create", created_id, result).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateDelegateResponse { delegate_id: id }),
    ))
}

async fn list_delegates(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Vec<DelegateProfile>>, ApiError> {
    let owner_id = principal.require_owner()?;
    let delegates = state.credentials.list_delegates(owner_id).await?;
    Ok(Json(delegates))
}

async fn get_delegate(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<DelegateProfile>, ApiError> {
    let owner_id = principal.require_owner()?;
    let profile = state.credentials.get_delegate(owner_id, id).await?;
    Ok(Json(profile))
}

async fn suspend_delegate(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<DelegateProfile>, ApiError> {
    let result = async {
        let owner_id = principal.require_owner()?;
        Ok::<_, ApiError>(state.credentials.suspend(owner_id, id).await?)
    }
    .await;
    state.resolver.invalidate_profile(id);
    audited(&state, &principal.0, "delegate.suspend", Some(id), result)
        .await
        .map(Json)
}

async fn reactivate_delegate(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<DelegateProfile>, ApiError> {
    let result = async {
        let owner_id = principal.require_owner()?;
        Ok::<_, ApiError>(state.credentials.reactivate(owner_id, id).await?)
    }
    .await;
    state.resolver.invalidate_profile(id);
    audited(&state, &principal.0, "delegate.reactivate", Some(id), result)
        .await
        .map(Json)
}

#[derive(Debug, Deserialize)]
pub struct UpdateGrantsRequest {
    pub grants: PermissionMap,
}

async fn update_grants(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateGrantsRequest>,
) -> Result<Json<DelegateProfile>, ApiError> {
    let result = async {
        let owner_id = principal.require_owner()?;
        let profile = state
            .credentials
            .update_grants(owner_id, id, req.grants.to_grants())
            .await?;
        Ok::<_, ApiError>(profile)
    }
    .await;
    state.resolver.invalidate_profile(id);
    audited(&state, &principal.0, "delegate.update-grants", Some(id), result)
        .await
        .map(Json)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub temporary_password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordResponse {
    pub temporary_password: String,
}

async fn reset_password(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    body: Option<Json<ResetPasswordRequest>>,
) -> Result<Json<ResetPasswordResponse>, ApiError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let result = async {
        let owner_id = principal.require_owner()?;
        let temporary = state
            .credentials
            .reset_password(owner_id, id, req.temporary_password)
            .await?;
        Ok::<_, ApiError>(temporary)
    }
    .await;
    state.resolver.invalidate_profile(id);
    let temporary_password =
        audited(&state, &principal.0, "delegate.reset-password", Some(id), result).await?;
    Ok(Json(ResetPasswordResponse { temporary_password }))
}

async fn delete_delegate(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let result = async {
        let owner_id = principal.require_owner()?;
        Ok::<_, ApiError>(state.credentials.delete(owner_id, id).await?)
    }
    .await;
    state.resolver.invalidate_profile(id);
    audited(&state, &principal.0, "delegate.delete", Some(id), result).await?;
    Ok(StatusCode::NO_CONTENT)
}
