//! Bearer-token extraction.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use comanager_auth::AuthContext;
use comanager_auth::token::validate_access_token;

use crate::error::ApiError;
use crate::state::AppState;

/// The verified caller of a protected route.
#[derive(Debug, Clone)]
pub struct Principal(pub AuthContext);

impl Principal {
    /// Reject Delegates on Owner-only routes.
    pub fn require_owner(&self) -> Result<uuid::Uuid, ApiError> {
        match &self.0 {
            AuthContext::Owner { owner_id } => Ok(*owner_id),
            AuthContext::Delegate { .. } => {
                Err(ApiError::Forbidden("owner access required".into()))
            }
        }
    }
}

impl FromRequestParts<AppState> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::Unauthorized("missing bearer token".into()))?;

        let claims = validate_access_token(token.trim(), &state.config)?;
        let ctx = state.resolver.resolve(&claims)?;
        Ok(Principal(ctx))
    }
}
