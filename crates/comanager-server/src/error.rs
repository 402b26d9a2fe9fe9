use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use comanager_core::error::ComanagerError;

/// Transport-level error. The only place status codes are chosen.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ComanagerError> for ApiError {
    fn from(err: ComanagerError) -> Self {
        match err {
            ComanagerError::AuthenticationFailed { reason } => ApiError::Unauthorized(reason),
            ComanagerError::PermissionDenied { reason } => ApiError::Forbidden(reason),
            ComanagerError::Validation { message } => ApiError::BadRequest(message),
            ComanagerError::NotFound { entity, .. } => {
                ApiError::NotFound(format!("{entity} not found"))
            }
            ComanagerError::AlreadyExists { entity } => {
                ApiError::Conflict(format!("{entity} already exists"))
            }
            ComanagerError::Database(_)
            | ComanagerError::Crypto(_)
            | ComanagerError::Internal(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<comanager_auth::AuthError> for ApiError {
    fn from(err: comanager_auth::AuthError) -> Self {
        ComanagerError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ComanagerError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn error_kinds_map_to_status_codes() {
        assert_eq!(
            status_of(ComanagerError::AuthenticationFailed {
                reason: "invalid credentials".into()
            }),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(ComanagerError::PermissionDenied {
                reason: "action-not-granted".into()
            }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(ComanagerError::validation("bad")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ComanagerError::AlreadyExists {
                entity: "owner email".into()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ComanagerError::not_found("delegate", "x")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ComanagerError::Database("down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
