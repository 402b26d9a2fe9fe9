//! HTTP routes.

pub mod audit;
pub mod auth;
pub mod authorize;
pub mod delegates;
pub mod session;

use axum::Router;

use crate::state::AppState;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(session::router())
        .merge(authorize::router())
        .merge(delegates::router())
        .merge(audit::router())
        .with_state(state)
}
