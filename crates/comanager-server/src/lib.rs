//! Co-manager server: the HTTP surface over the auth and db crates.

pub mod api;
pub mod config;
pub mod error;
pub mod state;

pub use config::{ConfigError, ServerArgs};
pub use error::ApiError;
pub use state::AppState;
