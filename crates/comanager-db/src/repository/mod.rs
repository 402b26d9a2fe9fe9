//! SurrealDB repository implementations.

mod audit;
mod delegate;
mod owner;

pub use audit::SurrealAuditLogRepository;
pub use delegate::SurrealDelegateRepository;
pub use owner::SurrealOwnerRepository;

use uuid::Uuid;

use crate::error::DbError;

/// Parse a UUID stored as a string column.
fn parse_uuid(field: &str, value: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Decode(format!("invalid {field} UUID: {e}")))
}
