//! Owner domain model.
//!
//! Owners are the primary tenant accounts. Their credentials live with an
//! external identity provider; this crate only needs their identity and
//! email (for cross-collection email uniqueness).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOwner {
    pub email: String,
    pub name: String,
}
