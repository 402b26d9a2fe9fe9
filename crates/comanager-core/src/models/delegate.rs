//! Delegate (co-manager) domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::permission::{PermissionGrant, PermissionMap};

/// Fixed least-privilege role tag carried by every Delegate.
pub const DELEGATE_ROLE: &str = "co-manager";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DelegateStatus {
    Active,
    Suspended,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delegate {
    pub id: Uuid,
    /// The Owner whose tenant scope this Delegate acts in.
    pub owner_id: Uuid,
    pub email: String,
    pub name: String,
    /// Argon2id PHC string. Empty while no password has been provisioned.
    pub password_hash: String,
    pub is_password_set: bool,
    /// Set while the Delegate is still on a provisioning/temporary password.
    pub requires_password_change: bool,
    pub status: DelegateStatus,
    pub grants: Vec<PermissionGrant>,
    pub role: String,
    pub last_login: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Delegate {
    /// The permission snapshot derived from the stored grants.
    pub fn permissions(&self) -> PermissionMap {
        PermissionMap::from_grants(&self.grants)
    }

    /// Strip the password hash before handing the record to callers.
    pub fn to_profile(&self) -> DelegateProfile {
        DelegateProfile {
            id: self.id,
            owner_id: self.owner_id,
            email: self.email.clone(),
            name: self.name.clone(),
            is_password_set: self.is_password_set,
            requires_password_change: self.requires_password_change,
            status: self.status,
            grants: self.grants.clone(),
            role: self.role.clone(),
            last_login: self.last_login,
            created_by: self.created_by,
            created_at: self.created_at,
        }
    }
}

/// A Delegate record without its password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DelegateProfile {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub email: String,
    pub name: String,
    pub is_password_set: bool,
    pub requires_password_change: bool,
    pub status: DelegateStatus,
    pub grants: Vec<PermissionGrant>,
    pub role: String,
    pub last_login: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Fields required to persist a new Delegate.
///
/// The password arrives here already hashed; hashing is the job of the
/// credential lifecycle manager, not the store.
#[derive(Debug, Clone)]
pub struct CreateDelegate {
    pub owner_id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: Option<String>,
    pub requires_password_change: bool,
    pub grants: Vec<PermissionGrant>,
    pub created_by: Uuid,
}

/// Fields that can be updated on an existing Delegate.
#[derive(Debug, Clone, Default)]
pub struct UpdateDelegate {
    pub name: Option<String>,
    pub status: Option<DelegateStatus>,
    pub grants: Option<Vec<PermissionGrant>>,
    pub password_hash: Option<String>,
    pub is_password_set: Option<bool>,
    pub requires_password_change: Option<bool>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Trim and lower-case an email so lookups are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
