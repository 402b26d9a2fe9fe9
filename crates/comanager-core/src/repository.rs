//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Owner-scoped reads take the
//! `owner_id` explicitly so implementations can enforce tenant isolation
//! in the query itself.

use uuid::Uuid;

use crate::error::ComanagerResult;
use crate::models::{
    audit::{AuditRecord, CreateAuditRecord},
    delegate::{CreateDelegate, Delegate, UpdateDelegate},
    owner::{CreateOwner, Owner},
};

// ---------------------------------------------------------------------------
// Owners (global scope)
// ---------------------------------------------------------------------------

pub trait OwnerRepository: Send + Sync {
    fn create(&self, input: CreateOwner) -> impl Future<Output = ComanagerResult<Owner>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ComanagerResult<Owner>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = ComanagerResult<Owner>> + Send;
}

// ---------------------------------------------------------------------------
// Delegates (owner-scoped, email is globally unique)
// ---------------------------------------------------------------------------

pub trait DelegateRepository: Send + Sync {
    fn create(
        &self,
        input: CreateDelegate,
    ) -> impl Future<Output = ComanagerResult<Delegate>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ComanagerResult<Delegate>> + Send;
    fn get_by_email(&self, email: &str)
    -> impl Future<Output = ComanagerResult<Delegate>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateDelegate,
    ) -> impl Future<Output = ComanagerResult<Delegate>> + Send;
    /// Hard delete. Terminal: the record and its credentials are gone.
    fn delete(&self, owner_id: Uuid, id: Uuid) -> impl Future<Output = ComanagerResult<()>> + Send;
    fn list_by_owner(
        &self,
        owner_id: Uuid,
    ) -> impl Future<Output = ComanagerResult<Vec<Delegate>>> + Send;
}

// ---------------------------------------------------------------------------
// Audit (append-only)
// ---------------------------------------------------------------------------

/// Query filters for audit records. Set criteria are AND-ed together.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub owner_id: Option<Uuid>,
    pub delegate_id: Option<Uuid>,
    pub resource: Option<String>,
    pub resource_id: Option<String>,
}

impl AuditFilter {
    pub fn for_owner(owner_id: Uuid) -> Self {
        Self {
            owner_id: Some(owner_id),
            ..Default::default()
        }
    }

    pub fn for_delegate(delegate_id: Uuid) -> Self {
        Self {
            delegate_id: Some(delegate_id),
            ..Default::default()
        }
    }

    pub fn for_resource(resource: impl Into<String>, resource_id: Option<String>) -> Self {
        Self {
            resource: Some(resource.into()),
            resource_id,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.owner_id.is_none()
            && self.delegate_id.is_none()
            && self.resource.is_none()
            && self.resource_id.is_none()
    }
}

pub trait AuditLogRepository: Send + Sync {
    /// Append a new audit record. No update or delete operations exist.
    fn append(
        &self,
        input: CreateAuditRecord,
    ) -> impl Future<Output = ComanagerResult<AuditRecord>> + Send;
    /// Matching records, newest first, at most `limit` of them.
    fn query(
        &self,
        filter: AuditFilter,
        limit: u64,
    ) -> impl Future<Output = ComanagerResult<Vec<AuditRecord>>> + Send;
}
