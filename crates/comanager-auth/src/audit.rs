//! Best-effort audit recording and scoped audit queries.

use comanager_core::error::{ComanagerError, ComanagerResult};
use comanager_core::models::audit::{AuditRecord, CreateAuditRecord};
use comanager_core::repository::{AuditFilter, AuditLogRepository};
use tracing::{debug, error};

use crate::config::AuthConfig;
use crate::context::AuthContext;
use crate::permission::PermissionDecision;

/// Appends audit records without ever failing the operation being
/// recorded, and answers filtered, bounded queries.
pub struct AuditRecorder<A: AuditLogRepository> {
    audit_repo: A,
    default_limit: u64,
    max_limit: u64,
}

impl<A: AuditLogRepository> AuditRecorder<A> {
    /// A zero maximum is treated as 1 so every query can return a row.
    pub fn new(audit_repo: A, config: &AuthConfig) -> Self {
        Self {
            audit_repo,
            default_limit: config.audit_default_limit,
            max_limit: config.audit_max_limit.max(1),
        }
    }

    /// Append a record. The store assigns the timestamp.
    ///
    /// A failed append is logged and swallowed; `None` is returned.
    pub async fn append(&self, record: CreateAuditRecord) -> Option<AuditRecord> {
        let action = record.action.clone();
        let actor_id = record.actor_id;

        match self.audit_repo.append(record).await {
            Ok(stored) => {
                debug!(audit_id = %stored.id, action = %stored.action, "Audit record appended");
                Some(stored)
            }
            Err(e) => {
                error!(
                    actor_id = %actor_id,
                    action = %action,
                    error = %e,
                    "Failed to append audit record"
                );
                None
            }
        }
    }

    /// Record an action performed by `ctx`.
    pub async fn record(
        &self,
        ctx: &AuthContext,
        action: &str,
        resource: &str,
        resource_id: Option<String>,
        outcome: Result<(), String>,
    ) -> Option<AuditRecord> {
        let (success, error_detail) = match outcome {
            Ok(()) => (true, None),
            Err(detail) => (false, Some(detail)),
        };
        self.append(CreateAuditRecord {
            actor_id: ctx.actor_id(),
            actor_kind: ctx.actor_kind(),
            owner_id: ctx.owner_id(),
            action: action.to_string(),
            resource: resource.to_string(),
            resource_id,
            success,
            error_detail,
        })
        .await
    }

    /// Record the outcome of a permission check. Denials carry the
    /// decision reason as the error detail.
    pub async fn record_decision(
        &self,
        ctx: &AuthContext,
        action: &str,
        resource: &str,
        resource_id: Option<String>,
        decision: &PermissionDecision,
    ) -> Option<AuditRecord> {
        let outcome = if decision.allowed {
            Ok(())
        } else {
            Err(decision.reason.to_string())
        };
        self.record(ctx, action, resource, resource_id, outcome)
            .await
    }

    /// Query records matching `filter`, newest first.
    ///
    /// `limit` defaults to the configured default and is capped at the
    /// configured maximum.
    pub async fn query(
        &self,
        filter: AuditFilter,
        limit: Option<u64>,
    ) -> ComanagerResult<Vec<AuditRecord>> {
        if filter.is_empty() {
            return Err(ComanagerError::validation(
                "audit query needs an owner, delegate or resource filter",
            ));
        }
        if filter.resource_id.is_some() && filter.resource.is_none() {
            return Err(ComanagerError::validation(
                "resourceId filter requires a resource",
            ));
        }

        let limit = limit
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit);
        self.audit_repo.query(filter, limit).await
    }
}
