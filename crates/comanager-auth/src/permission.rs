//! Permission evaluation against the resource × action matrix.
//!
//! Pure and synchronous: the decision depends on the [`AuthContext`]
//! only, so it can gate an operation before anything reaches the store.

use std::fmt;

use comanager_core::error::{ComanagerError, ComanagerResult};
use comanager_core::models::permission::{Action, Resource};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::AuthContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionReason {
    Granted,
    OwnerBypass,
    ResourceNotGranted,
    ActionNotGranted,
    OwnershipMismatch,
}

impl DecisionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionReason::Granted => "granted",
            DecisionReason::OwnerBypass => "owner-bypass",
            DecisionReason::ResourceNotGranted => "resource-not-granted",
            DecisionReason::ActionNotGranted => "action-not-granted",
            DecisionReason::OwnershipMismatch => "ownership-mismatch",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDecision {
    pub allowed: bool,
    pub reason: DecisionReason,
}

impl PermissionDecision {
    fn allow(reason: DecisionReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    fn deny(reason: DecisionReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

/// Decide whether `ctx` may perform `action` on `resource`.
///
/// When `resource_owner_id` is given the target record must also belong
/// to the Delegate's own Owner.
pub fn check_permission(
    ctx: &AuthContext,
    resource: Resource,
    action: Action,
    resource_owner_id: Option<Uuid>,
) -> PermissionDecision {
    let AuthContext::Delegate {
        owner_id,
        permissions,
        ..
    } = ctx
    else {
        return PermissionDecision::allow(DecisionReason::OwnerBypass);
    };

    let Some(actions) = permissions.actions(resource) else {
        return PermissionDecision::deny(DecisionReason::ResourceNotGranted);
    };
    if !actions.contains(&action) {
        return PermissionDecision::deny(DecisionReason::ActionNotGranted);
    }
    if resource_owner_id.is_some_and(|target| target != *owner_id) {
        return PermissionDecision::deny(DecisionReason::OwnershipMismatch);
    }

    PermissionDecision::allow(DecisionReason::Granted)
}

/// [`check_permission`] as a `Result`, for `?`-style gating.
pub fn require_permission(
    ctx: &AuthContext,
    resource: Resource,
    action: Action,
    resource_owner_id: Option<Uuid>,
) -> ComanagerResult<PermissionDecision> {
    let decision = check_permission(ctx, resource, action, resource_owner_id);
    if decision.allowed {
        Ok(decision)
    } else {
        Err(ComanagerError::PermissionDenied {
            reason: decision.reason.to_string(),
        })
    }
}
