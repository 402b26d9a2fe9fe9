//! Resolution of verified token claims into an [`AuthContext`].
//!
//! Permission decisions come from the claims alone. The store is only
//! consulted, best-effort, for a display profile.

use std::borrow::Cow;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use comanager_core::error::ComanagerResult;
use comanager_core::models::audit::ActorKind;
use comanager_core::models::delegate::DelegateProfile;
use comanager_core::models::permission::PermissionMap;
use comanager_core::repository::DelegateRepository;
use parking_lot::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::token::ValidatedClaims;

/// Who is acting on a request, and with which rights.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthContext {
    /// The tenant account itself. Implicitly holds every permission.
    Owner { owner_id: Uuid },
    /// A co-manager acting inside `owner_id`'s tenant with the snapshot
    /// taken when its token was minted.
    Delegate {
        delegate_id: Uuid,
        owner_id: Uuid,
        permissions: PermissionMap,
    },
}

fn parse_id(field: &str, value: Option<&str>) -> Result<Uuid, AuthError> {
    let value = value.ok_or_else(|| AuthError::TokenInvalid(format!("missing {field} claim")))?;
    Uuid::parse_str(value).map_err(|e| AuthError::TokenInvalid(format!("bad {field} claim: {e}")))
}

impl AuthContext {
    /// Build the context from verified claims.
    ///
    /// A token without `isDelegate` (or with it `false`) is an Owner
    /// token; the owner id comes from `ownerId` when present, else `sub`.
    pub fn from_claims(claims: &ValidatedClaims) -> Result<Self, AuthError> {
        let claims = claims.claims();
        if !claims.is_delegate {
            let owner_id = parse_id(
                "ownerId",
                claims.owner_id.as_deref().or(Some(claims.sub.as_str())),
            )?;
            return Ok(AuthContext::Owner { owner_id });
        }

        Ok(AuthContext::Delegate {
            delegate_id: parse_id("delegateId", claims.delegate_id.as_deref())?,
            owner_id: parse_id("ownerId", claims.owner_id.as_deref())?,
            permissions: claims.permissions.clone().unwrap_or_default(),
        })
    }

    pub fn owner_id(&self) -> Uuid {
        match self {
            AuthContext::Owner { owner_id } | AuthContext::Delegate { owner_id, .. } => *owner_id,
        }
    }

    pub fn acting_as_delegate(&self) -> bool {
        matches!(self, AuthContext::Delegate { .. })
    }

    pub fn actor_id(&self) -> Uuid {
        match self {
            AuthContext::Owner { owner_id } => *owner_id,
            AuthContext::Delegate { delegate_id, .. } => *delegate_id,
        }
    }

    pub fn actor_kind(&self) -> ActorKind {
        match self {
            AuthContext::Owner { .. } => ActorKind::Owner,
            AuthContext::Delegate { .. } => ActorKind::Delegate,
        }
    }

    /// The effective permission matrix: the full matrix for an Owner, the
    /// token snapshot for a Delegate.
    pub fn permissions(&self) -> Cow<'_, PermissionMap> {
        match self {
            AuthContext::Owner { .. } => Cow::Owned(PermissionMap::full()),
            AuthContext::Delegate { permissions, .. } => Cow::Borrowed(permissions),
        }
    }
}

/// Short-lived display cache keyed by Delegate id.
///
/// Never read for a permission decision.
pub struct ProfileCache {
    ttl: Duration,
    entries: Mutex<HashMap<Uuid, (Instant, DelegateProfile)>>,
}

impl ProfileCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, id: Uuid) -> Option<DelegateProfile> {
        let mut entries = self.entries.lock();
        match entries.get(&id) {
            Some((stored_at, profile)) if stored_at.elapsed() < self.ttl => Some(profile.clone()),
            Some(_) => {
                entries.remove(&id);
                None
            }
            None => None,
        }
    }

    /// Store `profile`, dropping every entry that has already expired.
    pub fn insert(&self, profile: DelegateProfile) {
        let mut entries = self.entries.lock();
        entries.retain(|_, (stored_at, _)| stored_at.elapsed() < self.ttl);
        entries.insert(profile.id, (Instant::now(), profile));
    }

    pub fn invalidate(&self, id: Uuid) {
        self.entries.lock().remove(&id);
    }
}

/// Turns verified claims into an [`AuthContext`] and fetches display
/// profiles on the side.
pub struct ContextResolver<D: DelegateRepository> {
    delegate_repo: D,
    cache: ProfileCache,
}

impl<D: DelegateRepository> ContextResolver<D> {
    pub fn new(delegate_repo: D, config: &AuthConfig) -> Self {
        Self {
            delegate_repo,
            cache: ProfileCache::new(Duration::from_secs(config.profile_cache_ttl_secs)),
        }
    }

    pub fn resolve(&self, claims: &ValidatedClaims) -> ComanagerResult<AuthContext> {
        let ctx = AuthContext::from_claims(claims)?;
        debug!(
            actor_id = %ctx.actor_id(),
            owner_id = %ctx.owner_id(),
            delegate = ctx.acting_as_delegate(),
            "Resolved auth context"
        );
        Ok(ctx)
    }

    /// Best-effort display profile of the acting Delegate.
    ///
    /// Returns `None` for Owners and whenever the lookup fails; the
    /// context itself stays valid either way.
    pub async fn display_profile(&self, ctx: &AuthContext) -> Option<DelegateProfile> {
        let AuthContext::Delegate {
            delegate_id,
            owner_id,
            ..
        } = ctx
        else {
            return None;
        };

        if let Some(profile) = self.cache.get(*delegate_id) {
            return Some(profile);
        }

        match self.delegate_repo.get_by_id(*delegate_id).await {
            Ok(delegate) if delegate.owner_id == *owner_id => {
                let profile = delegate.to_profile();
                self.cache.insert(profile.clone());
                Some(profile)
            }
            Ok(_) => {
                warn!(delegate_id = %delegate_id, "Delegate profile belongs to another owner");
                None
            }
            Err(e) => {
                warn!(delegate_id = %delegate_id, error = %e, "Profile refetch failed");
                None
            }
        }
    }

    /// Drop a cached profile after the Delegate record changed.
    pub fn invalidate_profile(&self, delegate_id: Uuid) {
        self.cache.invalidate(delegate_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_config;
    use crate::token::{issue_delegate_token, issue_owner_token, validate_access_token};
    use chrono::Utc;
    use comanager_core::models::delegate::DelegateStatus;
    use comanager_core::models::permission::{Action, Resource};

    #[test]
    fn owner_claims_resolve_to_owner_context() {
        let config = test_config();
        let owner_id = Uuid::new_v4();
        let token = issue_owner_token(owner_id, &config).unwrap();
        let claims = validate_access_token(&token, &config).unwrap();

        let ctx = AuthContext::from_claims(&claims).unwrap();

        assert_eq!(ctx, AuthContext::Owner { owner_id });
        assert!(!ctx.acting_as_delegate());
        assert_eq!(ctx.actor_kind(), ActorKind::Owner);
        assert_eq!(*ctx.permissions(), PermissionMap::full());
    }

    #[test]
    fn delegate_claims_resolve_from_snapshot() {
        let config = test_config();
        let delegate_id = Uuid::new_v4();
        let owner_id = Uuid::new_v4();
        let permissions: PermissionMap = [
            (Resource::Contenus, Action::Read),
            (Resource::Contenus, Action::Update),
        ]
        .into_iter()
        .collect();

        let token = issue_delegate_token(delegate_id, owner_id, &permissions, &config).unwrap();
        let claims = validate_access_token(&token, &config).unwrap();
        let ctx = AuthContext::from_claims(&claims).unwrap();

        assert!(ctx.acting_as_delegate());
        assert_eq!(ctx.actor_id(), delegate_id);
        assert_eq!(ctx.owner_id(), owner_id);
        assert_eq!(*ctx.permissions(), permissions);
    }

    fn profile(id: Uuid) -> DelegateProfile {
        DelegateProfile {
            id,
            owner_id: Uuid::new_v4(),
            email: "d@example.com".into(),
            name: "D".into(),
            is_password_set: true,
            requires_password_change: false,
            status: DelegateStatus::Active,
            grants: vec![],
            role: "co-manager".into(),
            last_login: None,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn cache_expires_entries() {
        let id = Uuid::new_v4();
        let cache = ProfileCache::new(Duration::ZERO);
        cache.insert(profile(id));
        assert!(cache.get(id).is_none());

        let cache = ProfileCache::new(Duration::from_secs(300));
        cache.insert(profile(id));
        assert_eq!(cache.get(id).map(|p| p.id), Some(id));
        cache.invalidate(id);
        assert!(cache.get(id).is_none());
    }

    #[test]
    fn insert_prunes_expired_entries() {
        let cache = ProfileCache::new(Duration::ZERO);
        for _ in 0..3 {
            cache.insert(profile(Uuid::new_v4()));
        }
        assert_eq!(cache.entries.lock().len(), 1);

        let cache = ProfileCache::new(Duration::from_secs(300));
        for _ in 0..3 {
            cache.insert(profile(Uuid::new_v4()));
        }
        assert_eq!(cache.entries.lock().len(), 3);
    }
}
