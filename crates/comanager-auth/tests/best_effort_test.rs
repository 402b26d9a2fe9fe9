//! Bookkeeping reads and writes that must not fail the caller: the
//! last-login update on authentication and the display-profile refetch.

mod common;

use comanager_auth::token::validate_access_token;
use comanager_auth::{AuthContext, ContextResolver, IdentityIssuer};
use comanager_core::error::{ComanagerError, ComanagerResult};
use comanager_core::models::delegate::{CreateDelegate, Delegate, UpdateDelegate};
use comanager_core::models::permission::{Action, PermissionGrant, Resource};
use comanager_core::repository::DelegateRepository;
use comanager_db::repository::SurrealDelegateRepository;
use common::{PASSWORD, delegate_input, setup};
use surrealdb::engine::local::Db;
use uuid::Uuid;

/// Serves email lookups from the real store; id lookups and updates fail.
struct ReadOnlyDelegates {
    inner: SurrealDelegateRepository<Db>,
}

fn unavailable() -> ComanagerError {
    ComanagerError::Database("connection reset".into())
}

impl DelegateRepository for ReadOnlyDelegates {
    async fn create(&self, input: CreateDelegate) -> ComanagerResult<Delegate> {
        self.inner.create(input).await
    }

    async fn get_by_id(&self, _id: Uuid) -> ComanagerResult<Delegate> {
        Err(unavailable())
    }

    async fn get_by_email(&self, email: &str) -> ComanagerResult<Delegate> {
        self.inner.get_by_email(email).await
    }

    async fn update(&self, _id: Uuid, _input: UpdateDelegate) -> ComanagerResult<Delegate> {
        Err(unavailable())
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> ComanagerResult<()> {
        self.inner.delete(owner_id, id).await
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> ComanagerResult<Vec<Delegate>> {
        self.inner.list_by_owner(owner_id).await
    }
}

fn contenus_read() -> Vec<PermissionGrant> {
    vec![PermissionGrant::new(Resource::Contenus, [Action::Read])]
}

#[tokio::test]
async fn login_succeeds_when_last_login_cannot_be_written() {
    let h = setup().await;
    let delegate_id = h
        .manager
        .create(
            delegate_input(h.owner_id, "dana@example.com", contenus_read()),
            PASSWORD,
        )
        .await
        .unwrap();

    let issuer = IdentityIssuer::new(
        ReadOnlyDelegates {
            inner: SurrealDelegateRepository::new(h.db.clone()),
        },
        h.config.clone(),
    );

    let auth = issuer
        .authenticate_delegate("dana@example.com", PASSWORD)
        .await
        .unwrap();

    assert_eq!(auth.delegate.id, delegate_id);
    assert!(auth.delegate.last_login.is_none());
    let claims = validate_access_token(&auth.token, &h.config).unwrap();
    assert_eq!(claims.claims().delegate_id, Some(delegate_id.to_string()));
}

#[tokio::test]
async fn failed_profile_refetch_leaves_context_intact() {
    let h = setup().await;
    h.manager
        .create(
            delegate_input(h.owner_id, "dana@example.com", contenus_read()),
            PASSWORD,
        )
        .await
        .unwrap();
    let auth = h
        .issuer
        .authenticate_delegate("dana@example.com", PASSWORD)
        .await
        .unwrap();

    let resolver = ContextResolver::new(
        ReadOnlyDelegates {
            inner: SurrealDelegateRepository::new(h.db.clone()),
        },
        &h.config,
    );
    let claims = validate_access_token(&auth.token, &h.config).unwrap();
    let ctx = resolver.resolve(&claims).unwrap();

    assert!(resolver.display_profile(&ctx).await.is_none());

    // Resolution does not depend on the store, so it keeps working.
    let again = resolver.resolve(&claims).unwrap();
    assert_eq!(again, ctx);
    match ctx {
        AuthContext::Delegate {
            delegate_id,
            owner_id,
            permissions,
        } => {
            assert_eq!(delegate_id, auth.delegate.id);
            assert_eq!(owner_id, h.owner_id);
            assert!(permissions.allows(Resource::Contenus, Action::Read));
        }
        AuthContext::Owner { .. } => panic!("expected a delegate context"),
    }
}
