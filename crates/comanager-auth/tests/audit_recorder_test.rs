//! Integration tests for audit recording and tenant-scoped queries.

mod common;

use comanager_auth::{AuditRecorder, AuthContext, DecisionReason, check_permission};
use comanager_core::error::{ComanagerError, ComanagerResult};
use comanager_core::models::audit::{ActorKind, AuditRecord, CreateAuditRecord};
use comanager_core::models::permission::{Action, Resource};
use comanager_core::repository::{AuditFilter, AuditLogRepository};
use comanager_db::repository::SurrealAuditLogRepository;
use common::{setup, test_config};
use uuid::Uuid;

/// A store that is always down.
struct UnavailableAuditLog;

impl AuditLogRepository for UnavailableAuditLog {
    async fn append(&self, _input: CreateAuditRecord) -> ComanagerResult<AuditRecord> {
        Err(ComanagerError::Database("connection refused".into()))
    }

    async fn query(&self, _filter: AuditFilter, _limit: u64) -> ComanagerResult<Vec<AuditRecord>> {
        Err(ComanagerError::Database("connection refused".into()))
    }
}

fn delegate_ctx(owner_id: Uuid) -> AuthContext {
    AuthContext::Delegate {
        delegate_id: Uuid::new_v4(),
        owner_id,
        permissions: [(Resource::Contenus, Action::Read)].into_iter().collect(),
    }
}

#[tokio::test]
async fn owner_query_never_leaks_another_tenant() {
    let h = setup().await;
    let recorder = AuditRecorder::new(SurrealAuditLogRepository::new(h.db.clone()), &h.config);
    let owner_x = AuthContext::Owner { owner_id: h.owner_id };
    let owner_y = AuthContext::Owner {
        owner_id: Uuid::new_v4(),
    };

    for i in 0..3 {
        let stored = recorder
            .record(&owner_x, "update", "laalas", Some(format!("l-{i}")), Ok(()))
            .await;
        assert!(stored.is_some());
    }
    recorder
        .record(&owner_y, "update", "laalas", None, Ok(()))
        .await
        .unwrap();

    let records = recorder
        .query(AuditFilter::for_owner(h.owner_id), None)
        .await
        .unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.owner_id == h.owner_id));
    assert!(records.iter().all(|r| r.actor_kind == ActorKind::Owner));
}

#[tokio::test]
async fn denied_decisions_are_recorded_with_their_reason() {
    let h = setup().await;
    let recorder = AuditRecorder::new(SurrealAuditLogRepository::new(h.db.clone()), &h.config);
    let ctx = delegate_ctx(h.owner_id);

    let decision = check_permission(&ctx, Resource::Contenus, Action::Delete, None);
    let stored = recorder
        .record_decision(&ctx, "delete", "contenus", Some("c-9".into()), &decision)
        .await
        .unwrap();

    assert!(!stored.success);
    assert_eq!(
        stored.error_detail.as_deref(),
        Some(DecisionReason::ActionNotGranted.as_str())
    );
    assert_eq!(stored.actor_id, ctx.actor_id());
    assert_eq!(stored.actor_kind, ActorKind::Delegate);
    assert_eq!(stored.owner_id, h.owner_id);

    let by_delegate = recorder
        .query(AuditFilter::for_delegate(ctx.actor_id()), None)
        .await
        .unwrap();
    assert_eq!(by_delegate.len(), 1);
}

#[tokio::test]
async fn failed_append_does_not_fail_the_caller() {
    let recorder = AuditRecorder::new(UnavailableAuditLog, &test_config());
    let ctx = delegate_ctx(Uuid::new_v4());

    let stored = recorder
        .record(&ctx, "read", "contenus", None, Err("boom".into()))
        .await;
    assert!(stored.is_none());

    // Queries are not best-effort: the store error surfaces.
    let err = recorder
        .query(AuditFilter::for_owner(ctx.owner_id()), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ComanagerError::Database(_)));
}

#[tokio::test]
async fn query_rejects_unscoped_filters() {
    let recorder = AuditRecorder::new(UnavailableAuditLog, &test_config());

    let err = recorder
        .query(AuditFilter::default(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ComanagerError::Validation { .. }));

    let err = recorder
        .query(
            AuditFilter {
                resource_id: Some("c-1".into()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ComanagerError::Validation { .. }));
}

#[tokio::test]
async fn query_limit_is_capped() {
    let h = setup().await;
    let mut config = h.config.clone();
    config.audit_max_limit = 2;
    let recorder = AuditRecorder::new(SurrealAuditLogRepository::new(h.db.clone()), &config);
    let ctx = AuthContext::Owner {
        owner_id: h.owner_id,
    };

    for _ in 0..4 {
        recorder
            .record(&ctx, "read", "campaigns", None, Ok(()))
            .await
            .unwrap();
    }

    let records = recorder
        .query(AuditFilter::for_owner(h.owner_id), Some(1_000))
        .await
        .unwrap();
    assert_eq!(records.len(), 2);

    let records = recorder
        .query(AuditFilter::for_owner(h.owner_id), Some(0))
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn zero_max_limit_still_answers_queries() {
    let h = setup().await;
    let config = comanager_auth::AuthConfig {
        audit_max_limit: 0,
        ..h.config.clone()
    };
    let recorder = AuditRecorder::new(SurrealAuditLogRepository::new(h.db.clone()), &config);
    let ctx = AuthContext::Owner {
        owner_id: h.owner_id,
    };

    for _ in 0..2 {
        recorder
            .record(&ctx, "read", "campaigns", None, Ok(()))
            .await
            .unwrap();
    }

    let records = recorder
        .query(AuditFilter::for_owner(h.owner_id), None)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
}
