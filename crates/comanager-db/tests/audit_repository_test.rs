//! Integration tests for the audit log repository using in-memory
//! SurrealDB.

use comanager_core::models::audit::{ActorKind, CreateAuditRecord};
use comanager_core::repository::{AuditFilter, AuditLogRepository};
use comanager_db::repository::SurrealAuditLogRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    comanager_db::run_migrations(&db).await.unwrap();
    db
}

fn entry(
    owner_id: Uuid,
    actor_id: Uuid,
    actor_kind: ActorKind,
    resource: &str,
    resource_id: Option<&str>,
) -> CreateAuditRecord {
    CreateAuditRecord {
        actor_id,
        actor_kind,
        owner_id,
        action: "update".into(),
        resource: resource.into(),
        resource_id: resource_id.map(String::from),
        success: true,
        error_detail: None,
    }
}

#[tokio::test]
async fn append_assigns_id_and_timestamp() {
    let repo = SurrealAuditLogRepository::new(setup().await);
    let owner = Uuid::new_v4();
    let delegate = Uuid::new_v4();

    let mut input = entry(owner, delegate, ActorKind::Delegate, "contenus", Some("c-1"));
    input.success = false;
    input.error_detail = Some("action-not-granted".into());

    let record = repo.append(input).await.unwrap();
    assert_eq!(record.owner_id, owner);
    assert_eq!(record.actor_id, delegate);
    assert_eq!(record.actor_kind, ActorKind::Delegate);
    assert_eq!(record.resource_id.as_deref(), Some("c-1"));
    assert!(!record.success);
    assert_eq!(record.error_detail.as_deref(), Some("action-not-granted"));
}

#[tokio::test]
async fn query_by_owner_is_tenant_scoped_and_newest_first() {
    let repo = SurrealAuditLogRepository::new(setup().await);
    let owner_x = Uuid::new_v4();
    let owner_y = Uuid::new_v4();

    for _ in 0..3 {
        repo.append(entry(owner_x, owner_x, ActorKind::Owner, "laalas", None))
            .await
            .unwrap();
    }
    repo.append(entry(owner_y, owner_y, ActorKind::Owner, "laalas", None))
        .await
        .unwrap();

    let records = repo.query(AuditFilter::for_owner(owner_x), 50).await.unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.owner_id == owner_x));
    assert!(
        records
            .windows(2)
            .all(|w| w[0].timestamp >= w[1].timestamp),
        "records should be newest first"
    );
}

#[tokio::test]
async fn query_by_delegate_ignores_owner_actions() {
    let repo = SurrealAuditLogRepository::new(setup().await);
    let owner = Uuid::new_v4();
    let delegate = Uuid::new_v4();

    repo.append(entry(owner, delegate, ActorKind::Delegate, "contenus", None))
        .await
        .unwrap();
    repo.append(entry(owner, owner, ActorKind::Owner, "contenus", None))
        .await
        .unwrap();

    let records = repo
        .query(AuditFilter::for_delegate(delegate), 50)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].actor_id, delegate);
}

#[tokio::test]
async fn query_by_resource_and_id() {
    let repo = SurrealAuditLogRepository::new(setup().await);
    let owner = Uuid::new_v4();

    repo.append(entry(owner, owner, ActorKind::Owner, "contenus", Some("c-1")))
        .await
        .unwrap();
    repo.append(entry(owner, owner, ActorKind::Owner, "contenus", Some("c-2")))
        .await
        .unwrap();
    repo.append(entry(owner, owner, ActorKind::Owner, "campaigns", Some("c-1")))
        .await
        .unwrap();

    let by_resource = repo
        .query(AuditFilter::for_resource("contenus", None), 50)
        .await
        .unwrap();
    assert_eq!(by_resource.len(), 2);

    let by_id = repo
        .query(
            AuditFilter::for_resource("contenus", Some("c-1".into())),
            50,
        )
        .await
        .unwrap();
    assert_eq!(by_id.len(), 1);
    assert_eq!(by_id[0].resource, "contenus");
}

#[tokio::test]
async fn query_respects_limit() {
    let repo = SurrealAuditLogRepository::new(setup().await);
    let owner = Uuid::new_v4();

    for _ in 0..5 {
        repo.append(entry(owner, owner, ActorKind::Owner, "laalas", None))
            .await
            .unwrap();
    }

    let records = repo.query(AuditFilter::for_owner(owner), 2).await.unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn empty_filter_returns_nothing() {
    let repo = SurrealAuditLogRepository::new(setup().await);
    let owner = Uuid::new_v4();
    repo.append(entry(owner, owner, ActorKind::Owner, "laalas", None))
        .await
        .unwrap();

    let records = repo.query(AuditFilter::default(), 50).await.unwrap();
    assert!(records.is_empty());
}
