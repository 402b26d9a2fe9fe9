//! Fixtures shared by the auth integration tests.

#![allow(dead_code)]

pub use comanager_auth::test_support::test_config;
use comanager_auth::{AuthConfig, CredentialManager, DelegateInput, IdentityIssuer};
use comanager_core::models::owner::CreateOwner;
use comanager_core::models::permission::PermissionGrant;
use comanager_core::repository::OwnerRepository;
use comanager_db::repository::{SurrealDelegateRepository, SurrealOwnerRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

pub const OWNER_EMAIL: &str = "owner@example.com";
pub const PASSWORD: &str = "Sup3rSecret";

pub type Manager = CredentialManager<SurrealDelegateRepository<Db>, SurrealOwnerRepository<Db>>;
pub type Issuer = IdentityIssuer<SurrealDelegateRepository<Db>>;

pub struct Harness {
    pub db: Surreal<Db>,
    pub owner_id: Uuid,
    pub manager: Manager,
    pub issuer: Issuer,
    pub config: AuthConfig,
}

/// Spin up in-memory DB, run migrations, create one Owner and the
/// services under test.
pub async fn setup() -> Harness {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    comanager_db::run_migrations(&db).await.unwrap();

    let owner_repo = SurrealOwnerRepository::new(db.clone());
    let owner = owner_repo
        .create(CreateOwner {
            email: OWNER_EMAIL.into(),
            name: "Owner".into(),
        })
        .await
        .unwrap();

    let config = test_config();
    let manager = CredentialManager::new(
        SurrealDelegateRepository::new(db.clone()),
        owner_repo,
        config.clone(),
    );
    let issuer = IdentityIssuer::new(SurrealDelegateRepository::new(db.clone()), config.clone());

    Harness {
        db,
        owner_id: owner.id,
        manager,
        issuer,
        config,
    }
}

pub fn delegate_input(owner_id: Uuid, email: &str, grants: Vec<PermissionGrant>) -> DelegateInput {
    DelegateInput {
        owner_id,
        email: email.into(),
        name: "Dana".into(),
        grants,
        created_by: owner_id,
        temporary_password: false,
    }
}
