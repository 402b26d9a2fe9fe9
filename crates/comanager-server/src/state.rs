use std::sync::Arc;

use comanager_auth::{AuditRecorder, AuthConfig, ContextResolver, CredentialManager, IdentityIssuer};
use comanager_db::repository::{
    SurrealAuditLogRepository, SurrealDelegateRepository, SurrealOwnerRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;

pub type DelegateRepo = SurrealDelegateRepository<Any>;
pub type OwnerRepo = SurrealOwnerRepository<Any>;
pub type AuditRepo = SurrealAuditLogRepository<Any>;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AuthConfig>,
    pub credentials: Arc<CredentialManager<DelegateRepo, OwnerRepo>>,
    pub issuer: Arc<IdentityIssuer<DelegateRepo>>,
    pub resolver: Arc<ContextResolver<DelegateRepo>>,
    pub audit: Arc<AuditRecorder<AuditRepo>>,
}

impl AppState {
    /// Wire every service to the same database handle.
    pub fn new(db: Surreal<Any>, config: AuthConfig) -> Self {
        let delegates = SurrealDelegateRepository::new(db.clone());
        Self {
            credentials: Arc::new(CredentialManager::new(
                delegates.clone(),
                SurrealOwnerRepository::new(db.clone()),
                config.clone(),
            )),
            issuer: Arc::new(IdentityIssuer::new(delegates.clone(), config.clone())),
            resolver: Arc::new(ContextResolver::new(delegates, &config)),
            audit: Arc::new(AuditRecorder::new(
                SurrealAuditLogRepository::new(db),
                &config,
            )),
            config: Arc::new(config),
        }
    }
}
