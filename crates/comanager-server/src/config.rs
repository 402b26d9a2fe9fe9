//! Command-line / environment configuration for the server binary.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Parser;
use comanager_auth::AuthConfig;
use comanager_db::DbConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read key file {path}: {source}")]
    KeyFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Every flag can also be supplied through the `COMANAGER_*` variable
/// named next to it.
#[derive(Debug, Clone, Parser)]
#[command(name = "comanager", about = "Delegated co-manager identity service", version)]
pub struct ServerArgs {
    /// Address the HTTP server binds to.
    #[arg(long, env = "COMANAGER_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// SurrealDB endpoint (`ws://host:port`, `mem://`, ...).
    #[arg(long, env = "COMANAGER_DB_URL", default_value = "ws://127.0.0.1:8000")]
    pub db_url: String,

    #[arg(long, env = "COMANAGER_DB_NAMESPACE", default_value = "comanager")]
    pub db_namespace: String,

    #[arg(long, env = "COMANAGER_DB_DATABASE", default_value = "main")]
    pub db_database: String,

    #[arg(long, env = "COMANAGER_DB_USER")]
    pub db_user: Option<String>,

    #[arg(long, env = "COMANAGER_DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// PEM file holding the Ed25519 signing key.
    #[arg(long, env = "COMANAGER_JWT_PRIVATE_KEY")]
    pub jwt_private_key: PathBuf,

    /// PEM file holding the Ed25519 verification key.
    #[arg(long, env = "COMANAGER_JWT_PUBLIC_KEY")]
    pub jwt_public_key: PathBuf,

    #[arg(long, env = "COMANAGER_JWT_ISSUER", default_value = "comanager")]
    pub jwt_issuer: String,

    /// Access token lifetime in seconds, at most one day. Also bounds how
    /// stale a Delegate's permission snapshot can get.
    #[arg(
        long,
        env = "COMANAGER_TOKEN_LIFETIME",
        default_value_t = 900,
        value_parser = clap::value_parser!(u64).range(1..=86_400)
    )]
    pub access_token_lifetime_secs: u64,

    #[arg(long, env = "COMANAGER_PEPPER", hide_env_values = true)]
    pub pepper: Option<String>,

    #[arg(long, env = "COMANAGER_MIN_PASSWORD_LENGTH", default_value_t = 8)]
    pub min_password_length: usize,

    /// Argon2id memory cost in KiB.
    #[arg(long, env = "COMANAGER_ARGON2_MEMORY_KIB", default_value_t = 19_456)]
    pub argon2_memory_kib: u32,

    #[arg(long, env = "COMANAGER_ARGON2_ITERATIONS", default_value_t = 2)]
    pub argon2_iterations: u32,

    #[arg(long, env = "COMANAGER_ARGON2_PARALLELISM", default_value_t = 1)]
    pub argon2_parallelism: u32,

    /// Audit query size when the caller gives no `limit`.
    #[arg(long, env = "COMANAGER_AUDIT_DEFAULT_LIMIT", default_value_t = 50)]
    pub audit_default_limit: u64,

    /// Largest audit page a caller can ask for.
    #[arg(
        long,
        env = "COMANAGER_AUDIT_MAX_LIMIT",
        default_value_t = 500,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub audit_max_limit: u64,
}

fn read_key(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::KeyFile {
        path: path.to_path_buf(),
        source,
    })
}

impl ServerArgs {
    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            url: self.db_url.clone(),
            namespace: self.db_namespace.clone(),
            database: self.db_database.clone(),
            username: self.db_user.clone(),
            password: self.db_password.clone(),
        }
    }

    /// Build the auth configuration, loading both key files.
    pub fn auth_config(&self) -> Result<AuthConfig, ConfigError> {
        Ok(AuthConfig {
            jwt_private_key_pem: read_key(&self.jwt_private_key)?,
            jwt_public_key_pem: read_key(&self.jwt_public_key)?,
            jwt_issuer: self.jwt_issuer.clone(),
            access_token_lifetime_secs: self.access_token_lifetime_secs,
            pepper: self.pepper.clone(),
            min_password_length: self.min_password_length,
            argon2_memory_kib: self.argon2_memory_kib,
            argon2_iterations: self.argon2_iterations,
            argon2_parallelism: self.argon2_parallelism,
            audit_default_limit: self.audit_default_limit,
            audit_max_limit: self.audit_max_limit,
            ..AuthConfig::default()
        })
    }
}
