//! Authentication configuration.

/// Configuration for the co-manager auth services.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// PEM-encoded Ed25519 private key for JWT signing.
    pub jwt_private_key_pem: String,
    /// PEM-encoded Ed25519 public key for JWT verification.
    pub jwt_public_key_pem: String,
    /// Access token lifetime in seconds (default: 900 = 15 minutes).
    ///
    /// Grant changes reach a Delegate only on re-authentication, so this
    /// also bounds how stale a permission snapshot can get.
    pub access_token_lifetime_secs: u64,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Optional pepper prepended to passwords before Argon2id hashing.
    pub pepper: Option<String>,
    /// Argon2id memory cost in KiB (default: 19456 = 19 MiB).
    pub argon2_memory_kib: u32,
    /// Argon2id iteration count (default: 2).
    pub argon2_iterations: u32,
    /// Argon2id parallelism (default: 1).
    pub argon2_parallelism: u32,
    /// Minimum password length for policy enforcement.
    pub min_password_length: usize,
    /// Audit query size when the caller gives none.
    pub audit_default_limit: u64,
    /// Hard upper bound on audit query size.
    pub audit_max_limit: u64,
    /// Lifetime of cached display profiles in seconds.
    pub profile_cache_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_private_key_pem: String::new(),
            jwt_public_key_pem: String::new(),
            access_token_lifetime_secs: 900,
            jwt_issuer: "comanager".into(),
            pepper: None,
            argon2_memory_kib: 19_456,
            argon2_iterations: 2,
            argon2_parallelism: 1,
            min_password_length: 8,
            audit_default_limit: 50,
            audit_max_limit: 500,
            profile_cache_ttl_secs: 300,
        }
    }
}
