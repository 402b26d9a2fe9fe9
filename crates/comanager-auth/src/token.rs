//! Delegated JWT access token issuance and verification.
//!
//! Tokens are EdDSA (Ed25519) JWTs. Besides the registered claims they
//! carry the four interoperability claims `isDelegate`, `delegateId`,
//! `ownerId` and `permissions`; the last one is the permission snapshot
//! taken at authentication time.

use chrono::Utc;
use comanager_core::models::permission::PermissionMap;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// JWT claims embedded in every access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegatedClaims {
    /// Subject: Delegate ID for delegated tokens, Owner ID otherwise.
    pub sub: String,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token ID (UUID string).
    pub jti: String,
    /// Absent or `false` on Owner tokens.
    #[serde(default)]
    pub is_delegate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegate_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<PermissionMap>,
}

impl DelegatedClaims {
    fn new(sub: Uuid, config: &AuthConfig) -> Result<Self, AuthError> {
        let now = Utc::now().timestamp();
        let exp = i64::try_from(config.access_token_lifetime_secs)
            .ok()
            .and_then(|lifetime| now.checked_add(lifetime))
            .ok_or_else(|| {
                AuthError::Crypto(format!(
                    "access token lifetime {}s is out of range",
                    config.access_token_lifetime_secs
                ))
            })?;
        Ok(Self {
            sub: sub.to_string(),
            iss: config.jwt_issuer.clone(),
            iat: now,
            exp,
            jti: Uuid::new_v4().to_string(),
            is_delegate: false,
            delegate_id: None,
            owner_id: None,
            permissions: None,
        })
    }
}

fn sign(claims: &DelegatedClaims, config: &AuthConfig) -> Result<String, AuthError> {
    let key = EncodingKey::from_ed_pem(config.jwt_private_key_pem.as_bytes())
        .map_err(|e| AuthError::Crypto(format!("bad private key: {e}")))?;

    let header = Header::new(Algorithm::EdDSA);
    jsonwebtoken::encode(&header, claims, &key)
        .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
}

/// Mint a delegated token carrying a permission snapshot.
pub fn issue_delegate_token(
    delegate_id: Uuid,
    owner_id: Uuid,
    permissions: &PermissionMap,
    config: &AuthConfig,
) -> Result<String, AuthError> {
    let claims = DelegatedClaims {
        is_delegate: true,
        delegate_id: Some(delegate_id.to_string()),
        owner_id: Some(owner_id.to_string()),
        permissions: Some(permissions.clone()),
        ..DelegatedClaims::new(delegate_id, config)?
    };
    sign(&claims, config)
}

/// Mint an Owner token. Owners normally authenticate through an external
/// identity provider; this exists so the same verifier can be used for
/// both kinds of principal.
pub fn issue_owner_token(owner_id: Uuid, config: &AuthConfig) -> Result<String, AuthError> {
    let claims = DelegatedClaims {
        owner_id: Some(owner_id.to_string()),
        ..DelegatedClaims::new(owner_id, config)?
    };
    sign(&claims, config)
}

/// Decode and verify an EdDSA JWT access token.
pub fn decode_access_token(
    token: &str,
    config: &AuthConfig,
) -> Result<DelegatedClaims, AuthError> {
    let key = DecodingKey::from_ed_pem(config.jwt_public_key_pem.as_bytes())
        .map_err(|e| AuthError::Crypto(format!("bad public key: {e}")))?;

    let mut validation = Validation::new(Algorithm::EdDSA);
    validation.set_issuer(&[&config.jwt_issuer]);
    validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

    jsonwebtoken::decode::<DelegatedClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(e.to_string()),
        })
}

/// Verified JWT claims. Only [`validate_access_token`] can build one, so
/// holding a value proves the signature, expiry and issuer were checked.
#[derive(Debug, Clone)]
pub struct ValidatedClaims(DelegatedClaims);

impl ValidatedClaims {
    pub fn claims(&self) -> &DelegatedClaims {
        &self.0
    }

    pub fn into_inner(self) -> DelegatedClaims {
        self.0
    }
}

/// Validate a JWT access token (signature, expiry, issuer) and return
/// the verified claims.
///
/// This is the entry point for request-level authentication. It is
/// purely stateless; no database lookup is performed.
pub fn validate_access_token(
    token: &str,
    config: &AuthConfig,
) -> Result<ValidatedClaims, AuthError> {
    decode_access_token(token, config).map(ValidatedClaims)
}
