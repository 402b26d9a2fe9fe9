//! Delegate authentication: verifies credentials and mints the
//! delegated token carrying the permission snapshot.

use chrono::Utc;
use comanager_core::error::{ComanagerError, ComanagerResult};
use comanager_core::models::delegate::{DelegateProfile, DelegateStatus, UpdateDelegate, normalize_email};
use comanager_core::models::permission::PermissionMap;
use comanager_core::repository::DelegateRepository;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

/// Successful Delegate authentication.
#[derive(Debug)]
pub struct AuthenticatedDelegate {
    /// The Delegate record, password hash stripped.
    pub delegate: DelegateProfile,
    pub owner_id: Uuid,
    /// Signed JWT access token.
    pub token: String,
    /// The snapshot embedded in `token`.
    pub permissions: PermissionMap,
    pub requires_password_change: bool,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Identity issuer for Delegates.
///
/// Generic over the repository implementation so that the auth layer
/// has no dependency on the database crate.
pub struct IdentityIssuer<D: DelegateRepository> {
    delegate_repo: D,
    config: AuthConfig,
}

impl<D: DelegateRepository> IdentityIssuer<D> {
    pub fn new(delegate_repo: D, config: AuthConfig) -> Self {
        Self {
            delegate_repo,
            config,
        }
    }

    /// Authenticate a Delegate with email + password and issue a token.
    pub async fn authenticate_delegate(
        &self,
        email: &str,
        password: &str,
    ) -> ComanagerResult<AuthenticatedDelegate> {
        let email = normalize_email(email);

        // 1. Look up the Delegate. Unknown and inactive accounts get the
        //    same answer as a wrong password.
        let delegate = match self.delegate_repo.get_by_email(&email).await {
            Ok(d) => d,
            Err(ComanagerError::NotFound { .. }) => {
                debug!("Login refused: unknown delegate email");
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        if delegate.status != DelegateStatus::Active {
            debug!(delegate_id = %delegate.id, "Login refused: delegate suspended");
            return Err(AuthError::InvalidCredentials.into());
        }

        // 2. Invited but never provisioned.
        if !delegate.is_password_set {
            debug!(delegate_id = %delegate.id, "Login refused: password not provisioned");
            return Err(AuthError::PasswordNotSet.into());
        }

        // 3. Verify password.
        let valid = password::verify_password_blocking(
            password.to_string(),
            delegate.password_hash.clone(),
            self.config.pepper.clone(),
        )
        .await?;
        if !valid {
            debug!(delegate_id = %delegate.id, "Login refused: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        // 4-5. Snapshot the grants and mint the token.
        let permissions = delegate.permissions();
        let token =
            token::issue_delegate_token(delegate.id, delegate.owner_id, &permissions, &self.config)?;

        // 6. Best-effort last-login bookkeeping.
        let last_login = match self
            .delegate_repo
            .update(
                delegate.id,
                UpdateDelegate {
                    last_login: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await
        {
            Ok(updated) => updated.last_login,
            Err(e) => {
                warn!(delegate_id = %delegate.id, error = %e, "Failed to record last login");
                delegate.last_login
            }
        };

        info!(
            delegate_id = %delegate.id,
            owner_id = %delegate.owner_id,
            "Delegate authenticated"
        );

        let mut profile = delegate.to_profile();
        profile.last_login = last_login;

        Ok(AuthenticatedDelegate {
            owner_id: delegate.owner_id,
            requires_password_change: delegate.requires_password_change,
            delegate: profile,
            token,
            permissions,
            expires_in: self.config.access_token_lifetime_secs,
        })
    }
    /// `(delegate_id, owner_id)` of the Delegate registered under `email`,
    /// if any. Lets a refused login be attributed to its tenant.
    pub async fn principal_for(&self, email: &str) -> Option<(Uuid, Uuid)> {
        match self.delegate_repo.get_by_email(&normalize_email(email)).await {
            Ok(delegate) => Some((delegate.id, delegate.owner_id)),
            Err(ComanagerError::NotFound { .. }) => None,
            Err(e) => {
                warn!(error = %e, "Delegate lookup for refused login failed");
                None
            }
        }
    }
}
