//! Delegate credential lifecycle: provisioning, password rotation and
//! the Owner-driven status transitions.
//!
//! ```text
//! Created (no password) ──set_initial_password──▶ Active ⇄ Suspended
//!                                                   │         │
//!                                                   └─delete──┴──▶ Deleted
//! ```

use comanager_core::error::{ComanagerError, ComanagerResult};
use comanager_core::models::delegate::{
    CreateDelegate, Delegate, DelegateProfile, DelegateStatus, UpdateDelegate, normalize_email,
};
use comanager_core::models::permission::PermissionGrant;
use comanager_core::repository::{DelegateRepository, OwnerRepository};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;

const MAX_NAME_LENGTH: usize = 200;

/// Profile fields for a new Delegate.
#[derive(Debug, Clone)]
pub struct DelegateInput {
    pub owner_id: Uuid,
    pub email: String,
    pub name: String,
    pub grants: Vec<PermissionGrant>,
    /// Principal that created the record (usually the Owner).
    pub created_by: Uuid,
    /// Whether the initial password is a provisioning password the
    /// Delegate must rotate.
    pub temporary_password: bool,
}

/// Credential lifecycle manager.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate.
pub struct CredentialManager<D: DelegateRepository, O: OwnerRepository> {
    delegate_repo: D,
    owner_repo: O,
    config: AuthConfig,
}

fn validate_profile(input: &DelegateInput) -> ComanagerResult<()> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(ComanagerError::validation("name must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ComanagerError::validation(format!(
            "name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }

    let email = input.email.trim();
    let valid_email = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid_email {
        return Err(ComanagerError::validation(format!(
            "invalid email address: {email}"
        )));
    }
    Ok(())
}

impl<D: DelegateRepository, O: OwnerRepository> CredentialManager<D, O> {
    pub fn new(delegate_repo: D, owner_repo: O, config: AuthConfig) -> Self {
        Self {
            delegate_repo,
            owner_repo,
            config,
        }
    }

    /// Create an active Delegate with an initial password.
    ///
    /// Returns the new Delegate id.
    pub async fn create(&self, input: DelegateInput, password: &str) -> ComanagerResult<Uuid> {
        let email = self.check_new_delegate(&input).await?;
        password::validate_password_policy(password, self.config.min_password_length)?;
        let hash = password::hash_password_blocking(password.to_string(), &self.config).await?;
        let temporary = input.temporary_password;
        self.insert(input, email, Some(hash), temporary).await
    }

    /// Create a Delegate without a password. It cannot authenticate until
    /// [`set_initial_password`](Self::set_initial_password) is called.
    pub async fn invite(&self, input: DelegateInput) -> ComanagerResult<Uuid> {
        let email = self.check_new_delegate(&input).await?;
        self.insert(input, email, None, false).await
    }

    /// Validate the profile, check the Owner exists and the email is free.
    /// Returns the normalized email.
    async fn check_new_delegate(&self, input: &DelegateInput) -> ComanagerResult<String> {
        validate_profile(input)?;
        let email = normalize_email(&input.email);

        // Every Delegate hangs off exactly one existing Owner.
        self.owner_repo.get_by_id(input.owner_id).await?;
        self.ensure_email_available(&email).await?;
        Ok(email)
    }

    async fn insert(
        &self,
        input: DelegateInput,
        email: String,
        password_hash: Option<String>,
        requires_password_change: bool,
    ) -> ComanagerResult<Uuid> {
        let delegate = self
            .delegate_repo
            .create(CreateDelegate {
                owner_id: input.owner_id,
                email,
                name: input.name.trim().to_string(),
                password_hash,
                requires_password_change,
                grants: input.grants,
                created_by: input.created_by,
            })
            .await?;

        info!(
            delegate_id = %delegate.id,
            owner_id = %delegate.owner_id,
            password_set = delegate.is_password_set,
            "Delegate created"
        );
        Ok(delegate.id)
    }

    /// Email must be free in both the Delegate and the Owner collections.
    async fn ensure_email_available(&self, email: &str) -> ComanagerResult<()> {
        match self.delegate_repo.get_by_email(email).await {
            Ok(_) => {
                return Err(ComanagerError::AlreadyExists {
                    entity: "delegate email".into(),
                });
            }
            Err(ComanagerError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }
        match self.owner_repo.get_by_email(email).await {
            Ok(_) => Err(ComanagerError::AlreadyExists {
                entity: "owner email".into(),
            }),
            Err(ComanagerError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Provision the first password of an invited Delegate.
    pub async fn set_initial_password(
        &self,
        delegate_id: Uuid,
        password: &str,
    ) -> ComanagerResult<()> {
        let delegate = self.delegate_repo.get_by_id(delegate_id).await?;
        if delegate.is_password_set {
            return Err(ComanagerError::validation("password is already set"));
        }
        password::validate_password_policy(password, self.config.min_password_length)?;
        let hash = password::hash_password_blocking(password.to_string(), &self.config).await?;

        self.delegate_repo
            .update(
                delegate_id,
                UpdateDelegate {
                    password_hash: Some(hash),
                    is_password_set: Some(true),
                    requires_password_change: Some(false),
                    ..Default::default()
                },
            )
            .await?;

        info!(delegate_id = %delegate_id, "Initial password provisioned");
        Ok(())
    }

    /// Rotate a Delegate's password after proving the current one.
    ///
    /// Clears the temporary-password flag. Grants are left alone.
    pub async fn change_password(
        &self,
        delegate_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> ComanagerResult<()> {
        let delegate = match self.delegate_repo.get_by_id(delegate_id).await {
            Ok(d) => d,
            Err(ComanagerError::NotFound { .. }) => return Err(AuthError::InvalidCredentials.into()),
            Err(e) => return Err(e),
        };

        if delegate.status != DelegateStatus::Active {
            debug!(delegate_id = %delegate_id, "Password change refused: delegate not active");
            return Err(AuthError::InvalidCredentials.into());
        }
        if !delegate.is_password_set {
            return Err(AuthError::PasswordNotSet.into());
        }

        let valid = password::verify_password_blocking(
            current_password.to_string(),
            delegate.password_hash.clone(),
            self.config.pepper.clone(),
        )
        .await?;
        if !valid {
            debug!(delegate_id = %delegate_id, "Password change refused: wrong current password");
            return Err(AuthError::InvalidCredentials.into());
        }

        password::validate_password_policy(new_password, self.config.min_password_length)?;
        let hash = password::hash_password_blocking(new_password.to_string(), &self.config).await?;

        self.delegate_repo
            .update(
                delegate_id,
                UpdateDelegate {
                    password_hash: Some(hash),
                    requires_password_change: Some(false),
                    ..Default::default()
                },
            )
            .await?;

        info!(delegate_id = %delegate_id, "Delegate password changed");
        Ok(())
    }

    /// Whether the Delegate is still on a provisioning/temporary password.
    pub async fn requires_password_change(&self, delegate_id: Uuid) -> ComanagerResult<bool> {
        let delegate = self.delegate_repo.get_by_id(delegate_id).await?;
        Ok(delegate.requires_password_change)
    }

    /// Owner-issued temporary password. A random one is generated when
    /// none is supplied; the plaintext is returned exactly once.
    pub async fn reset_password(
        &self,
        owner_id: Uuid,
        delegate_id: Uuid,
        temporary_password: Option<String>,
    ) -> ComanagerResult<String> {
        self.owned_delegate(owner_id, delegate_id).await?;

        let temporary = match temporary_password {
            Some(pw) => {
                password::validate_password_policy(&pw, self.config.min_password_length)?;
                pw
            }
            None => password::generate_temporary_password(),
        };
        let hash = password::hash_password_blocking(temporary.clone(), &self.config).await?;

        self.delegate_repo
            .update(
                delegate_id,
                UpdateDelegate {
                    password_hash: Some(hash),
                    is_password_set: Some(true),
                    requires_password_change: Some(true),
                    ..Default::default()
                },
            )
            .await?;

        info!(delegate_id = %delegate_id, owner_id = %owner_id, "Temporary password issued");
        Ok(temporary)
    }

    pub async fn suspend(&self, owner_id: Uuid, delegate_id: Uuid) -> ComanagerResult<DelegateProfile> {
        self.set_status(owner_id, delegate_id, DelegateStatus::Suspended)
            .await
    }

    pub async fn reactivate(
        &self,
        owner_id: Uuid,
        delegate_id: Uuid,
    ) -> ComanagerResult<DelegateProfile> {
        self.set_status(owner_id, delegate_id, DelegateStatus::Active)
            .await
    }

    async fn set_status(
        &self,
        owner_id: Uuid,
        delegate_id: Uuid,
        status: DelegateStatus,
    ) -> ComanagerResult<DelegateProfile> {
        self.owned_delegate(owner_id, delegate_id).await?;
        let updated = self
            .delegate_repo
            .update(
                delegate_id,
                UpdateDelegate {
                    status: Some(status),
                    ..Default::default()
                },
            )
            .await?;

        info!(delegate_id = %delegate_id, status = ?status, "Delegate status changed");
        Ok(updated.to_profile())
    }

    /// Replace the Delegate's grants. Tokens already issued keep their
    /// snapshot until the Delegate authenticates again.
    pub async fn update_grants(
        &self,
        owner_id: Uuid,
        delegate_id: Uuid,
        grants: Vec<PermissionGrant>,
    ) -> ComanagerResult<DelegateProfile> {
        self.owned_delegate(owner_id, delegate_id).await?;
        let updated = self
            .delegate_repo
            .update(
                delegate_id,
                UpdateDelegate {
                    grants: Some(grants),
                    ..Default::default()
                },
            )
            .await?;

        info!(delegate_id = %delegate_id, "Delegate grants replaced");
        Ok(updated.to_profile())
    }

    /// Remove the Delegate for good.
    pub async fn delete(&self, owner_id: Uuid, delegate_id: Uuid) -> ComanagerResult<()> {
        self.owned_delegate(owner_id, delegate_id).await?;
        self.delegate_repo.delete(owner_id, delegate_id).await?;
        info!(delegate_id = %delegate_id, owner_id = %owner_id, "Delegate deleted");
        Ok(())
    }

    /// One of the Owner's Delegates, password hash stripped.
    pub async fn get_delegate(
        &self,
        owner_id: Uuid,
        delegate_id: Uuid,
    ) -> ComanagerResult<DelegateProfile> {
        Ok(self.owned_delegate(owner_id, delegate_id).await?.to_profile())
    }

    pub async fn list_delegates(&self, owner_id: Uuid) -> ComanagerResult<Vec<DelegateProfile>> {
        let delegates = self.delegate_repo.list_by_owner(owner_id).await?;
        Ok(delegates.iter().map(Delegate::to_profile).collect())
    }

    /// Fetch a Delegate only if it belongs to `owner_id`. Another tenant's
    /// Delegate looks exactly like a missing one.
    async fn owned_delegate(&self, owner_id: Uuid, delegate_id: Uuid) -> ComanagerResult<Delegate> {
        let delegate = self.delegate_repo.get_by_id(delegate_id).await?;
        if delegate.owner_id != owner_id {
            return Err(ComanagerError::not_found("delegate", delegate_id));
        }
        Ok(delegate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(email: &str, name: &str) -> DelegateInput {
        DelegateInput {
            owner_id: Uuid::new_v4(),
            email: email.into(),
            name: name.into(),
            grants: vec![],
            created_by: Uuid::new_v4(),
            temporary_password: false,
        }
    }

    #[test]
    fn profile_validation() {
        assert!(validate_profile(&input("d@example.com", "Dana")).is_ok());
        assert!(validate_profile(&input("d@example.com", "  ")).is_err());
        assert!(validate_profile(&input("not-an-email", "Dana")).is_err());
        assert!(validate_profile(&input("d@localhost", "Dana")).is_err());
        assert!(validate_profile(&input("a@b@example.com", "Dana")).is_err());
        assert!(validate_profile(&input("d @example.com", "Dana")).is_err());
    }
}
