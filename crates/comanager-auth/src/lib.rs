//! Co-manager auth: Delegate credential lifecycle, delegated token
//! issuance, context resolution, permission evaluation and audit.

pub mod audit;
pub mod config;
pub mod context;
pub mod credentials;
pub mod error;
pub mod password;
pub mod permission;
pub mod service;
pub mod token;

pub use audit::AuditRecorder;
pub use config::AuthConfig;
pub use context::{AuthContext, ContextResolver};
pub use credentials::{CredentialManager, DelegateInput};
pub use error::AuthError;
pub use permission::{DecisionReason, PermissionDecision, check_permission, require_permission};
pub use service::{AuthenticatedDelegate, IdentityIssuer};
pub use token::{DelegatedClaims, ValidatedClaims};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
