//! Authentication error types.

use comanager_core::error::ComanagerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email, wrong password, or an account that may not log in.
    /// One message for all of them so accounts cannot be enumerated.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("password has not been set for this account")]
    PasswordNotSet,

    #[error("password does not meet policy: {0}")]
    WeakPassword(String),

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for ComanagerError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::PasswordNotSet
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_) => ComanagerError::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::WeakPassword(_) => ComanagerError::Validation {
                message: err.to_string(),
            },
            AuthError::Crypto(msg) => ComanagerError::Crypto(msg),
        }
    }
}
