//! Password hashing, verification and policy using Argon2id.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::config::AuthConfig;
use crate::error::AuthError;

const TEMP_PASSWORD_LEN: usize = 16;
const LOWER: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const DIGITS: &[u8] = b"23456789";

fn peppered_input<'a>(password: &'a str, pepper: Option<&str>, buf: &'a mut String) -> &'a [u8] {
    match pepper {
        Some(p) => {
            *buf = format!("{p}{password}");
            buf.as_bytes()
        }
        None => password.as_bytes(),
    }
}

/// Hash a password with Argon2id using the cost parameters from `config`.
///
/// If a pepper is configured it is prepended to the password before
/// hashing. The salt is randomly generated for each call.
pub fn hash_password(password: &str, config: &AuthConfig) -> Result<String, AuthError> {
    let params = argon2::Params::new(
        config.argon2_memory_kib,
        config.argon2_iterations,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| AuthError::Crypto(format!("argon2 params: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut buf = String::new();
    let input = peppered_input(password, config.pepper.as_deref(), &mut buf);

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    argon2
        .hash_password(input, &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Crypto(format!("password hash: {e}")))
}

/// Verify a plaintext password against an Argon2id PHC-format hash.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch, or
/// `Err(AuthError::Crypto)` if the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str, pepper: Option<&str>) -> Result<bool, AuthError> {
    let mut buf = String::new();
    let input = peppered_input(password, pepper, &mut buf);

    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

    match Argon2::default().verify_password(input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}

/// [`hash_password`] on the blocking pool. Argon2id is deliberately slow
/// and must not run on an async worker thread.
pub async fn hash_password_blocking(password: String, config: &AuthConfig) -> Result<String, AuthError> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || hash_password(&password, &config))
        .await
        .map_err(|e| AuthError::Crypto(format!("hashing task failed: {e}")))?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_blocking(
    password: String,
    hash: String,
    pepper: Option<String>,
) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash, pepper.as_deref()))
        .await
        .map_err(|e| AuthError::Crypto(format!("verification task failed: {e}")))?
}

/// Enforce the password policy: at least `min_length` characters with one
/// lowercase letter, one uppercase letter and one digit.
pub fn validate_password_policy(password: &str, min_length: usize) -> Result<(), AuthError> {
    if password.chars().count() < min_length {
        return Err(AuthError::WeakPassword(format!(
            "must be at least {min_length} characters"
        )));
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err(AuthError::WeakPassword(
            "must contain a lowercase letter".into(),
        ));
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(AuthError::WeakPassword(
            "must contain an uppercase letter".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthError::WeakPassword("must contain a digit".into()));
    }
    Ok(())
}

/// Generate a random temporary password that satisfies the policy.
///
/// Ambiguous glyphs (`l`, `I`, `O`, `0`, `1`) are left out since these
/// are usually read out or copied by hand.
pub fn generate_temporary_password() -> String {
    let mut rng = rand::rng();
    let all: Vec<u8> = [LOWER, UPPER, DIGITS].concat();

    let mut chars: Vec<u8> = vec![
        LOWER[rng.random_range(0..LOWER.len())],
        UPPER[rng.random_range(0..UPPER.len())],
        DIGITS[rng.random_range(0..DIGITS.len())],
    ];
    while chars.len() < TEMP_PASSWORD_LEN {
        chars.push(all[rng.random_range(0..all.len())]);
    }
    // The guaranteed classes must not always sit up front.
    chars.shuffle(&mut rng);

    chars.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cheap parameters so the tests stay fast.
    fn test_config(pepper: Option<&str>) -> AuthConfig {
        AuthConfig {
            pepper: pepper.map(Into::into),
            argon2_memory_kib: 8,
            argon2_iterations: 1,
            ..AuthConfig::default()
        }
    }

    #[test]
    fn correct_password_matches() {
        let hash = hash_password("hunter2", &test_config(None)).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter2", &hash, None).unwrap());
    }

    #[test]
    fn wrong_password_does_not_match() {
        let hash = hash_password("hunter2", &test_config(None)).unwrap();
        assert!(!verify_password("wrong", &hash, None).unwrap());
    }

    #[test]
    fn pepper_is_applied() {
        let hash = hash_password("hunter2", &test_config(Some("pepper!"))).unwrap();
        assert!(verify_password("hunter2", &hash, Some("pepper!")).unwrap());
        // Without pepper should fail.
        assert!(!verify_password("hunter2", &hash, None).unwrap());
    }

    #[test]
    fn malformed_hash_returns_error() {
        let result = verify_password("pw", "not-a-hash", None);
        assert!(result.is_err());
    }

    #[test]
    fn policy_accepts_compliant_password() {
        assert!(validate_password_policy("Abcdef12", 8).is_ok());
    }

    #[test]
    fn policy_rejects_weak_passwords() {
        for weak in ["Abc12", "abcdefg1", "ABCDEFG1", "Abcdefgh"] {
            assert!(
                matches!(validate_password_policy(weak, 8), Err(AuthError::WeakPassword(_))),
                "{weak} should be rejected"
            );
        }
    }

    #[test]
    fn temporary_password_meets_policy() {
        for _ in 0..32 {
            let pw = generate_temporary_password();
            assert_eq!(pw.len(), TEMP_PASSWORD_LEN);
            validate_password_policy(&pw, 8).unwrap();
        }
    }

    #[tokio::test]
    async fn blocking_wrappers_roundtrip() {
        let config = test_config(None);
        let hash = hash_password_blocking("Secret123".into(), &config).await.unwrap();
        assert!(verify_password_blocking("Secret123".into(), hash, None).await.unwrap());
    }
}
