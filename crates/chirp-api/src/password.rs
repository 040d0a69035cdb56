use std::sync::LazyLock;

use anyhow::{Result, anyhow};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use tracing::warn;

static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("chirp-dummy-credential").ok());

/// Hash a secret with Argon2id. The plaintext never leaves this function.
pub fn hash_password(secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| anyhow!("Password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

/// Check a candidate secret against a stored PHC hash.
///
/// A mismatch, or a stored value that is not a valid hash, yields `false`.
/// The byte comparison is Argon2's own constant-time check.
pub fn verify_password(candidate: &str, stored_hash: &str) -> bool {
    let parsed = match PasswordHash::new(stored_hash) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Stored password hash is unreadable: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok()
}

/// Spend one verification when no account matched, so an unknown login
/// costs the same as a wrong password.
pub fn verify_without_account(candidate: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(candidate, hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_original_secret() {
        let hash = hash_password("hunter22").unwrap();
        assert_ne!(hash, "hunter22");
        assert!(hash.starts_with("$argon2id$"));

        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
    }

    #[test]
    fn corrupt_hash_is_a_mismatch() {
        assert!(!verify_password("hunter22", "not-a-phc-string"));
        assert!(!verify_password("hunter22", ""));
    }

    #[test]
    fn same_secret_gets_distinct_salts() {
        let a = hash_password("hunter22").unwrap();
        let b = hash_password("hunter22").unwrap();
        assert_ne!(a, b);
    }
}
