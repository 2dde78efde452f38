//! Argon2id password hashing.
//!
//! Verification never surfaces a "malformed digest" error to callers: a
//! digest that fails to parse verifies as false, the same outcome as a wrong
//! password, so the API cannot be used as a hash-format oracle.

use anyhow::{Result, anyhow};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

/// Hash a plaintext password with Argon2id and a random salt.
///
/// # Errors
/// Returns an error if the hasher rejects its parameters; the plaintext is
/// never included in the error.
pub fn hash(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let digest = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|_| anyhow!("failed to hash password"))?
        .to_string();
    Ok(digest)
}

/// Verify a plaintext password against a stored digest.
///
/// Returns false for a wrong password and for a malformed digest alike.
#[must_use]
pub fn verify(plaintext: &str, digest: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::{hash, verify};

    #[test]
    fn hash_and_verify_round_trip() {
        let digest = hash("correct horse battery staple").unwrap();
        assert!(verify("correct horse battery staple", &digest));
        assert!(!verify("correct horse battery", &digest));
    }

    #[test]
    fn distinct_salts_per_hash() {
        let first = hash("hunter2").unwrap();
        let second = hash("hunter2").unwrap();
        assert_ne!(first, second);
        assert!(verify("hunter2", &first));
        assert!(verify("hunter2", &second));
    }

    #[test]
    fn malformed_digest_verifies_false() {
        assert!(!verify("anything", "not-a-phc-string"));
        assert!(!verify("anything", ""));
    }
}
