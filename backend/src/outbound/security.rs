//! Argon2id adapter for the `PasswordHasher` port.
//!
//! Hashes are stored in PHC string format, so parameters travel with the
//! hash and can be tightened later without invalidating old credentials.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};

use crate::domain::ports::{PasswordHashError, PasswordHasher};

/// Argon2id hasher with the crate's default parameters.
#[derive(Debug, Clone, Default)]
pub struct Argon2PasswordHasher;

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|error| PasswordHashError::hash(error.to_string()))
    }

    fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, PasswordHashError> {
        let parsed =
            PasswordHash::new(stored_hash).map_err(|error| PasswordHashError::hash(error.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_and_rejects_wrong_password() {
        let hasher = Argon2PasswordHasher;
        let hash = hasher.hash("pw1").expect("hashing succeeds");
        assert!(hash.starts_with("$argon2"));
        assert!(hasher.verify("pw1", &hash).expect("verify runs"));
        assert!(!hasher.verify("pw2", &hash).expect("verify runs"));
    }

    #[test]
    fn garbage_stored_hash_is_an_error() {
        let hasher = Argon2PasswordHasher;
        assert!(hasher.verify("pw1", "not-a-phc-string").is_err());
    }
}
