//! Argon2id adapter for the domain's `PasswordHasher` port.
//!
//! Hashes are stored as PHC strings, so the salt and parameters travel with
//! each hash and parameters can change without invalidating old hashes.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    Error as PasswordHashError, PasswordHash, PasswordHasher as _, PasswordVerifier as _,
    SaltString,
};
use argon2::Argon2;

use crate::domain::ports::{HasherError, PasswordHasher};

/// Argon2id implementation of the `PasswordHasher` port.
#[derive(Debug, Clone, Default)]
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    /// Create a hasher with the library's default Argon2id parameters.
    pub fn new() -> Self {
        Self
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plaintext: &str) -> Result<String, HasherError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|err| HasherError::hashing(err.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HasherError> {
        let parsed =
            PasswordHash::new(hash).map_err(|err| HasherError::hashing(err.to_string()))?;
        match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(PasswordHashError::Password) => Ok(false),
            Err(err) => Err(HasherError::hashing(err.to_string())),
        }
    }
}
