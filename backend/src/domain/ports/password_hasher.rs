//! One-way salted hashing primitive for passwords and security answers.

/// Failures raised by hasher adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HasherError {
    /// Hashing or hash parsing failed.
    #[error("hashing failed: {message}")]
    Hashing { message: String },
}

impl HasherError {
    /// Create a hashing error with the given message.
    pub fn hashing(message: impl Into<String>) -> Self {
        Self::Hashing {
            message: message.into(),
        }
    }
}

/// One-way, salted hash and verify primitive.
///
/// `verify` must return `Ok(false)` for a plain mismatch and reserve errors
/// for malformed hashes or adapter failures.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Hash `plaintext` with a fresh salt.
    fn hash(&self, plaintext: &str) -> Result<String, HasherError>;

    /// Check `plaintext` against a previously produced hash.
    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HasherError>;
}
