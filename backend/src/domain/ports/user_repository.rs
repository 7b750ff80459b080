//! Port abstraction for user persistence adapters.

use async_trait::async_trait;

use crate::domain::User;

/// Persistence errors raised by user repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserPersistenceError {
    /// Repository connection could not be established.
    #[error("user repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("user repository query failed: {message}")]
    Query { message: String },
    /// The email collides with an existing account (unique constraint).
    #[error("email already registered: {email}")]
    DuplicateEmail { email: String },
}

impl UserPersistenceError {
    /// Create a connection error with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with the given message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Create a duplicate-email error for the given address.
    pub fn duplicate_email(email: impl Into<String>) -> Self {
        Self::DuplicateEmail {
            email: email.into(),
        }
    }
}

/// Driven port for user rows.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user; the adapter assigns the identity.
    async fn insert(&self, user: &User) -> Result<User, UserPersistenceError>;

    /// Persist every mutable field of an existing user.
    async fn update(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by exact email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserPersistenceError>;

    /// Permanently delete a user row; dependent rows cascade.
    async fn delete(&self, id: i64) -> Result<(), UserPersistenceError>;
}
