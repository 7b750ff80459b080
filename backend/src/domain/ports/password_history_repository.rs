//! Port abstraction for the append-only password history log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A superseded password hash retained for the reuse check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHistoryEntry {
    /// Surrogate identifier, strictly positive.
    pub id: i64,
    pub user_id: i64,
    /// PHC-string hash of the superseded password.
    pub password_hash: String,
    pub changed_at: DateTime<Utc>,
}

/// Persistence errors raised by history repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryPersistenceError {
    /// Repository connection could not be established.
    #[error("password history connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("password history query failed: {message}")]
    Query { message: String },
}

impl HistoryPersistenceError {
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
}

/// Driven port for password history rows.
#[async_trait]
pub trait PasswordHistoryRepository: Send + Sync {
    /// Append a superseded hash for the user.
    async fn append(
        &self,
        user_id: i64,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<(), HistoryPersistenceError>;

    /// The most recent entries for the user, newest first.
    async fn recent_for_user(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<PasswordHistoryEntry>, HistoryPersistenceError>;

    /// Drop everything but the `keep` newest entries for the user.
    async fn prune_to_recent(
        &self,
        user_id: i64,
        keep: i64,
    ) -> Result<(), HistoryPersistenceError>;
}
