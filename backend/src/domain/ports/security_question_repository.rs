//! Port abstraction for the security question reference table.

use async_trait::async_trait;

use crate::domain::SecurityQuestion;

/// Persistence errors raised by security question repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuestionPersistenceError {
    /// Repository connection could not be established.
    #[error("security question connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("security question query failed: {message}")]
    Query { message: String },
}

impl QuestionPersistenceError {
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

/// Driven port for security question rows.
#[async_trait]
pub trait SecurityQuestionRepository: Send + Sync {
    /// Number of questions currently stored.
    async fn count(&self) -> Result<i64, QuestionPersistenceError>;

    /// Insert one question per label, in order.
    async fn insert_labels(&self, labels: &[&str]) -> Result<(), QuestionPersistenceError>;

    /// Fetch a question by identifier.
    async fn find_by_id(
        &self,
        id: i64,
    ) -> Result<Option<SecurityQuestion>, QuestionPersistenceError>;

    /// All questions, in identifier order.
    async fn list(&self) -> Result<Vec<SecurityQuestion>, QuestionPersistenceError>;
}
