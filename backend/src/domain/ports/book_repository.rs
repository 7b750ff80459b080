//! Port abstraction for catalogue persistence adapters.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{Book, BookDraft};

/// Persistence errors raised by book repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookPersistenceError {
    /// Repository connection could not be established.
    #[error("book repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("book repository query failed: {message}")]
    Query { message: String },
    /// The ISBN collides with an existing book (unique constraint).
    #[error("isbn already catalogued: {isbn}")]
    DuplicateIsbn { isbn: String },
}

impl BookPersistenceError {
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

    /// Create a duplicate-ISBN error for the given ISBN.
    pub fn duplicate_isbn(isbn: impl Into<String>) -> Self {
        Self::DuplicateIsbn { isbn: isbn.into() }
    }
}

/// Driven port for book rows, including the derived catalogue queries.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Insert a new book; the adapter assigns the identity.
    async fn insert(&self, draft: &BookDraft) -> Result<Book, BookPersistenceError>;

    /// Persist every mutable field of an existing book.
    async fn update(&self, book: &Book) -> Result<(), BookPersistenceError>;

    /// Permanently delete a book row.
    async fn delete(&self, id: i64) -> Result<(), BookPersistenceError>;

    /// Fetch a book by identifier.
    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, BookPersistenceError>;

    /// Fetch a book by ISBN, case-insensitively.
    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>, BookPersistenceError>;

    /// All books, in identifier order.
    async fn list(&self) -> Result<Vec<Book>, BookPersistenceError>;

    /// Books matching a publication flag.
    async fn find_by_published(&self, published: bool) -> Result<Vec<Book>, BookPersistenceError>;

    /// Books whose title matches exactly, ignoring case.
    async fn find_by_title(&self, title: &str) -> Result<Vec<Book>, BookPersistenceError>;

    /// Books whose title contains `text`, ignoring case.
    async fn find_by_title_contains(&self, text: &str)
        -> Result<Vec<Book>, BookPersistenceError>;

    /// Books whose title or description contains `text`, ignoring case.
    async fn find_by_text(&self, text: &str) -> Result<Vec<Book>, BookPersistenceError>;

    /// Books published between the two dates inclusive.
    async fn find_by_publication_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Book>, BookPersistenceError>;
}
