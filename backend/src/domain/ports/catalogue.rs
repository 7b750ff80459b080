//! Driving port for catalogue maintenance and lookup.

use async_trait::async_trait;

use crate::domain::{Book, BookFields, Error};

/// Catalogue CRUD plus the derived search queries.
#[async_trait]
pub trait Catalogue: Send + Sync {
    /// Without an id: create a book, rejecting a duplicate ISBN. With an
    /// id: rewrite the descriptive fields of that book, leaving its
    /// publication flag and stock untouched.
    async fn add_or_update(&self, id: Option<i64>, fields: BookFields) -> Result<Book, Error>;

    /// Delete a book by identifier.
    async fn delete(&self, id: i64) -> Result<(), Error>;

    /// Fetch a book by identifier.
    async fn get(&self, id: i64) -> Result<Book, Error>;

    /// All books.
    async fn list(&self) -> Result<Vec<Book>, Error>;

    /// Books filtered by publication flag.
    async fn by_published(&self, published: bool) -> Result<Vec<Book>, Error>;

    /// Books with an exact title match, ignoring case.
    async fn by_title(&self, title: &str) -> Result<Vec<Book>, Error>;

    /// Books whose title contains the text, ignoring case.
    async fn by_title_contains(&self, text: &str) -> Result<Vec<Book>, Error>;

    /// The book carrying the ISBN, ignoring case.
    async fn by_isbn(&self, isbn: &str) -> Result<Book, Error>;

    /// Books whose title or description contains the text, ignoring case.
    async fn by_text(&self, text: &str) -> Result<Vec<Book>, Error>;

    /// Books published between 1 January of `start_year` and 31 December
    /// of `end_year`.
    async fn between_years(&self, start_year: i32, end_year: i32) -> Result<Vec<Book>, Error>;
}
