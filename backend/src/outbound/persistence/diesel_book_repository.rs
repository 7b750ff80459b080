//! PostgreSQL-backed `BookRepository` implementation using Diesel ORM.
//!
//! Case-insensitive lookups lean on `lower()` comparisons and `ILIKE`
//! patterns rather than application-side filtering.

use async_trait::async_trait;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::Text;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{BookPersistenceError, BookRepository};
use crate::domain::{Book, BookDraft};

use super::diesel_error_mapping::{classify_diesel_error, classify_pool_error, DbFailure};
use super::models::{BookRow, BookUpdate, NewBookRow};
use super::pool::{DbPool, PoolError};
use super::schema::books;

/// Diesel-backed implementation of the `BookRepository` port.
#[derive(Clone)]
pub struct DieselBookRepository {
    pool: DbPool,
}

impl DieselBookRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> BookPersistenceError {
    match classify_pool_error(error) {
        DbFailure::Connection(message) => BookPersistenceError::connection(message),
        DbFailure::Query(message)
        | DbFailure::Serialization(message)
        | DbFailure::UniqueViolation { message, .. } => BookPersistenceError::query(message),
    }
}

fn map_write_error(isbn: &str, error: diesel::result::Error) -> BookPersistenceError {
    match classify_diesel_error(error) {
        DbFailure::Connection(message) => BookPersistenceError::connection(message),
        DbFailure::UniqueViolation { .. } => BookPersistenceError::duplicate_isbn(isbn),
        DbFailure::Query(message) | DbFailure::Serialization(message) => {
            BookPersistenceError::query(message)
        }
    }
}

fn map_read_error(error: diesel::result::Error) -> BookPersistenceError {
    map_write_error("", error)
}

/// `%text%` pattern with LIKE metacharacters escaped.
fn contains_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl BookRepository for DieselBookRepository {
    async fn insert(&self, draft: &BookDraft) -> Result<Book, BookPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewBookRow {
            isbn: &draft.isbn,
            title: &draft.title,
            description: draft.description.as_deref(),
            editor: draft.editor.as_deref(),
            category: draft.category.as_deref(),
            language: draft.language.as_deref(),
            publication_date: draft.publication_date,
            nb_pages: draft.nb_pages,
            stock: draft.stock,
            published: draft.published,
        };
        let inserted: BookRow = diesel::insert_into(books::table)
            .values(&row)
            .returning(BookRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|error| map_write_error(&draft.isbn, error))?;
        Ok(inserted.into())
    }

    async fn update(&self, book: &Book) -> Result<(), BookPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = BookUpdate {
            isbn: &book.isbn,
            title: &book.title,
            description: book.description.as_deref(),
            editor: book.editor.as_deref(),
            category: book.category.as_deref(),
            language: book.language.as_deref(),
            publication_date: book.publication_date,
            nb_pages: book.nb_pages,
            stock: book.stock,
            published: book.published,
        };
        diesel::update(books::table.filter(books::id.eq(book.id)))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(|error| map_write_error(&book.isbn, error))?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), BookPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::delete(books::table.filter(books::id.eq(id)))
            .execute(&mut conn)
            .await
            .map_err(map_read_error)?;
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, BookPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<BookRow> = books::table
            .filter(books::id.eq(id))
            .select(BookRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_read_error)?;
        Ok(row.map(Into::into))
    }

    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>, BookPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<BookRow> = books::table
            .filter(sql::<Text>("lower(isbn)").eq(isbn.to_lowercase()))
            .select(BookRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_read_error)?;
        Ok(row.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<Book>, BookPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<BookRow> = books::table
            .select(BookRow::as_select())
            .order_by(books::id)
            .load(&mut conn)
            .await
            .map_err(map_read_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_published(&self, published: bool) -> Result<Vec<Book>, BookPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<BookRow> = books::table
            .filter(books::published.eq(published))
            .select(BookRow::as_select())
            .order_by(books::id)
            .load(&mut conn)
            .await
            .map_err(map_read_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_title(&self, title: &str) -> Result<Vec<Book>, BookPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<BookRow> = books::table
            .filter(sql::<Text>("lower(title)").eq(title.to_lowercase()))
            .select(BookRow::as_select())
            .order_by(books::id)
            .load(&mut conn)
            .await
            .map_err(map_read_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_title_contains(
        &self,
        text: &str,
    ) -> Result<Vec<Book>, BookPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<BookRow> = books::table
            .filter(books::title.ilike(contains_pattern(text)))
            .select(BookRow::as_select())
            .order_by(books::id)
            .load(&mut conn)
            .await
            .map_err(map_read_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_text(&self, text: &str) -> Result<Vec<Book>, BookPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let pattern = contains_pattern(text);
        let rows: Vec<BookRow> = books::table
            .filter(
                books::title
                    .ilike(pattern.clone())
                    .or(books::description.ilike(pattern)),
            )
            .select(BookRow::as_select())
            .order_by(books::id)
            .load(&mut conn)
            .await
            .map_err(map_read_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_publication_between(
        &self,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    ) -> Result<Vec<Book>, BookPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<BookRow> = books::table
            .filter(books::publication_date.between(start, end))
            .select(BookRow::as_select())
            .order_by(books::id)
            .load(&mut conn)
            .await
            .map_err(map_read_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
