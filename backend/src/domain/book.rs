//! Catalogue book aggregate.
//!
//! `stock` is the ceiling on simultaneously active reservations for the
//! book; the admission engine never admits past it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A catalogued book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Surrogate identifier, strictly positive.
    pub id: i64,
    /// Globally unique ISBN (case-insensitive).
    pub isbn: String,
    /// Title, non-empty.
    pub title: String,
    /// Back-cover description.
    pub description: Option<String>,
    /// Publishing house.
    pub editor: Option<String>,
    /// Shelf category.
    pub category: Option<String>,
    /// Language of the edition.
    pub language: Option<String>,
    /// Date of publication.
    pub publication_date: Option<NaiveDate>,
    /// Page count, strictly positive.
    pub nb_pages: i32,
    /// Maximum number of simultaneously active reservations.
    pub stock: i32,
    /// Whether the book is published (visible in the public catalogue).
    pub published: bool,
}

/// Validation failures raised by [`BookDraft::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookValidationError {
    /// ISBN must be present.
    #[error("isbn must not be empty")]
    EmptyIsbn,
    /// Title must be present.
    #[error("title must not be empty")]
    EmptyTitle,
    /// Page count must be strictly positive.
    #[error("nb_pages must be greater than zero")]
    NonPositivePageCount,
    /// Stock can be zero but never negative.
    #[error("stock must not be negative")]
    NegativeStock,
}

/// A validated book payload without a persisted identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDraft {
    pub isbn: String,
    pub title: String,
    pub description: Option<String>,
    pub editor: Option<String>,
    pub category: Option<String>,
    pub language: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub nb_pages: i32,
    pub stock: i32,
    pub published: bool,
}

/// Unvalidated field bundle accepted by [`BookDraft::new`].
#[derive(Debug, Clone, Default)]
pub struct BookFields {
    pub isbn: String,
    pub title: String,
    pub description: Option<String>,
    pub editor: Option<String>,
    pub category: Option<String>,
    pub language: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub nb_pages: i32,
    pub stock: i32,
    pub published: bool,
}

impl BookDraft {
    /// Validate the field bundle into a draft.
    pub fn new(fields: BookFields) -> Result<Self, BookValidationError> {
        if fields.isbn.trim().is_empty() {
            return Err(BookValidationError::EmptyIsbn);
        }
        if fields.title.trim().is_empty() {
            return Err(BookValidationError::EmptyTitle);
        }
        if fields.nb_pages <= 0 {
            return Err(BookValidationError::NonPositivePageCount);
        }
        if fields.stock < 0 {
            return Err(BookValidationError::NegativeStock);
        }
        Ok(Self {
            isbn: fields.isbn,
            title: fields.title,
            description: fields.description,
            editor: fields.editor,
            category: fields.category,
            language: fields.language,
            publication_date: fields.publication_date,
            nb_pages: fields.nb_pages,
            stock: fields.stock,
            published: fields.published,
        })
    }

    /// Attach a persisted identity to the draft.
    pub fn into_book(self, id: i64) -> Book {
        Book {
            id,
            isbn: self.isbn,
            title: self.title,
            description: self.description,
            editor: self.editor,
            category: self.category,
            language: self.language,
            publication_date: self.publication_date,
            nb_pages: self.nb_pages,
            stock: self.stock,
            published: self.published,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn fields() -> BookFields {
        BookFields {
            isbn: "978-2-1234-5680-3".into(),
            title: "Le Comte de Monte-Cristo".into(),
            nb_pages: 1248,
            stock: 2,
            published: true,
            ..BookFields::default()
        }
    }

    #[test]
    fn accepts_a_complete_payload() {
        let draft = BookDraft::new(fields()).expect("valid draft");
        let book = draft.into_book(7);
        assert_eq!(book.id, 7);
        assert_eq!(book.stock, 2);
    }

    #[rstest]
    #[case::blank_isbn(
        BookFields { isbn: "  ".into(), ..fields() },
        BookValidationError::EmptyIsbn
    )]
    #[case::blank_title(
        BookFields { title: String::new(), ..fields() },
        BookValidationError::EmptyTitle
    )]
    #[case::zero_pages(
        BookFields { nb_pages: 0, ..fields() },
        BookValidationError::NonPositivePageCount
    )]
    #[case::negative_stock(
        BookFields { stock: -1, ..fields() },
        BookValidationError::NegativeStock
    )]
    fn rejects_invalid_fields(#[case] fields: BookFields, #[case] expected: BookValidationError) {
        assert_eq!(BookDraft::new(fields).expect_err("invalid draft"), expected);
    }

    #[test]
    fn zero_stock_is_allowed() {
        let draft = BookDraft::new(BookFields {
            stock: 0,
            ..fields()
        });
        assert!(draft.is_ok());
    }
}
