//! Catalogue service: book CRUD and the derived search queries.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::info;

use crate::domain::ports::{BookPersistenceError, BookRepository, Catalogue};
use crate::domain::{Book, BookDraft, BookFields, BookValidationError, Error};

/// Catalogue service implementing the driving port.
#[derive(Clone)]
pub struct CatalogueService<B> {
    book_repo: Arc<B>,
}

impl<B> CatalogueService<B> {
    /// Create a new catalogue service over the given repository.
    pub fn new(book_repo: Arc<B>) -> Self {
        Self { book_repo }
    }
}

impl<B> CatalogueService<B>
where
    B: BookRepository,
{
    async fn create(&self, fields: BookFields) -> Result<Book, Error> {
        let existing = self
            .book_repo
            .find_by_isbn(&fields.isbn)
            .await
            .map_err(map_book_error)?;
        if existing.is_some() {
            return Err(isbn_already_exists(&fields.isbn));
        }
        let draft = BookDraft::new(fields).map_err(map_validation_error)?;
        let book = match self.book_repo.insert(&draft).await {
            Ok(book) => book,
            Err(BookPersistenceError::DuplicateIsbn { isbn }) => {
                return Err(isbn_already_exists(&isbn));
            }
            Err(error) => return Err(map_book_error(error)),
        };
        info!(book_id = book.id, isbn = %book.isbn, "book catalogued");
        Ok(book)
    }

    async fn rewrite(&self, id: i64, fields: BookFields) -> Result<Book, Error> {
        let mut book = self.required_book(id).await?;
        let draft = BookDraft::new(fields).map_err(map_validation_error)?;
        // Descriptive fields only; the publication flag and stock keep
        // their stored values.
        book.isbn = draft.isbn;
        book.title = draft.title;
        book.description = draft.description;
        book.editor = draft.editor;
        book.category = draft.category;
        book.language = draft.language;
        book.publication_date = draft.publication_date;
        book.nb_pages = draft.nb_pages;
        match self.book_repo.update(&book).await {
            Ok(()) => Ok(book),
            Err(BookPersistenceError::DuplicateIsbn { isbn }) => Err(isbn_already_exists(&isbn)),
            Err(error) => Err(map_book_error(error)),
        }
    }

    async fn required_book(&self, id: i64) -> Result<Book, Error> {
        self.book_repo
            .find_by_id(id)
            .await
            .map_err(map_book_error)?
            .ok_or_else(|| Error::not_found("book not found").with_reason("book_not_found"))
    }
}

fn require_positive_id(id: i64) -> Result<(), Error> {
    if id <= 0 {
        return Err(
            Error::invalid_request("book id must be greater than zero").with_reason("invalid_book_id")
        );
    }
    Ok(())
}

#[async_trait]
impl<B> Catalogue for CatalogueService<B>
where
    B: BookRepository,
{
    async fn add_or_update(&self, id: Option<i64>, fields: BookFields) -> Result<Book, Error> {
        match id {
            None | Some(0) => self.create(fields).await,
            Some(id) => {
                require_positive_id(id)?;
                self.rewrite(id, fields).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<(), Error> {
        require_positive_id(id)?;
        let book = self.required_book(id).await?;
        self.book_repo
            .delete(book.id)
            .await
            .map_err(map_book_error)?;
        info!(book_id = book.id, "book deleted");
        Ok(())
    }

    async fn get(&self, id: i64) -> Result<Book, Error> {
        require_positive_id(id)?;
        self.required_book(id).await
    }

    async fn list(&self) -> Result<Vec<Book>, Error> {
        self.book_repo.list().await.map_err(map_book_error)
    }

    async fn by_published(&self, published: bool) -> Result<Vec<Book>, Error> {
        self.book_repo
            .find_by_published(published)
            .await
            .map_err(map_book_error)
    }

    async fn by_title(&self, title: &str) -> Result<Vec<Book>, Error> {
        self.book_repo
            .find_by_title(title)
            .await
            .map_err(map_book_error)
    }

    async fn by_title_contains(&self, text: &str) -> Result<Vec<Book>, Error> {
        self.book_repo
            .find_by_title_contains(text)
            .await
            .map_err(map_book_error)
    }

    async fn by_isbn(&self, isbn: &str) -> Result<Book, Error> {
        self.book_repo
            .find_by_isbn(isbn)
            .await
            .map_err(map_book_error)?
            .ok_or_else(|| Error::not_found("book not found").with_reason("book_not_found"))
    }

    async fn by_text(&self, text: &str) -> Result<Vec<Book>, Error> {
        self.book_repo
            .find_by_text(text)
            .await
            .map_err(map_book_error)
    }

    async fn between_years(&self, start_year: i32, end_year: i32) -> Result<Vec<Book>, Error> {
        let start = NaiveDate::from_ymd_opt(start_year, 1, 1)
            .ok_or_else(|| Error::invalid_request("start year is out of range"))?;
        let end = NaiveDate::from_ymd_opt(end_year, 12, 31)
            .ok_or_else(|| Error::invalid_request("end year is out of range"))?;
        self.book_repo
            .find_by_publication_between(start, end)
            .await
            .map_err(map_book_error)
    }
}

fn isbn_already_exists(isbn: &str) -> Error {
    Error::conflict(format!("a book with isbn {isbn} already exists"))
        .with_reason("isbn_already_exists")
}

fn map_validation_error(error: BookValidationError) -> Error {
    Error::invalid_request(error.to_string()).with_reason(match error {
        BookValidationError::EmptyIsbn => "isbn_required",
        BookValidationError::EmptyTitle => "title_required",
        BookValidationError::NonPositivePageCount => "nb_pages_invalid",
        BookValidationError::NegativeStock => "stock_invalid",
    })
}

fn map_book_error(error: BookPersistenceError) -> Error {
    match error {
        BookPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("book repository unavailable: {message}"))
        }
        BookPersistenceError::Query { message } => {
            Error::internal(format!("book repository error: {message}"))
        }
        BookPersistenceError::DuplicateIsbn { isbn } => isbn_already_exists(&isbn),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use rstest::rstest;

    use super::*;
    use crate::domain::ErrorCode;

    #[derive(Default)]
    struct StubBookRepository {
        state: Mutex<Vec<Book>>,
    }

    impl StubBookRepository {
        fn with_books(books: Vec<Book>) -> Self {
            Self {
                state: Mutex::new(books),
            }
        }

        fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Book>> {
            self.state.lock().expect("book state mutex")
        }
    }

    #[async_trait]
    impl BookRepository for StubBookRepository {
        async fn insert(&self, draft: &BookDraft) -> Result<Book, BookPersistenceError> {
            let mut state = self.lock();
            if state
                .iter()
                .any(|book| book.isbn.eq_ignore_ascii_case(&draft.isbn))
            {
                return Err(BookPersistenceError::duplicate_isbn(&draft.isbn));
            }
            let id = state.iter().map(|book| book.id).max().unwrap_or(0) + 1;
            let book = draft.clone().into_book(id);
            state.push(book.clone());
            Ok(book)
        }

        async fn update(&self, book: &Book) -> Result<(), BookPersistenceError> {
            let mut state = self.lock();
            let slot = state
                .iter_mut()
                .find(|existing| existing.id == book.id)
                .ok_or_else(|| BookPersistenceError::query("missing book row"))?;
            *slot = book.clone();
            Ok(())
        }

        async fn delete(&self, id: i64) -> Result<(), BookPersistenceError> {
            self.lock().retain(|book| book.id != id);
            Ok(())
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<Book>, BookPersistenceError> {
            Ok(self.lock().iter().find(|book| book.id == id).cloned())
        }

        async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>, BookPersistenceError> {
            Ok(self
                .lock()
                .iter()
                .find(|book| book.isbn.eq_ignore_ascii_case(isbn))
                .cloned())
        }

        async fn list(&self) -> Result<Vec<Book>, BookPersistenceError> {
            Ok(self.lock().clone())
        }

        async fn find_by_published(
            &self,
            published: bool,
        ) -> Result<Vec<Book>, BookPersistenceError> {
            Ok(self
                .lock()
                .iter()
                .filter(|book| book.published == published)
                .cloned()
                .collect())
        }

        async fn find_by_title(&self, title: &str) -> Result<Vec<Book>, BookPersistenceError> {
            Ok(self
                .lock()
                .iter()
                .filter(|book| book.title.eq_ignore_ascii_case(title))
                .cloned()
                .collect())
        }

        async fn find_by_title_contains(
            &self,
            text: &str,
        ) -> Result<Vec<Book>, BookPersistenceError> {
            let needle = text.to_lowercase();
            Ok(self
                .lock()
                .iter()
                .filter(|book| book.title.to_lowercase().contains(&needle))
                .cloned()
                .collect())
        }

        async fn find_by_text(&self, text: &str) -> Result<Vec<Book>, BookPersistenceError> {
            let needle = text.to_lowercase();
            Ok(self
                .lock()
                .iter()
                .filter(|book| {
                    book.title.to_lowercase().contains(&needle)
                        || book
                            .description
                            .as_deref()
                            .is_some_and(|d| d.to_lowercase().contains(&needle))
                })
                .cloned()
                .collect())
        }

        async fn find_by_publication_between(
            &self,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<Book>, BookPersistenceError> {
            Ok(self
                .lock()
                .iter()
                .filter(|book| {
                    book.publication_date
                        .is_some_and(|date| date >= start && date <= end)
                })
                .cloned()
                .collect())
        }
    }

    fn fields(isbn: &str, title: &str) -> BookFields {
        BookFields {
            isbn: isbn.into(),
            title: title.into(),
            description: Some("Un roman d'aventure".into()),
            nb_pages: 500,
            stock: 3,
            published: true,
            ..BookFields::default()
        }
    }

    fn book(id: i64, isbn: &str, title: &str) -> Book {
        BookDraft::new(fields(isbn, title))
            .expect("valid fixture")
            .into_book(id)
    }

    fn service(books: Vec<Book>) -> (CatalogueService<StubBookRepository>, Arc<StubBookRepository>) {
        let repo = Arc::new(StubBookRepository::with_books(books));
        (CatalogueService::new(Arc::clone(&repo)), repo)
    }

    #[tokio::test]
    async fn creates_a_book_without_an_id() {
        let (service, repo) = service(vec![]);
        let book = service
            .add_or_update(None, fields("978-2-07-040850-4", "Candide"))
            .await
            .expect("created");
        assert_eq!(book.id, 1);
        assert_eq!(repo.lock().len(), 1);
    }

    #[rstest]
    #[case::same_case("978-2-07-040850-4")]
    #[case::different_case("978-2-07-040850-4x")]
    #[tokio::test]
    async fn create_rejects_duplicate_isbn(#[case] existing_isbn: &str) {
        let (service, _) = service(vec![book(1, existing_isbn, "Candide")]);
        let error = service
            .add_or_update(None, fields(&existing_isbn.to_uppercase(), "Zadig"))
            .await
            .expect_err("duplicate");
        assert_eq!(error.code, ErrorCode::Conflict);
        assert_eq!(error.reason(), Some("isbn_already_exists"));
    }

    #[tokio::test]
    async fn update_rewrites_descriptive_fields_only() {
        let mut stored = book(1, "978-2-07-040850-4", "Candide");
        stored.published = false;
        stored.stock = 7;
        let (service, repo) = service(vec![stored]);
        let mut new_fields = fields("978-2-07-040850-4", "Candide ou l'Optimisme");
        new_fields.published = true;
        new_fields.stock = 1;
        let updated = service
            .add_or_update(Some(1), new_fields)
            .await
            .expect("updated");
        assert_eq!(updated.title, "Candide ou l'Optimisme");
        assert!(!updated.published);
        assert_eq!(updated.stock, 7);
        assert_eq!(repo.lock()[0].title, "Candide ou l'Optimisme");
    }

    #[tokio::test]
    async fn update_of_a_missing_book_is_not_found() {
        let (service, _) = service(vec![]);
        let error = service
            .add_or_update(Some(9), fields("978-2-07-040850-4", "Candide"))
            .await
            .expect_err("missing");
        assert_eq!(error.code, ErrorCode::NotFound);
        assert_eq!(error.reason(), Some("book_not_found"));
    }

    #[tokio::test]
    async fn id_zero_means_create() {
        let (service, _) = service(vec![]);
        let book = service
            .add_or_update(Some(0), fields("978-2-07-040850-4", "Candide"))
            .await
            .expect("created");
        assert_eq!(book.id, 1);
    }

    #[rstest]
    #[case(BookFields { isbn: " ".into(), ..fields("x", "Candide") }, "isbn_required")]
    #[case(BookFields { title: String::new(), ..fields("978-2", "x") }, "title_required")]
    #[case(BookFields { nb_pages: 0, ..fields("978-2", "Candide") }, "nb_pages_invalid")]
    #[case(BookFields { stock: -2, ..fields("978-2", "Candide") }, "stock_invalid")]
    #[tokio::test]
    async fn create_validates_fields(#[case] invalid: BookFields, #[case] reason: &str) {
        let (service, _) = service(vec![]);
        let error = service.add_or_update(None, invalid).await.expect_err("invalid");
        assert_eq!(error.code, ErrorCode::InvalidRequest);
        assert_eq!(error.reason(), Some(reason));
    }

    #[rstest]
    #[case(-3)]
    #[case(0)]
    #[tokio::test]
    async fn get_rejects_non_positive_ids(#[case] id: i64) {
        let (service, _) = service(vec![]);
        let error = service.get(id).await.expect_err("invalid id");
        assert_eq!(error.code, ErrorCode::InvalidRequest);
        assert_eq!(error.reason(), Some("invalid_book_id"));
    }

    #[tokio::test]
    async fn delete_requires_an_existing_book() {
        let (service, repo) = service(vec![book(1, "978-2-07-040850-4", "Candide")]);
        service.delete(1).await.expect("deleted");
        assert!(repo.lock().is_empty());
        let error = service.delete(1).await.expect_err("already gone");
        assert_eq!(error.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn search_queries_delegate_to_the_repository() {
        let mut hidden = book(2, "978-2-07-041234-1", "Zadig");
        hidden.published = false;
        hidden.description = Some("Un conte philosophique".into());
        let (service, _) = service(vec![book(1, "978-2-07-040850-4", "Candide"), hidden]);

        assert_eq!(service.list().await.expect("list").len(), 2);
        assert_eq!(service.by_published(true).await.expect("published").len(), 1);
        assert_eq!(service.by_title("candide").await.expect("title").len(), 1);
        assert_eq!(
            service.by_title_contains("adi").await.expect("contains").len(),
            1
        );
        assert_eq!(
            service.by_isbn("978-2-07-041234-1").await.expect("isbn").id,
            2
        );
        assert_eq!(
            service.by_text("philosophique").await.expect("text").len(),
            1
        );
    }

    #[tokio::test]
    async fn year_range_runs_january_through_december() {
        let mut early = book(1, "978-1", "Early");
        early.publication_date = NaiveDate::from_ymd_opt(2001, 1, 1);
        let mut late = book(2, "978-2", "Late");
        late.publication_date = NaiveDate::from_ymd_opt(2003, 12, 31);
        let mut outside = book(3, "978-3", "Outside");
        outside.publication_date = NaiveDate::from_ymd_opt(2004, 1, 1);
        let (service, _) = service(vec![early, late, outside]);

        let found = service.between_years(2001, 2003).await.expect("range");
        assert_eq!(found.len(), 2);
    }
}
