//! Catalogue API handlers.
//!
//! ```text
//! POST   /api/v1/books
//! GET    /api/v1/books
//! GET    /api/v1/books/{id}
//! DELETE /api/v1/books/{id}
//! GET    /api/v1/books/search?title=...&published=...
//! ```

use actix_web::{delete, get, post, web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Book, BookFields, Error};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::ApiResult;

/// Book payload for `POST /api/v1/books`.
///
/// Without `id` (or with `id = 0`) a new book is catalogued; with a positive
/// `id` the identified book's descriptive fields are rewritten.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    #[serde(default)]
    pub id: Option<i64>,
    pub isbn: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub editor: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub publication_date: Option<NaiveDate>,
    pub nb_pages: i32,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub published: bool,
}

impl BookPayload {
    fn into_parts(self) -> (Option<i64>, BookFields) {
        let fields = BookFields {
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
        };
        (self.id, fields)
    }
}

/// Filters for `GET /api/v1/books/search`; exactly one filter is applied,
/// in field order.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct BookSearchQuery {
    /// Filter on the publication flag.
    pub published: Option<bool>,
    /// Exact title, ignoring case.
    pub title: Option<String>,
    /// Title substring, ignoring case.
    pub title_contains: Option<String>,
    /// Exact ISBN, ignoring case.
    pub isbn: Option<String>,
    /// Title-or-description substring, ignoring case.
    pub text: Option<String>,
    /// First publication year of the range (inclusive).
    pub start_year: Option<i32>,
    /// Last publication year of the range (inclusive).
    pub end_year: Option<i32>,
}

/// Catalogue a new book or rewrite an existing one.
#[utoipa::path(
    post,
    path = "/api/v1/books",
    request_body = BookPayload,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 201, description = "Book catalogued", body = Book),
        (status = 400, description = "Invalid payload", body = Error),
        (status = 404, description = "Book to update not found", body = Error),
        (status = 409, description = "Duplicate ISBN", body = Error)
    ),
    tags = ["books"],
    operation_id = "addOrUpdateBook"
)]
#[post("/books")]
pub async fn add_or_update_book(
    state: web::Data<HttpState>,
    payload: web::Json<BookPayload>,
) -> ApiResult<HttpResponse> {
    let (id, fields) = payload.into_inner().into_parts();
    let creating = matches!(id, None | Some(0));
    let book = state.catalogue.add_or_update(id, fields).await?;
    let response = if creating {
        HttpResponse::Created().json(book)
    } else {
        HttpResponse::Ok().json(book)
    };
    Ok(response)
}

/// List the whole catalogue.
#[utoipa::path(
    get,
    path = "/api/v1/books",
    responses((status = 200, description = "All books", body = [Book])),
    tags = ["books"],
    operation_id = "listBooks"
)]
#[get("/books")]
pub async fn list_books(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<Book>>> {
    Ok(web::Json(state.catalogue.list().await?))
}

/// Search the catalogue with one filter.
#[utoipa::path(
    get,
    path = "/api/v1/books/search",
    params(BookSearchQuery),
    responses(
        (status = 200, description = "Matching books", body = [Book]),
        (status = 400, description = "No filter given", body = Error)
    ),
    tags = ["books"],
    operation_id = "searchBooks"
)]
#[get("/books/search")]
pub async fn search_books(
    state: web::Data<HttpState>,
    query: web::Query<BookSearchQuery>,
) -> ApiResult<web::Json<Vec<Book>>> {
    let query = query.into_inner();
    let books = if let Some(published) = query.published {
        state.catalogue.by_published(published).await?
    } else if let Some(title) = query.title {
        state.catalogue.by_title(&title).await?
    } else if let Some(text) = query.title_contains {
        state.catalogue.by_title_contains(&text).await?
    } else if let Some(isbn) = query.isbn {
        match state.catalogue.by_isbn(&isbn).await {
            Ok(book) => vec![book],
            Err(error) if error.reason() == Some("book_not_found") => vec![],
            Err(error) => return Err(error),
        }
    } else if let Some(text) = query.text {
        state.catalogue.by_text(&text).await?
    } else if let (Some(start), Some(end)) = (query.start_year, query.end_year) {
        state.catalogue.between_years(start, end).await?
    } else {
        return Err(Error::invalid_request(
            "at least one search filter must be provided",
        ));
    };
    Ok(web::Json(books))
}

/// Fetch one book by identifier.
#[utoipa::path(
    get,
    path = "/api/v1/books/{id}",
    params(("id" = i64, Path, description = "Book identifier")),
    responses(
        (status = 200, description = "The book", body = Book),
        (status = 400, description = "Invalid identifier", body = Error),
        (status = 404, description = "Unknown book", body = Error)
    ),
    tags = ["books"],
    operation_id = "getBook"
)]
#[get("/books/{id}")]
pub async fn get_book(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<Book>> {
    Ok(web::Json(state.catalogue.get(path.into_inner()).await?))
}

/// Remove a book from the catalogue.
#[utoipa::path(
    delete,
    path = "/api/v1/books/{id}",
    params(("id" = i64, Path, description = "Book identifier")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 400, description = "Invalid identifier", body = Error),
        (status = 404, description = "Unknown book", body = Error)
    ),
    tags = ["books"],
    operation_id = "deleteBook"
)]
#[delete("/books/{id}")]
pub async fn delete_book(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    state.catalogue.delete(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
