//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] generates the OpenAPI specification for the REST API: every
//! endpoint from the inbound layer plus the domain and request body schemas
//! they reference. The generated document backs Swagger UI in debug builds.

use utoipa::OpenApi;

use crate::domain::{Book, Error, ErrorCode, Reservation, SecurityQuestion, User};
use crate::inbound::http::books::BookPayload;
use crate::inbound::http::reservations::{ReservationRequest, ReservationResponse};
use crate::inbound::http::users::{
    LoginRequest, LoginResponse, PasswordChangeRequest, ProfilePatchRequest, RegisterUserRequest,
    VerifyAnswerRequest,
};

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Biblio backend API",
        description = "HTTP interface for the library catalogue, accounts and reservations."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::activate,
        crate::inbound::http::users::login,
        crate::inbound::http::users::verify_answer,
        crate::inbound::http::users::change_password,
        crate::inbound::http::users::renew_password,
        crate::inbound::http::users::update_profile,
        crate::inbound::http::users::unsubscribe,
        crate::inbound::http::books::add_or_update_book,
        crate::inbound::http::books::list_books,
        crate::inbound::http::books::search_books,
        crate::inbound::http::books::get_book,
        crate::inbound::http::books::delete_book,
        crate::inbound::http::reservations::reserve,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        User,
        Book,
        SecurityQuestion,
        Reservation,
        RegisterUserRequest,
        LoginRequest,
        LoginResponse,
        VerifyAnswerRequest,
        PasswordChangeRequest,
        ProfilePatchRequest,
        BookPayload,
        ReservationRequest,
        ReservationResponse,
    )),
    tags(
        (name = "users", description = "Account registration, login and lifecycle"),
        (name = "books", description = "Catalogue management and search"),
        (name = "reservations", description = "Loan reservation admission"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
