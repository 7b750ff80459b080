//! Domain primitives, aggregates and services.
//!
//! Purpose: define the strongly typed entities shared by the API and
//! persistence layers, the hexagonal ports around them, and the services
//! implementing the driving ports. Each type documents its invariants and
//! serde contract in its own Rustdoc.

pub mod account_service;
pub mod book;
pub mod bootstrap;
pub mod catalogue_service;
pub mod error;
pub mod ports;
pub mod reservation;
pub mod reservation_service;
pub mod security_question;
pub mod user;

pub use self::account_service::{AccountService, HISTORY_DEPTH, PASSWORD_EXPIRY_WEEKS};
pub use self::book::{Book, BookDraft, BookFields, BookValidationError};
pub use self::bootstrap::seed_security_questions;
pub use self::catalogue_service::CatalogueService;
pub use self::error::{Error, ErrorCode};
pub use self::reservation::{RejectionReason, Reservation, ReservationDraft};
pub use self::reservation_service::{ReservationService, MAX_ACTIVE_PER_USER};
pub use self::security_question::{
    normalize_security_answer, SecurityQuestion, DEFAULT_QUESTION_LABELS,
};
pub use self::user::{ProfilePatch, RegisterRequest, User};
