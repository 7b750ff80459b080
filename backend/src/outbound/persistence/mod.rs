//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports backed by
//! PostgreSQL via `diesel-async` with `bb8` connection pooling, plus an
//! in-memory store for tests and database-less development.
//!
//! Adapters stay thin: they translate between Diesel models and domain
//! types, and map database failures onto the typed port errors. Row structs
//! (`models.rs`) and table definitions (`schema.rs`) are internal and never
//! leak to the domain layer.

mod diesel_book_repository;
mod diesel_error_mapping;
mod diesel_password_history_repository;
mod diesel_reservation_repository;
mod diesel_security_question_repository;
mod diesel_user_repository;
mod memory;
mod models;
mod pool;
mod schema;

pub use diesel_book_repository::DieselBookRepository;
pub use diesel_password_history_repository::DieselPasswordHistoryRepository;
pub use diesel_reservation_repository::DieselReservationRepository;
pub use diesel_security_question_repository::DieselSecurityQuestionRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use memory::InMemoryStore;
pub use pool::{DbPool, PoolConfig, PoolError};
