//! Domain ports for the hexagonal boundary.
//!
//! Driven ports (repositories, hasher) are implemented by outbound
//! adapters; driving ports (admission, account lifecycle, catalogue) are
//! implemented by domain services and consumed by inbound adapters.

mod account_lifecycle;
mod book_repository;
mod catalogue;
mod password_hasher;
mod password_history_repository;
mod reservation_admission;
mod reservation_repository;
mod security_question_repository;
mod user_repository;

pub use account_lifecycle::{AccountLifecycle, LoginChallenge};
pub use book_repository::{BookPersistenceError, BookRepository};
pub use catalogue::Catalogue;
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{HasherError, PasswordHasher};
pub use password_history_repository::{
    HistoryPersistenceError, PasswordHistoryEntry, PasswordHistoryRepository,
};
pub use reservation_admission::ReservationAdmission;
pub use reservation_repository::{
    AdmissionLimits, GuardedInsert, ReservationPersistenceError, ReservationRepository,
};
pub use security_question_repository::{QuestionPersistenceError, SecurityQuestionRepository};
pub use user_repository::{UserPersistenceError, UserRepository};
