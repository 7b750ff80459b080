//! Port abstraction for reservation persistence adapters.
//!
//! The central operation is [`ReservationRepository::insert_active_guarded`]:
//! one atomic re-check-and-insert that adapters must serialize against every
//! other guarded insert touching the same book or user. This is what closes
//! the read-decide-write race of naive check-then-act admission.

use async_trait::async_trait;

use crate::domain::{RejectionReason, Reservation, ReservationDraft};

/// Persistence errors raised by reservation repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReservationPersistenceError {
    /// Repository connection could not be established.
    #[error("reservation repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("reservation repository query failed: {message}")]
    Query { message: String },
    /// The storage engine aborted the transaction under contention; the
    /// caller may retry the whole decide step.
    #[error("reservation transaction conflicted: {message}")]
    TransientConflict { message: String },
}

impl ReservationPersistenceError {
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

    /// Create a transient-conflict error with the given message.
    pub fn transient_conflict(message: impl Into<String>) -> Self {
        Self::TransientConflict {
            message: message.into(),
        }
    }
}

/// Ceilings re-checked inside the guarded insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionLimits {
    /// The book's stock: maximum simultaneously active reservations.
    pub book_stock: i32,
    /// Per-user ceiling on active reservations.
    pub max_active_per_user: i64,
}

/// Outcome of the atomic re-check-and-insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardedInsert {
    /// All predicates held; the reservation is committed.
    Committed(Reservation),
    /// A concurrent writer invalidated a predicate; nothing was written.
    Rejected(RejectionReason),
}

/// Driven port for reservation rows.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Whether an active reservation exists for the (user, book) pair.
    async fn exists_active(
        &self,
        user_id: i64,
        book_id: i64,
    ) -> Result<bool, ReservationPersistenceError>;

    /// Number of active reservations held by the user.
    async fn count_active_for_user(
        &self,
        user_id: i64,
    ) -> Result<i64, ReservationPersistenceError>;

    /// Number of active reservations against the book.
    async fn count_active_for_book(
        &self,
        book_id: i64,
    ) -> Result<i64, ReservationPersistenceError>;

    /// Atomically re-check the admission predicates and insert the
    /// reservation only if they all still hold.
    ///
    /// Predicates, evaluated in rejection order against committed state:
    /// no active (user, book) duplicate; user activity below
    /// `max_active_per_user`; book activity below `book_stock`. Adapters
    /// must guarantee the re-check and the insert are one atomic unit with
    /// respect to every concurrent call for the same book or user, and must
    /// write nothing when rejecting.
    async fn insert_active_guarded(
        &self,
        draft: &ReservationDraft,
        limits: AdmissionLimits,
    ) -> Result<GuardedInsert, ReservationPersistenceError>;
}
