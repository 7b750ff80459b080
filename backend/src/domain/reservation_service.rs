//! Reservation admission engine.
//!
//! Admission runs in two phases. The pre-checks read committed state in a
//! fixed order so the caller always learns the first failing rule. The
//! commit then delegates to [`ReservationRepository::insert_active_guarded`],
//! which re-checks every predicate and inserts in one atomic unit, so two
//! racing calls for the last copy of a book admit exactly one. Transient
//! storage conflicts retry the commit a bounded number of times.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{
    AdmissionLimits, BookPersistenceError, BookRepository, GuardedInsert, ReservationAdmission,
    ReservationPersistenceError, ReservationRepository, UserPersistenceError, UserRepository,
};
use crate::domain::{Book, Error, RejectionReason, Reservation, ReservationDraft, User};

/// Per-user ceiling on simultaneously active reservations.
pub const MAX_ACTIVE_PER_USER: i64 = 3;

/// Guarded-insert attempts before giving up on a contended commit.
const MAX_COMMIT_ATTEMPTS: u32 = 3;

/// Reservation admission service implementing the driving port.
#[derive(Clone)]
pub struct ReservationService<U, B, R> {
    user_repo: Arc<U>,
    book_repo: Arc<B>,
    reservation_repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<U, B, R> ReservationService<U, B, R> {
    /// Create a new admission service over the given repositories.
    pub fn new(
        user_repo: Arc<U>,
        book_repo: Arc<B>,
        reservation_repo: Arc<R>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repo,
            book_repo,
            reservation_repo,
            clock,
        }
    }
}

impl<U, B, R> ReservationService<U, B, R>
where
    U: UserRepository,
    B: BookRepository,
    R: ReservationRepository,
{
    async fn resolve_user(&self, email: &str) -> Result<User, Error> {
        self.user_repo
            .find_by_email(email)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| RejectionReason::UserNotFound.into())
    }

    async fn resolve_book(&self, book_id: i64) -> Result<Book, Error> {
        self.book_repo
            .find_by_id(book_id)
            .await
            .map_err(map_book_error)?
            .ok_or_else(|| RejectionReason::BookNotFound.into())
    }

    /// Advisory pre-checks, in the order rejections are reported.
    ///
    /// These read committed state without locks; the guarded insert
    /// re-checks all of them before writing.
    async fn pre_check(&self, user: &User, book: &Book) -> Result<(), Error> {
        if self
            .reservation_repo
            .exists_active(user.id, book.id)
            .await
            .map_err(map_reservation_error)?
        {
            return Err(RejectionReason::AlreadyReserved.into());
        }
        let user_active = self
            .reservation_repo
            .count_active_for_user(user.id)
            .await
            .map_err(map_reservation_error)?;
        if user_active >= MAX_ACTIVE_PER_USER {
            return Err(RejectionReason::UserReservationLimitReached.into());
        }
        let book_active = self
            .reservation_repo
            .count_active_for_book(book.id)
            .await
            .map_err(map_reservation_error)?;
        if book_active >= i64::from(book.stock) {
            return Err(RejectionReason::BookStockExhausted.into());
        }
        Ok(())
    }

    async fn commit(&self, draft: &ReservationDraft, limits: AdmissionLimits) -> Result<Reservation, Error> {
        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            match self
                .reservation_repo
                .insert_active_guarded(draft, limits)
                .await
            {
                Ok(GuardedInsert::Committed(reservation)) => {
                    info!(
                        reservation_id = reservation.id,
                        user_id = reservation.user_id,
                        book_id = reservation.book_id,
                        "reservation committed"
                    );
                    return Ok(reservation);
                }
                Ok(GuardedInsert::Rejected(reason)) => return Err(reason.into()),
                Err(ReservationPersistenceError::TransientConflict { message })
                    if attempt < MAX_COMMIT_ATTEMPTS =>
                {
                    warn!(
                        attempt,
                        book_id = draft.book_id,
                        %message,
                        "reservation commit conflicted, retrying"
                    );
                }
                Err(ReservationPersistenceError::TransientConflict { .. }) => {
                    return Err(Error::service_unavailable(
                        "reservation could not be committed under contention",
                    ));
                }
                Err(error) => return Err(map_reservation_error(error)),
            }
        }
        // 1..=MAX_COMMIT_ATTEMPTS always returns from within the loop.
        Err(Error::internal("reservation commit loop exhausted"))
    }
}

#[async_trait]
impl<U, B, R> ReservationAdmission for ReservationService<U, B, R>
where
    U: UserRepository,
    B: BookRepository,
    R: ReservationRepository,
{
    async fn reserve(&self, book_id: i64, user_email: &str) -> Result<Reservation, Error> {
        let user = self.resolve_user(user_email).await?;
        let book = self.resolve_book(book_id).await?;
        if book.stock <= 0 {
            return Err(RejectionReason::StockUndefined.into());
        }
        self.pre_check(&user, &book).await?;
        let draft = ReservationDraft {
            user_id: user.id,
            book_id: book.id,
            reserved_at: self.clock.utc(),
        };
        let limits = AdmissionLimits {
            book_stock: book.stock,
            max_active_per_user: MAX_ACTIVE_PER_USER,
        };
        self.commit(&draft, limits).await
    }
}

fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::DuplicateEmail { email } => {
            Error::internal(format!("unexpected email conflict: {email}"))
        }
    }
}

fn map_book_error(error: BookPersistenceError) -> Error {
    match error {
        BookPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("book repository unavailable: {message}"))
        }
        BookPersistenceError::Query { message } => {
            Error::internal(format!("book repository error: {message}"))
        }
        BookPersistenceError::DuplicateIsbn { isbn } => {
            Error::internal(format!("unexpected isbn conflict: {isbn}"))
        }
    }
}

fn map_reservation_error(error: ReservationPersistenceError) -> Error {
    match error {
        ReservationPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("reservation repository unavailable: {message}"))
        }
        ReservationPersistenceError::Query { message } => {
            Error::internal(format!("reservation repository error: {message}"))
        }
        ReservationPersistenceError::TransientConflict { message } => {
            Error::service_unavailable(format!("reservation commit conflicted: {message}"))
        }
    }
}
