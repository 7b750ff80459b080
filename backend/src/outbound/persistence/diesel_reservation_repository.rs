//! PostgreSQL-backed `ReservationRepository` implementation using Diesel ORM.
//!
//! The guarded insert runs as one transaction that locks the user row and
//! then the book row with `FOR UPDATE` (fixed ordering so concurrent calls
//! cannot deadlock), re-counts active reservations under those locks, and
//! only then inserts. A partial unique index on active (user, book) pairs
//! backs the duplicate check as a second line of defence.

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::AsyncConnection as _;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{
    AdmissionLimits, GuardedInsert, ReservationPersistenceError, ReservationRepository,
};
use crate::domain::{RejectionReason, ReservationDraft};

use super::diesel_error_mapping::{classify_diesel_error, classify_pool_error, DbFailure};
use super::models::{NewReservationRow, ReservationRow};
use super::pool::{DbPool, PoolError};
use super::schema::{books, reservations, users};

/// Diesel-backed implementation of the `ReservationRepository` port.
#[derive(Clone)]
pub struct DieselReservationRepository {
    pool: DbPool,
}

impl DieselReservationRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ReservationPersistenceError {
    match classify_pool_error(error) {
        DbFailure::Connection(message) => ReservationPersistenceError::connection(message),
        DbFailure::Query(message) | DbFailure::UniqueViolation { message, .. } => {
            ReservationPersistenceError::query(message)
        }
        DbFailure::Serialization(message) => {
            ReservationPersistenceError::transient_conflict(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> ReservationPersistenceError {
    match classify_diesel_error(error) {
        DbFailure::Connection(message) => ReservationPersistenceError::connection(message),
        DbFailure::Query(message) => ReservationPersistenceError::query(message),
        // The partial unique index rejected a duplicate active pair that the
        // in-transaction re-check missed; treat it as retriable so the next
        // attempt reports the definitive rejection.
        DbFailure::UniqueViolation { message, .. } | DbFailure::Serialization(message) => {
            ReservationPersistenceError::transient_conflict(message)
        }
    }
}

#[async_trait]
impl ReservationRepository for DieselReservationRepository {
    async fn exists_active(
        &self,
        user_id: i64,
        book_id: i64,
    ) -> Result<bool, ReservationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let matches: i64 = reservations::table
            .filter(reservations::user_id.eq(user_id))
            .filter(reservations::book_id.eq(book_id))
            .filter(reservations::active.eq(true))
            .select(count_star())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(matches > 0)
    }

    async fn count_active_for_user(
        &self,
        user_id: i64,
    ) -> Result<i64, ReservationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        reservations::table
            .filter(reservations::user_id.eq(user_id))
            .filter(reservations::active.eq(true))
            .select(count_star())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn count_active_for_book(
        &self,
        book_id: i64,
    ) -> Result<i64, ReservationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        reservations::table
            .filter(reservations::book_id.eq(book_id))
            .filter(reservations::active.eq(true))
            .select(count_star())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn insert_active_guarded(
        &self,
        draft: &ReservationDraft,
        limits: AdmissionLimits,
    ) -> Result<GuardedInsert, ReservationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let draft = draft.clone();
        conn.transaction(|conn| {
            async move {
                // Lock the parent rows, user first then book, so every
                // concurrent admission for the same pair serializes here.
                let user_row: Option<i64> = users::table
                    .filter(users::id.eq(draft.user_id))
                    .select(users::id)
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                if user_row.is_none() {
                    return Ok(GuardedInsert::Rejected(RejectionReason::UserNotFound));
                }
                let book_row: Option<i64> = books::table
                    .filter(books::id.eq(draft.book_id))
                    .select(books::id)
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                if book_row.is_none() {
                    return Ok(GuardedInsert::Rejected(RejectionReason::BookNotFound));
                }

                let duplicate: i64 = reservations::table
                    .filter(reservations::user_id.eq(draft.user_id))
                    .filter(reservations::book_id.eq(draft.book_id))
                    .filter(reservations::active.eq(true))
                    .select(count_star())
                    .get_result(conn)
                    .await?;
                if duplicate > 0 {
                    return Ok(GuardedInsert::Rejected(RejectionReason::AlreadyReserved));
                }

                let user_active: i64 = reservations::table
                    .filter(reservations::user_id.eq(draft.user_id))
                    .filter(reservations::active.eq(true))
                    .select(count_star())
                    .get_result(conn)
                    .await?;
                if user_active >= limits.max_active_per_user {
                    return Ok(GuardedInsert::Rejected(
                        RejectionReason::UserReservationLimitReached,
                    ));
                }

                let book_active: i64 = reservations::table
                    .filter(reservations::book_id.eq(draft.book_id))
                    .filter(reservations::active.eq(true))
                    .select(count_star())
                    .get_result(conn)
                    .await?;
                if book_active >= i64::from(limits.book_stock) {
                    return Ok(GuardedInsert::Rejected(RejectionReason::BookStockExhausted));
                }

                let row = NewReservationRow {
                    user_id: draft.user_id,
                    book_id: draft.book_id,
                    reserved_at: draft.reserved_at,
                    active: true,
                };
                let inserted: ReservationRow = diesel::insert_into(reservations::table)
                    .values(&row)
                    .returning(ReservationRow::as_returning())
                    .get_result(conn)
                    .await?;
                Ok(GuardedInsert::Committed(inserted.into()))
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}
