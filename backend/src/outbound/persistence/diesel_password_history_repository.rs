//! PostgreSQL-backed `PasswordHistoryRepository` implementation using
//! Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{
    HistoryPersistenceError, PasswordHistoryEntry, PasswordHistoryRepository,
};

use super::diesel_error_mapping::{classify_diesel_error, classify_pool_error, DbFailure};
use super::models::{NewPasswordHistoryRow, PasswordHistoryRow};
use super::pool::{DbPool, PoolError};
use super::schema::password_history;

/// Diesel-backed implementation of the `PasswordHistoryRepository` port.
#[derive(Clone)]
pub struct DieselPasswordHistoryRepository {
    pool: DbPool,
}

impl DieselPasswordHistoryRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> HistoryPersistenceError {
    match classify_pool_error(error) {
        DbFailure::Connection(message) => HistoryPersistenceError::connection(message),
        DbFailure::Query(message)
        | DbFailure::Serialization(message)
        | DbFailure::UniqueViolation { message, .. } => HistoryPersistenceError::query(message),
    }
}

fn map_diesel_error(error: diesel::result::Error) -> HistoryPersistenceError {
    match classify_diesel_error(error) {
        DbFailure::Connection(message) => HistoryPersistenceError::connection(message),
        DbFailure::Query(message)
        | DbFailure::Serialization(message)
        | DbFailure::UniqueViolation { message, .. } => HistoryPersistenceError::query(message),
    }
}

#[async_trait]
impl PasswordHistoryRepository for DieselPasswordHistoryRepository {
    async fn append(
        &self,
        user_id: i64,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<(), HistoryPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewPasswordHistoryRow {
            user_id,
            password_hash,
            changed_at,
        };
        diesel::insert_into(password_history::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn recent_for_user(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<PasswordHistoryEntry>, HistoryPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<PasswordHistoryRow> = password_history::table
            .filter(password_history::user_id.eq(user_id))
            .select(PasswordHistoryRow::as_select())
            .order_by((
                password_history::changed_at.desc(),
                password_history::id.desc(),
            ))
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn prune_to_recent(
        &self,
        user_id: i64,
        keep: i64,
    ) -> Result<(), HistoryPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let kept_ids: Vec<i64> = password_history::table
            .filter(password_history::user_id.eq(user_id))
            .select(password_history::id)
            .order_by((
                password_history::changed_at.desc(),
                password_history::id.desc(),
            ))
            .limit(keep)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        diesel::delete(
            password_history::table
                .filter(password_history::user_id.eq(user_id))
                .filter(password_history::id.ne_all(kept_ids)),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(())
    }
}
