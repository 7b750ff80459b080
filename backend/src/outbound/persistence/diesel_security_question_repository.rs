//! PostgreSQL-backed `SecurityQuestionRepository` implementation using
//! Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{QuestionPersistenceError, SecurityQuestionRepository};
use crate::domain::SecurityQuestion;

use super::diesel_error_mapping::{classify_diesel_error, classify_pool_error, DbFailure};
use super::models::{NewSecurityQuestionRow, SecurityQuestionRow};
use super::pool::{DbPool, PoolError};
use super::schema::security_questions;

/// Diesel-backed implementation of the `SecurityQuestionRepository` port.
#[derive(Clone)]
pub struct DieselSecurityQuestionRepository {
    pool: DbPool,
}

impl DieselSecurityQuestionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> QuestionPersistenceError {
    match classify_pool_error(error) {
        DbFailure::Connection(message) => QuestionPersistenceError::connection(message),
        DbFailure::Query(message)
        | DbFailure::Serialization(message)
        | DbFailure::UniqueViolation { message, .. } => QuestionPersistenceError::query(message),
    }
}

fn map_diesel_error(error: diesel::result::Error) -> QuestionPersistenceError {
    match classify_diesel_error(error) {
        DbFailure::Connection(message) => QuestionPersistenceError::connection(message),
        DbFailure::Query(message)
        | DbFailure::Serialization(message)
        | DbFailure::UniqueViolation { message, .. } => QuestionPersistenceError::query(message),
    }
}

#[async_trait]
impl SecurityQuestionRepository for DieselSecurityQuestionRepository {
    async fn count(&self) -> Result<i64, QuestionPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        security_questions::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn insert_labels(&self, labels: &[&str]) -> Result<(), QuestionPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<NewSecurityQuestionRow<'_>> = labels
            .iter()
            .map(|label| NewSecurityQuestionRow { label })
            .collect();
        diesel::insert_into(security_questions::table)
            .values(&rows)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: i64,
    ) -> Result<Option<SecurityQuestion>, QuestionPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<SecurityQuestionRow> = security_questions::table
            .filter(security_questions::id.eq(id))
            .select(SecurityQuestionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<SecurityQuestion>, QuestionPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<SecurityQuestionRow> = security_questions::table
            .select(SecurityQuestionRow::as_select())
            .order_by(security_questions::id)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
