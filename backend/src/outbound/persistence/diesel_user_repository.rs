//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::User;

use super::diesel_error_mapping::{classify_diesel_error, classify_pool_error, DbFailure};
use super::models::{NewUserRow, UserRow, UserUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
///
/// Row deletion relies on `ON DELETE CASCADE` to clear the user's password
/// history and reservations.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    match classify_pool_error(error) {
        DbFailure::Connection(message) => UserPersistenceError::connection(message),
        DbFailure::Query(message)
        | DbFailure::Serialization(message)
        | DbFailure::UniqueViolation { message, .. } => UserPersistenceError::query(message),
    }
}

fn map_diesel_error(email: &str, error: diesel::result::Error) -> UserPersistenceError {
    match classify_diesel_error(error) {
        DbFailure::Connection(message) => UserPersistenceError::connection(message),
        DbFailure::UniqueViolation { .. } => UserPersistenceError::duplicate_email(email),
        DbFailure::Query(message) | DbFailure::Serialization(message) => {
            UserPersistenceError::query(message)
        }
    }
}

fn map_read_error(error: diesel::result::Error) -> UserPersistenceError {
    map_diesel_error("", error)
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, user: &User) -> Result<User, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewUserRow {
            firstname: &user.firstname,
            lastname: &user.lastname,
            email: &user.email,
            password_hash: &user.password_hash,
            role: &user.role,
            birthdate: user.birthdate,
            active: user.active,
            security_question_id: user.security_question_id,
            security_answer_hash: user.security_answer_hash.as_deref(),
            last_password_change: user.last_password_change,
        };
        let inserted: UserRow = diesel::insert_into(users::table)
            .values(&row)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|error| map_diesel_error(&user.email, error))?;
        Ok(inserted.into())
    }

    async fn update(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = UserUpdate {
            firstname: &user.firstname,
            lastname: &user.lastname,
            email: &user.email,
            password_hash: &user.password_hash,
            role: &user.role,
            birthdate: user.birthdate,
            active: user.active,
            security_question_id: user.security_question_id,
            security_answer_hash: user.security_answer_hash.as_deref(),
            last_password_change: user.last_password_change,
        };
        diesel::update(users::table.filter(users::id.eq(user.id)))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(|error| map_diesel_error(&user.email, error))?;
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_read_error)?;
        Ok(row.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_read_error)?;
        Ok(row.map(Into::into))
    }

    async fn delete(&self, id: i64) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::delete(users::table.filter(users::id.eq(id)))
            .execute(&mut conn)
            .await
            .map_err(map_read_error)?;
        Ok(())
    }
}
