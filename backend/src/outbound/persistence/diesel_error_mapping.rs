//! Shared classification of pool and Diesel failures.
//!
//! Repositories translate a [`DbFailure`] into their own port error type;
//! unique violations and serialization failures keep enough context for the
//! caller to map them onto duplicate-key and transient-conflict variants.

use tracing::debug;

use super::pool::PoolError;

/// Backend-agnostic database failure classes.
#[derive(Debug)]
pub(super) enum DbFailure {
    /// The connection could not be established or was lost.
    Connection(String),
    /// The query failed for a non-retriable reason.
    Query(String),
    /// A unique constraint rejected the write.
    UniqueViolation {
        constraint: Option<String>,
        message: String,
    },
    /// The transaction lost a serialization or deadlock race and may be
    /// retried.
    Serialization(String),
}

pub(super) fn classify_pool_error(error: PoolError) -> DbFailure {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            DbFailure::Connection(message)
        }
    }
}

pub(super) fn classify_diesel_error(error: diesel::result::Error) -> DbFailure {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            DbFailure::UniqueViolation {
                constraint: info.constraint_name().map(str::to_string),
                message: info.message().to_string(),
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, info) => {
            DbFailure::Serialization(info.message().to_string())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            DbFailure::Connection("database connection error".to_string())
        }
        DieselError::NotFound => DbFailure::Query("record not found".to_string()),
        DieselError::QueryBuilderError(_) => DbFailure::Query("database query error".to_string()),
        DieselError::DatabaseError(_, _) => DbFailure::Query("database error".to_string()),
        _ => DbFailure::Query("database error".to_string()),
    }
}
