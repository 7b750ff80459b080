//! Driving port for reservation admission.

use async_trait::async_trait;

use crate::domain::{Error, Reservation};

/// Admits or rejects reservation requests.
///
/// Implementations must decide and commit atomically: two racing calls for
/// the last copy of a book admit exactly one.
#[async_trait]
pub trait ReservationAdmission: Send + Sync {
    /// Reserve the book for the user identified by email.
    ///
    /// On rejection the error carries a stable machine-readable reason in
    /// its details.
    async fn reserve(&self, book_id: i64, user_email: &str) -> Result<Reservation, Error>;
}
