//! Reservation aggregate and the typed rejection vocabulary of the
//! admission engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, ErrorCode};

/// A committed reservation.
///
/// Rows are never physically deleted by the engine; returning or expiring a
/// book flips `active` to `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    /// Surrogate identifier, strictly positive.
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub reserved_at: DateTime<Utc>,
    pub active: bool,
}

/// Reservation payload before the store assigns an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationDraft {
    pub user_id: i64,
    pub book_id: i64,
    pub reserved_at: DateTime<Utc>,
}

impl ReservationDraft {
    /// Attach the persisted identity; new reservations are always active.
    pub fn into_reservation(self, id: i64) -> Reservation {
        Reservation {
            id,
            user_id: self.user_id,
            book_id: self.book_id,
            reserved_at: self.reserved_at,
            active: true,
        }
    }
}

/// Why a `reserve` call was refused, in check order.
///
/// The first failing check wins; the engine never reports more than one
/// reason per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// The email resolves to no user.
    UserNotFound,
    /// The id resolves to no book.
    BookNotFound,
    /// The book's stock is unset or not positive.
    StockUndefined,
    /// The user already holds an active reservation for this book.
    AlreadyReserved,
    /// The user already holds the maximum number of active reservations.
    UserReservationLimitReached,
    /// Every stock unit of the book is already reserved.
    BookStockExhausted,
}

impl RejectionReason {
    /// Stable snake_case name carried in `Error.details.reason`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserNotFound => "user_not_found",
            Self::BookNotFound => "book_not_found",
            Self::StockUndefined => "stock_undefined",
            Self::AlreadyReserved => "already_reserved",
            Self::UserReservationLimitReached => "user_reservation_limit_reached",
            Self::BookStockExhausted => "book_stock_exhausted",
        }
    }

    fn message(self) -> &'static str {
        match self {
            Self::UserNotFound => "user not found",
            Self::BookNotFound => "book not found",
            Self::StockUndefined => "stock is undefined or zero for this book",
            Self::AlreadyReserved => "an active reservation already exists for this book",
            Self::UserReservationLimitReached => "reservation limit reached (3 active books)",
            Self::BookStockExhausted => "no stock left for this book",
        }
    }

    fn code(self) -> ErrorCode {
        match self {
            Self::UserNotFound | Self::BookNotFound => ErrorCode::NotFound,
            Self::StockUndefined
            | Self::AlreadyReserved
            | Self::UserReservationLimitReached
            | Self::BookStockExhausted => ErrorCode::Conflict,
        }
    }
}

impl From<RejectionReason> for Error {
    fn from(reason: RejectionReason) -> Self {
        Self::new(reason.code(), reason.message()).with_reason(reason.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RejectionReason::UserNotFound, ErrorCode::NotFound, "user_not_found")]
    #[case(RejectionReason::BookNotFound, ErrorCode::NotFound, "book_not_found")]
    #[case(RejectionReason::StockUndefined, ErrorCode::Conflict, "stock_undefined")]
    #[case(RejectionReason::AlreadyReserved, ErrorCode::Conflict, "already_reserved")]
    #[case(
        RejectionReason::UserReservationLimitReached,
        ErrorCode::Conflict,
        "user_reservation_limit_reached"
    )]
    #[case(
        RejectionReason::BookStockExhausted,
        ErrorCode::Conflict,
        "book_stock_exhausted"
    )]
    fn rejections_map_to_typed_errors(
        #[case] reason: RejectionReason,
        #[case] code: ErrorCode,
        #[case] name: &str,
    ) {
        let error = Error::from(reason);
        assert_eq!(error.code, code);
        assert_eq!(error.reason(), Some(name));
    }
}
