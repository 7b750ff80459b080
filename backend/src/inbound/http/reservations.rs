//! Reservation API handler.
//!
//! A single endpoint admits or rejects a loan reservation atomically.

use actix_web::{post, web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Error, Reservation};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::ApiResult;

/// Body for `POST /api/v1/reservations`.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    pub book_id: i64,
    pub user_email: String,
}

/// Committed reservation returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
    pub reservation_id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub reserved_at: DateTime<Utc>,
    pub active: bool,
}

impl From<Reservation> for ReservationResponse {
    fn from(value: Reservation) -> Self {
        Self {
            reservation_id: value.id,
            user_id: value.user_id,
            book_id: value.book_id,
            reserved_at: value.reserved_at,
            active: value.active,
        }
    }
}

/// Reserve a book for a user.
#[utoipa::path(
    post,
    path = "/api/v1/reservations",
    request_body = ReservationRequest,
    responses(
        (status = 201, description = "Reservation committed", body = ReservationResponse),
        (status = 400, description = "Malformed request", body = Error),
        (status = 404, description = "Unknown user or book", body = Error),
        (status = 409, description = "Reservation rejected", body = Error),
        (status = 503, description = "Contention did not settle", body = Error)
    ),
    tags = ["reservations"],
    operation_id = "reserveBook"
)]
#[post("/reservations")]
pub async fn reserve(
    state: web::Data<HttpState>,
    payload: web::Json<ReservationRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    if payload.book_id <= 0 {
        return Err(
            Error::invalid_request("book id must be positive").with_reason("invalid_book_id")
        );
    }
    let reservation = state
        .reservations
        .reserve(payload.book_id, &payload.user_email)
        .await?;
    Ok(HttpResponse::Created().json(ReservationResponse::from(reservation)))
}
