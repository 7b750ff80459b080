//! Domain error payload shared by every operation.
//!
//! Business-rule failures are values, not exceptions: each carries a stable
//! machine-readable [`ErrorCode`] category plus an optional `details.reason`
//! string naming the specific rule, so callers branch without parsing
//! message text. Inbound adapters map these to HTTP responses.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::middleware::RequestId;

/// Stable machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or fails validation.
    InvalidRequest,
    /// Credentials, security answer, account state, or password age reject
    /// the caller.
    Unauthorized,
    /// The referenced entity does not exist.
    NotFound,
    /// A business rule rejects the operation (duplicate, exhausted stock,
    /// reservation cap, password reuse).
    Conflict,
    /// A dependency is unavailable or an optimistic retry budget ran out.
    ServiceUnavailable,
    /// An unexpected storage or hashing failure.
    InternalError,
}

/// API error response payload.
///
/// # Examples
/// ```
/// use biblio_backend::domain::{Error, ErrorCode};
///
/// let err = Error::not_found("book not found").with_reason("book_not_found");
/// assert_eq!(err.code, ErrorCode::NotFound);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    /// Stable machine-readable error category.
    #[schema(example = "conflict")]
    pub code: ErrorCode,
    /// Human-readable explanation, free text.
    #[schema(example = "no stock left for this book")]
    pub message: String,
    /// Correlation identifier for tracing this error across systems.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Structured details; rejections carry `{"reason": "<stable_name>"}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl Error {
    /// Create a new error, capturing the in-scope request id when present.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            request_id: RequestId::current().map(|id| id.to_string()),
            details: None,
        }
    }

    /// Attach structured details.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Attach a stable rejection reason under `details.reason`.
    pub fn with_reason(self, reason: &str) -> Self {
        self.with_details(json!({ "reason": reason }))
    }

    /// The stable rejection reason, when one was attached.
    pub fn reason(&self) -> Option<&str> {
        self.details
            .as_ref()
            .and_then(|details| details.get("reason"))
            .and_then(Value::as_str)
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Convenience constructor for [`ErrorCode::ServiceUnavailable`].
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}
