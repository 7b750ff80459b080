//! Account API handlers.
//!
//! ```text
//! POST   /api/v1/users/register
//! POST   /api/v1/users/{email}/activate
//! POST   /api/v1/users/login
//! POST   /api/v1/users/verify-answer
//! PUT    /api/v1/users/{id}/password
//! PUT    /api/v1/users/{email}/password/renew
//! PATCH  /api/v1/users/{id}
//! DELETE /api/v1/users/{email}
//! ```

use actix_web::{delete, patch, post, put, web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Error, ProfilePatch, RegisterRequest, SecurityQuestion, User};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::ApiResult;

/// Registration body for `POST /api/v1/users/register`.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub password: String,
    /// Defaults to `USER` when absent.
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub birthdate: Option<NaiveDate>,
    pub security_question_id: Option<i64>,
    pub security_answer: Option<String>,
}

impl From<RegisterUserRequest> for RegisterRequest {
    fn from(value: RegisterUserRequest) -> Self {
        Self {
            firstname: value.firstname,
            lastname: value.lastname,
            email: value.email,
            password: value.password,
            role: value.role.unwrap_or_else(|| "USER".to_string()),
            birthdate: value.birthdate,
            security_question_id: value.security_question_id,
            security_answer: value.security_answer,
        }
    }
}

/// Credentials for the first login step.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// First-step login response carrying the challenge question.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: User,
    pub security_question: Option<SecurityQuestion>,
}

/// Body for the second login step.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyAnswerRequest {
    pub email: String,
    pub answer: String,
}

/// Body for both password rotation endpoints.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChangeRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Partial profile update; email and password cannot be changed here.
#[derive(Debug, Clone, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatchRequest {
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub birthdate: Option<NaiveDate>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl From<ProfilePatchRequest> for ProfilePatch {
    fn from(value: ProfilePatchRequest) -> Self {
        Self {
            firstname: value.firstname,
            lastname: value.lastname,
            role: value.role,
            birthdate: value.birthdate,
            active: value.active,
        }
    }
}

/// Register a new, inactive account.
#[utoipa::path(
    post,
    path = "/api/v1/users/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Account created", body = User),
        (status = 400, description = "Invalid payload", body = Error),
        (status = 404, description = "Unknown security question", body = Error),
        (status = 409, description = "Email already registered", body = Error)
    ),
    tags = ["users"],
    operation_id = "registerUser"
)]
#[post("/users/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterUserRequest>,
) -> ApiResult<HttpResponse> {
    let user = state.accounts.register(payload.into_inner().into()).await?;
    Ok(HttpResponse::Created().json(user))
}

/// Activate an account so it can log in.
#[utoipa::path(
    post,
    path = "/api/v1/users/{email}/activate",
    params(("email" = String, Path, description = "Account email")),
    responses(
        (status = 200, description = "Account activated", body = User),
        (status = 404, description = "Unknown account", body = Error)
    ),
    tags = ["users"],
    operation_id = "activateUser"
)]
#[post("/users/{email}/activate")]
pub async fn activate(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<User>> {
    Ok(web::Json(state.accounts.activate(&path.into_inner()).await?))
}

/// First login step: credentials in, security question out.
#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Challenge issued", body = LoginResponse),
        (status = 401, description = "Rejected credentials or account state", body = Error)
    ),
    tags = ["users"],
    operation_id = "login"
)]
#[post("/users/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    let payload = payload.into_inner();
    let challenge = state.accounts.login(&payload.email, &payload.password).await?;
    Ok(web::Json(LoginResponse {
        user: challenge.user,
        security_question: challenge.security_question,
    }))
}

/// Second login step: check the security answer.
#[utoipa::path(
    post,
    path = "/api/v1/users/verify-answer",
    request_body = VerifyAnswerRequest,
    responses(
        (status = 200, description = "Answer accepted", body = User),
        (status = 401, description = "Answer rejected", body = Error)
    ),
    tags = ["users"],
    operation_id = "verifySecurityAnswer"
)]
#[post("/users/verify-answer")]
pub async fn verify_answer(
    state: web::Data<HttpState>,
    payload: web::Json<VerifyAnswerRequest>,
) -> ApiResult<web::Json<User>> {
    let payload = payload.into_inner();
    let user = state
        .accounts
        .verify_security_answer(&payload.email, &payload.answer)
        .await?;
    Ok(web::Json(user))
}

/// Rotate the password of an authenticated user.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/password",
    params(("id" = i64, Path, description = "User identifier")),
    request_body = PasswordChangeRequest,
    responses(
        (status = 204, description = "Password rotated"),
        (status = 400, description = "Blank password", body = Error),
        (status = 401, description = "Old password rejected", body = Error),
        (status = 404, description = "Unknown user", body = Error),
        (status = 409, description = "Password reused", body = Error)
    ),
    tags = ["users"],
    operation_id = "changePassword"
)]
#[put("/users/{id}/password")]
pub async fn change_password(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
    payload: web::Json<PasswordChangeRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    state
        .accounts
        .change_password(path.into_inner(), &payload.old_password, &payload.new_password)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Renew an expired password by email.
#[utoipa::path(
    put,
    path = "/api/v1/users/{email}/password/renew",
    params(("email" = String, Path, description = "Account email")),
    request_body = PasswordChangeRequest,
    responses(
        (status = 204, description = "Password renewed"),
        (status = 400, description = "Blank password", body = Error),
        (status = 401, description = "Old password rejected", body = Error),
        (status = 404, description = "Unknown account", body = Error),
        (status = 409, description = "Password reused", body = Error)
    ),
    tags = ["users"],
    operation_id = "renewPassword"
)]
#[put("/users/{email}/password/renew")]
pub async fn renew_password(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<PasswordChangeRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    state
        .accounts
        .renew_password(&path.into_inner(), &payload.old_password, &payload.new_password)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Patch profile fields.
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User identifier")),
    request_body = ProfilePatchRequest,
    responses(
        (status = 200, description = "Profile updated", body = User),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateProfile"
)]
#[patch("/users/{id}")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
    payload: web::Json<ProfilePatchRequest>,
) -> ApiResult<web::Json<User>> {
    let user = state
        .accounts
        .update_profile(path.into_inner(), payload.into_inner().into())
        .await?;
    Ok(web::Json(user))
}

/// Delete an account and everything attached to it.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{email}",
    params(("email" = String, Path, description = "Account email")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 404, description = "Unknown account", body = Error)
    ),
    tags = ["users"],
    operation_id = "unsubscribe"
)]
#[delete("/users/{email}")]
pub async fn unsubscribe(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    state.accounts.unsubscribe(&path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
