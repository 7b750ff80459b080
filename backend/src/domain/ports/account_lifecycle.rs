//! Driving port for account lifecycle operations.

use async_trait::async_trait;

use crate::domain::{Error, ProfilePatch, RegisterRequest, SecurityQuestion, User};

/// First-step login result: the authenticated user plus the security
/// question the caller must answer to finish the challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginChallenge {
    pub user: User,
    /// Absent when the account was registered without a question.
    pub security_question: Option<SecurityQuestion>,
}

/// Registration, activation, two-step login and account maintenance.
#[async_trait]
pub trait AccountLifecycle: Send + Sync {
    /// Register a new, inactive account.
    async fn register(&self, request: RegisterRequest) -> Result<User, Error>;

    /// Flip the account identified by email to active.
    async fn activate(&self, email: &str) -> Result<User, Error>;

    /// First login step: verify credentials and return the security
    /// question to answer.
    async fn login(&self, email: &str, password: &str) -> Result<LoginChallenge, Error>;

    /// Second login step: check the stored security answer.
    async fn verify_security_answer(&self, email: &str, answer: &str) -> Result<User, Error>;

    /// Rotate the password of an authenticated user, enforcing the reuse
    /// window.
    async fn change_password(
        &self,
        user_id: i64,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), Error>;

    /// Rotate an expired password by email, enforcing the reuse window.
    async fn renew_password(
        &self,
        email: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), Error>;

    /// Apply a partial profile update; email and password never change here.
    async fn update_profile(&self, user_id: i64, patch: ProfilePatch) -> Result<User, Error>;

    /// Permanently delete the account identified by email.
    async fn unsubscribe(&self, email: &str) -> Result<(), Error>;
}
