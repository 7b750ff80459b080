//! Account lifecycle service: registration, activation, two-step login,
//! password rotation and profile maintenance.
//!
//! The login check order is fixed and observable through the rejection
//! reasons: unknown email, inactive account, expired password, then hash
//! mismatch. Password rotation enforces a reuse window covering the current
//! hash and the five most recent superseded hashes.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    AccountLifecycle, HasherError, HistoryPersistenceError, LoginChallenge, PasswordHasher,
    PasswordHistoryRepository, QuestionPersistenceError, SecurityQuestionRepository,
    UserPersistenceError, UserRepository,
};
use crate::domain::{
    normalize_security_answer, Error, ProfilePatch, RegisterRequest, SecurityQuestion, User,
};

/// Passwords older than this many weeks must be renewed before login.
pub const PASSWORD_EXPIRY_WEEKS: i64 = 12;

/// Superseded hashes kept for the reuse check.
pub const HISTORY_DEPTH: i64 = 5;

/// Account lifecycle service implementing the driving port.
#[derive(Clone)]
pub struct AccountService<U, Q, P, H> {
    user_repo: Arc<U>,
    question_repo: Arc<Q>,
    history_repo: Arc<P>,
    hasher: Arc<H>,
    clock: Arc<dyn Clock>,
}

impl<U, Q, P, H> AccountService<U, Q, P, H> {
    /// Create a new account service over the given collaborators.
    pub fn new(
        user_repo: Arc<U>,
        question_repo: Arc<Q>,
        history_repo: Arc<P>,
        hasher: Arc<H>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repo,
            question_repo,
            history_repo,
            hasher,
            clock,
        }
    }
}

impl<U, Q, P, H> AccountService<U, Q, P, H>
where
    U: UserRepository,
    Q: SecurityQuestionRepository,
    P: PasswordHistoryRepository,
    H: PasswordHasher,
{
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        self.user_repo
            .find_by_email(email)
            .await
            .map_err(map_user_error)
    }

    async fn required_user_by_email(&self, email: &str) -> Result<User, Error> {
        self.user_by_email(email).await?.ok_or_else(user_not_found)
    }

    async fn required_user_by_id(&self, user_id: i64) -> Result<User, Error> {
        self.user_repo
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(user_not_found)
    }

    async fn question_for(&self, user: &User) -> Result<Option<SecurityQuestion>, Error> {
        let Some(question_id) = user.security_question_id else {
            return Ok(None);
        };
        self.question_repo
            .find_by_id(question_id)
            .await
            .map_err(map_question_error)
    }

    fn password_expired(&self, user: &User) -> bool {
        // A missing timestamp counts as expired.
        user.last_password_change.is_none_or(|changed| {
            self.clock.utc() - changed > Duration::weeks(PASSWORD_EXPIRY_WEEKS)
        })
    }

    async fn reject_reused_password(&self, user: &User, new_password: &str) -> Result<(), Error> {
        let reused = self
            .hasher
            .verify(new_password, &user.password_hash)
            .map_err(map_hasher_error)?;
        if reused {
            return Err(password_reused());
        }
        let recent = self
            .history_repo
            .recent_for_user(user.id, HISTORY_DEPTH)
            .await
            .map_err(map_history_error)?;
        for entry in &recent {
            if self
                .hasher
                .verify(new_password, &entry.password_hash)
                .map_err(map_hasher_error)?
            {
                return Err(password_reused());
            }
        }
        Ok(())
    }

    /// Shared rotation path for `change_password` and `renew_password`.
    async fn rotate_password(
        &self,
        mut user: User,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), Error> {
        if old_password.trim().is_empty() || new_password.trim().is_empty() {
            return Err(
                Error::invalid_request("password must not be blank").with_reason("password_required")
            );
        }
        let old_matches = self
            .hasher
            .verify(old_password, &user.password_hash)
            .map_err(map_hasher_error)?;
        if !old_matches {
            return Err(invalid_credentials());
        }
        self.reject_reused_password(&user, new_password).await?;

        let now = self.clock.utc();
        self.history_repo
            .append(user.id, &user.password_hash, now)
            .await
            .map_err(map_history_error)?;
        self.history_repo
            .prune_to_recent(user.id, HISTORY_DEPTH)
            .await
            .map_err(map_history_error)?;
        user.password_hash = self.hasher.hash(new_password).map_err(map_hasher_error)?;
        user.last_password_change = Some(now);
        self.user_repo.update(&user).await.map_err(map_user_error)?;
        info!(user_id = user.id, "password rotated");
        Ok(())
    }
}

#[async_trait]
impl<U, Q, P, H> AccountLifecycle for AccountService<U, Q, P, H>
where
    U: UserRepository,
    Q: SecurityQuestionRepository,
    P: PasswordHistoryRepository,
    H: PasswordHasher,
{
    async fn register(&self, request: RegisterRequest) -> Result<User, Error> {
        if self.user_by_email(&request.email).await?.is_some() {
            return Err(email_already_exists(&request.email));
        }
        if request.password.trim().is_empty() {
            return Err(
                Error::invalid_request("password must not be blank").with_reason("password_required")
            );
        }
        let Some(question_id) = request.security_question_id else {
            return Err(Error::invalid_request("a security question must be chosen")
                .with_reason("security_question_required"));
        };
        let answer = request
            .security_answer
            .as_deref()
            .map(str::trim)
            .filter(|answer| !answer.is_empty())
            .ok_or_else(|| {
                Error::invalid_request("a security answer must be provided")
                    .with_reason("security_answer_required")
            })?;
        let question = self
            .question_repo
            .find_by_id(question_id)
            .await
            .map_err(map_question_error)?
            .ok_or_else(|| {
                Error::not_found("security question not found")
                    .with_reason("security_question_not_found")
            })?;

        let password_hash = self
            .hasher
            .hash(&request.password)
            .map_err(map_hasher_error)?;
        let answer_hash = self
            .hasher
            .hash(&normalize_security_answer(answer))
            .map_err(map_hasher_error)?;

        // Accounts start inactive; id 0 is a placeholder until the adapter
        // assigns the identity.
        let user = User {
            id: 0,
            firstname: request.firstname,
            lastname: request.lastname,
            email: request.email,
            password_hash,
            role: request.role,
            birthdate: request.birthdate,
            active: false,
            security_question_id: Some(question.id),
            security_answer_hash: Some(answer_hash),
            last_password_change: Some(self.clock.utc()),
        };
        let user = match self.user_repo.insert(&user).await {
            Ok(user) => user,
            Err(UserPersistenceError::DuplicateEmail { email }) => {
                return Err(email_already_exists(&email));
            }
            Err(error) => return Err(map_user_error(error)),
        };
        info!(user_id = user.id, "account registered");
        Ok(user)
    }

    async fn activate(&self, email: &str) -> Result<User, Error> {
        let mut user = self.required_user_by_email(email).await?;
        user.active = true;
        self.user_repo.update(&user).await.map_err(map_user_error)?;
        info!(user_id = user.id, "account activated");
        Ok(user)
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginChallenge, Error> {
        let Some(user) = self.user_by_email(email).await? else {
            return Err(invalid_credentials());
        };
        if !user.active {
            return Err(
                Error::unauthorized("account is not activated").with_reason("account_not_activated")
            );
        }
        if self.password_expired(&user) {
            return Err(
                Error::unauthorized("password has expired and must be renewed")
                    .with_reason("password_expired"),
            );
        }
        let matches = self
            .hasher
            .verify(password, &user.password_hash)
            .map_err(map_hasher_error)?;
        if !matches {
            return Err(invalid_credentials());
        }
        let security_question = self.question_for(&user).await?;
        Ok(LoginChallenge {
            user,
            security_question,
        })
    }

    async fn verify_security_answer(&self, email: &str, answer: &str) -> Result<User, Error> {
        let Some(user) = self.user_by_email(email).await? else {
            return Err(authentication_failed());
        };
        let Some(answer_hash) = user.security_answer_hash.as_deref() else {
            return Err(authentication_failed());
        };
        let matches = self
            .hasher
            .verify(&normalize_security_answer(answer), answer_hash)
            .map_err(map_hasher_error)?;
        if !matches {
            return Err(authentication_failed());
        }
        Ok(user)
    }

    async fn change_password(
        &self,
        user_id: i64,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), Error> {
        let user = self.required_user_by_id(user_id).await?;
        self.rotate_password(user, old_password, new_password).await
    }

    async fn renew_password(
        &self,
        email: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), Error> {
        let user = self.required_user_by_email(email).await?;
        self.rotate_password(user, old_password, new_password).await
    }

    async fn update_profile(&self, user_id: i64, patch: ProfilePatch) -> Result<User, Error> {
        let mut user = self.required_user_by_id(user_id).await?;
        user.apply_patch(patch);
        self.user_repo.update(&user).await.map_err(map_user_error)?;
        Ok(user)
    }

    async fn unsubscribe(&self, email: &str) -> Result<(), Error> {
        let user = self.required_user_by_email(email).await?;
        self.user_repo
            .delete(user.id)
            .await
            .map_err(map_user_error)?;
        info!(user_id = user.id, "account deleted");
        Ok(())
    }
}

fn user_not_found() -> Error {
    Error::not_found("user not found").with_reason("user_not_found")
}

fn email_already_exists(email: &str) -> Error {
    Error::conflict(format!("email already registered: {email}"))
        .with_reason("email_already_exists")
}

fn invalid_credentials() -> Error {
    Error::unauthorized("invalid credentials").with_reason("invalid_credentials")
}

fn authentication_failed() -> Error {
    Error::unauthorized("authentication failed").with_reason("authentication_failed")
}

fn password_reused() -> Error {
    Error::conflict("password was used recently and cannot be reused")
        .with_reason("password_reused")
}

fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::DuplicateEmail { email } => email_already_exists(&email),
    }
}

fn map_question_error(error: QuestionPersistenceError) -> Error {
    match error {
        QuestionPersistenceError::Connection { message } => Error::service_unavailable(format!(
            "security question repository unavailable: {message}"
        )),
        QuestionPersistenceError::Query { message } => {
            Error::internal(format!("security question repository error: {message}"))
        }
    }
}

fn map_history_error(error: HistoryPersistenceError) -> Error {
    match error {
        HistoryPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("password history unavailable: {message}"))
        }
        HistoryPersistenceError::Query { message } => {
            Error::internal(format!("password history error: {message}"))
        }
    }
}

fn map_hasher_error(error: HasherError) -> Error {
    match error {
        HasherError::Hashing { message } => Error::internal(format!("hashing failed: {message}")),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
    use rstest::rstest;

    use super::*;
    use crate::domain::ports::PasswordHistoryEntry;
    use crate::domain::{ErrorCode, DEFAULT_QUESTION_LABELS};

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn local(&self) -> DateTime<Local> {
            self.0.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).single().expect("valid timestamp")
    }

    /// Deterministic stand-in hasher with an inspectable scheme.
    struct FakeHasher;

    impl FakeHasher {
        fn hash_of(plaintext: &str) -> String {
            format!("h:{plaintext}")
        }
    }

    impl PasswordHasher for FakeHasher {
        fn hash(&self, plaintext: &str) -> Result<String, HasherError> {
            Ok(Self::hash_of(plaintext))
        }

        fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HasherError> {
            Ok(hash == Self::hash_of(plaintext))
        }
    }

    #[derive(Default)]
    struct StubUserRepository {
        state: Mutex<Vec<User>>,
    }

    impl StubUserRepository {
        fn with_users(users: Vec<User>) -> Self {
            Self {
                state: Mutex::new(users),
            }
        }

        fn lock(&self) -> std::sync::MutexGuard<'_, Vec<User>> {
            self.state.lock().expect("user state mutex")
        }

        fn stored(&self, id: i64) -> Option<User> {
            self.lock().iter().find(|user| user.id == id).cloned()
        }
    }

    #[async_trait]
    impl UserRepository for StubUserRepository {
        async fn insert(&self, user: &User) -> Result<User, UserPersistenceError> {
            let mut state = self.lock();
            if state.iter().any(|existing| existing.email == user.email) {
                return Err(UserPersistenceError::duplicate_email(&user.email));
            }
            let id = state.iter().map(|u| u.id).max().unwrap_or(0) + 1;
            let mut user = user.clone();
            user.id = id;
            state.push(user.clone());
            Ok(user)
        }

        async fn update(&self, user: &User) -> Result<(), UserPersistenceError> {
            let mut state = self.lock();
            let slot = state
                .iter_mut()
                .find(|existing| existing.id == user.id)
                .ok_or_else(|| UserPersistenceError::query("missing user row"))?;
            *slot = user.clone();
            Ok(())
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserPersistenceError> {
            Ok(self.stored(id))
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserPersistenceError> {
            Ok(self.lock().iter().find(|user| user.email == email).cloned())
        }

        async fn delete(&self, id: i64) -> Result<(), UserPersistenceError> {
            self.lock().retain(|user| user.id != id);
            Ok(())
        }
    }

    struct StubQuestionRepository {
        questions: Vec<SecurityQuestion>,
    }

    impl Default for StubQuestionRepository {
        fn default() -> Self {
            Self {
                questions: DEFAULT_QUESTION_LABELS
                    .iter()
                    .enumerate()
                    .map(|(index, label)| SecurityQuestion {
                        id: index as i64 + 1,
                        label: (*label).to_string(),
                    })
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl SecurityQuestionRepository for StubQuestionRepository {
        async fn count(&self) -> Result<i64, QuestionPersistenceError> {
            Ok(self.questions.len() as i64)
        }

        async fn insert_labels(&self, _labels: &[&str]) -> Result<(), QuestionPersistenceError> {
            unimplemented!("not exercised by account tests")
        }

        async fn find_by_id(
            &self,
            id: i64,
        ) -> Result<Option<SecurityQuestion>, QuestionPersistenceError> {
            Ok(self.questions.iter().find(|q| q.id == id).cloned())
        }

        async fn list(&self) -> Result<Vec<SecurityQuestion>, QuestionPersistenceError> {
            Ok(self.questions.clone())
        }
    }

    #[derive(Default)]
    struct StubHistoryRepository {
        state: Mutex<Vec<PasswordHistoryEntry>>,
    }

    impl StubHistoryRepository {
        fn with_entries(entries: Vec<PasswordHistoryEntry>) -> Self {
            Self {
                state: Mutex::new(entries),
            }
        }

        fn lock(&self) -> std::sync::MutexGuard<'_, Vec<PasswordHistoryEntry>> {
            self.state.lock().expect("history state mutex")
        }
    }

    #[async_trait]
    impl PasswordHistoryRepository for StubHistoryRepository {
        async fn append(
            &self,
            user_id: i64,
            password_hash: &str,
            changed_at: DateTime<Utc>,
        ) -> Result<(), HistoryPersistenceError> {
            let mut state = self.lock();
            let id = state.iter().map(|e| e.id).max().unwrap_or(0) + 1;
            state.push(PasswordHistoryEntry {
                id,
                user_id,
                password_hash: password_hash.to_string(),
                changed_at,
            });
            Ok(())
        }

        async fn recent_for_user(
            &self,
            user_id: i64,
            limit: i64,
        ) -> Result<Vec<PasswordHistoryEntry>, HistoryPersistenceError> {
            let mut entries: Vec<_> = self
                .lock()
                .iter()
                .filter(|entry| entry.user_id == user_id)
                .cloned()
                .collect();
            entries.sort_by(|a, b| b.changed_at.cmp(&a.changed_at).then(b.id.cmp(&a.id)));
            entries.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
            Ok(entries)
        }

        async fn prune_to_recent(
            &self,
            user_id: i64,
            keep: i64,
        ) -> Result<(), HistoryPersistenceError> {
            let kept: Vec<i64> = self
                .recent_for_user(user_id, keep)
                .await?
                .iter()
                .map(|entry| entry.id)
                .collect();
            self.lock()
                .retain(|entry| entry.user_id != user_id || kept.contains(&entry.id));
            Ok(())
        }
    }

    type TestService =
        AccountService<StubUserRepository, StubQuestionRepository, StubHistoryRepository, FakeHasher>;

    struct Harness {
        service: TestService,
        users: Arc<StubUserRepository>,
        history: Arc<StubHistoryRepository>,
    }

    fn harness(users: Vec<User>, history: Vec<PasswordHistoryEntry>) -> Harness {
        let users = Arc::new(StubUserRepository::with_users(users));
        let history = Arc::new(StubHistoryRepository::with_entries(history));
        let service = AccountService::new(
            Arc::clone(&users),
            Arc::new(StubQuestionRepository::default()),
            Arc::clone(&history),
            Arc::new(FakeHasher),
            Arc::new(FixedClock(now())),
        );
        Harness {
            service,
            users,
            history,
        }
    }

    fn active_user(id: i64, email: &str, password: &str) -> User {
        User {
            id,
            firstname: "Ada".into(),
            lastname: "Lovelace".into(),
            email: email.into(),
            password_hash: FakeHasher::hash_of(password),
            role: "U".into(),
            birthdate: NaiveDate::from_ymd_opt(1815, 12, 10),
            active: true,
            security_question_id: Some(1),
            security_answer_hash: Some(FakeHasher::hash_of("minou")),
            last_password_change: Some(now() - Duration::weeks(1)),
        }
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            firstname: "Ada".into(),
            lastname: "Lovelace".into(),
            email: email.into(),
            password: "s3cret!".into(),
            role: "U".into(),
            birthdate: NaiveDate::from_ymd_opt(1815, 12, 10),
            security_question_id: Some(1),
            security_answer: Some(" Minou ".into()),
        }
    }

    #[tokio::test]
    async fn register_hashes_and_starts_inactive() {
        let h = harness(vec![], vec![]);
        let user = h
            .service
            .register(register_request("ada@example.org"))
            .await
            .expect("registered");
        assert!(user.id > 0);
        assert!(!user.active);
        assert_eq!(user.password_hash, FakeHasher::hash_of("s3cret!"));
        // The answer is normalized before hashing.
        assert_eq!(
            user.security_answer_hash.as_deref(),
            Some(FakeHasher::hash_of("minou").as_str())
        );
        assert_eq!(user.last_password_change, Some(now()));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let h = harness(vec![active_user(1, "ada@example.org", "pw")], vec![]);
        let error = h
            .service
            .register(register_request("ada@example.org"))
            .await
            .expect_err("duplicate");
        assert_eq!(error.code, ErrorCode::Conflict);
        assert_eq!(error.reason(), Some("email_already_exists"));
    }

    #[rstest]
    #[case::no_question(
        RegisterRequest { security_question_id: None, ..register_request("ada@example.org") },
        ErrorCode::InvalidRequest,
        "security_question_required"
    )]
    #[case::no_answer(
        RegisterRequest { security_answer: None, ..register_request("ada@example.org") },
        ErrorCode::InvalidRequest,
        "security_answer_required"
    )]
    #[case::blank_answer(
        RegisterRequest { security_answer: Some("  ".into()), ..register_request("ada@example.org") },
        ErrorCode::InvalidRequest,
        "security_answer_required"
    )]
    #[case::blank_password(
        RegisterRequest { password: " ".into(), ..register_request("ada@example.org") },
        ErrorCode::InvalidRequest,
        "password_required"
    )]
    #[case::unknown_question(
        RegisterRequest { security_question_id: Some(99), ..register_request("ada@example.org") },
        ErrorCode::NotFound,
        "security_question_not_found"
    )]
    #[tokio::test]
    async fn register_validates_the_payload(
        #[case] request: RegisterRequest,
        #[case] code: ErrorCode,
        #[case] reason: &str,
    ) {
        let h = harness(vec![], vec![]);
        let error = h.service.register(request).await.expect_err("invalid");
        assert_eq!(error.code, code);
        assert_eq!(error.reason(), Some(reason));
    }

    #[tokio::test]
    async fn activate_flips_and_persists_the_flag() {
        let mut user = active_user(1, "ada@example.org", "pw");
        user.active = false;
        let h = harness(vec![user], vec![]);
        let activated = h
            .service
            .activate("ada@example.org")
            .await
            .expect("activated");
        assert!(activated.active);
        assert!(h.users.stored(1).expect("stored").active);
    }

    #[tokio::test]
    async fn activate_unknown_email_is_not_found() {
        let h = harness(vec![], vec![]);
        let error = h.service.activate("ghost@example.org").await.expect_err("missing");
        assert_eq!(error.code, ErrorCode::NotFound);
        assert_eq!(error.reason(), Some("user_not_found"));
    }

    #[tokio::test]
    async fn login_returns_the_security_question() {
        let h = harness(vec![active_user(1, "ada@example.org", "pw")], vec![]);
        let challenge = h
            .service
            .login("ada@example.org", "pw")
            .await
            .expect("challenge");
        assert_eq!(challenge.user.id, 1);
        let question = challenge.security_question.expect("question");
        assert_eq!(question.id, 1);
        assert_eq!(question.label, DEFAULT_QUESTION_LABELS[0]);
    }

    fn expired_user() -> User {
        User {
            last_password_change: Some(now() - Duration::weeks(PASSWORD_EXPIRY_WEEKS) - Duration::days(1)),
            ..active_user(1, "ada@example.org", "pw")
        }
    }

    #[rstest]
    #[case::unknown_email(active_user(1, "other@example.org", "pw"), "pw", "invalid_credentials")]
    #[case::not_activated(
        User { active: false, ..active_user(1, "ada@example.org", "pw") },
        "pw",
        "account_not_activated"
    )]
    #[case::expired(expired_user(), "pw", "password_expired")]
    #[case::missing_timestamp(
        User { last_password_change: None, ..active_user(1, "ada@example.org", "pw") },
        "pw",
        "password_expired"
    )]
    #[case::wrong_password(active_user(1, "ada@example.org", "pw"), "nope", "invalid_credentials")]
    #[tokio::test]
    async fn login_rejects_in_fixed_order(
        #[case] user: User,
        #[case] password: &str,
        #[case] reason: &str,
    ) {
        let h = harness(vec![user], vec![]);
        let error = h
            .service
            .login("ada@example.org", password)
            .await
            .expect_err("rejected");
        assert_eq!(error.code, ErrorCode::Unauthorized);
        assert_eq!(error.reason(), Some(reason));
    }

    #[tokio::test]
    async fn inactive_account_reports_before_expiry_and_password() {
        let user = User {
            active: false,
            last_password_change: None,
            ..active_user(1, "ada@example.org", "pw")
        };
        let h = harness(vec![user], vec![]);
        let error = h
            .service
            .login("ada@example.org", "wrong")
            .await
            .expect_err("rejected");
        assert_eq!(error.reason(), Some("account_not_activated"));
    }

    #[rstest]
    #[case::exact("minou", true)]
    #[case::needs_normalization("  MINOU ", true)]
    #[case::mismatch("medor", false)]
    #[tokio::test]
    async fn verify_security_answer_normalizes(#[case] answer: &str, #[case] ok: bool) {
        let h = harness(vec![active_user(1, "ada@example.org", "pw")], vec![]);
        let result = h.service.verify_security_answer("ada@example.org", answer).await;
        if ok {
            assert_eq!(result.expect("verified").id, 1);
        } else {
            let error = result.expect_err("rejected");
            assert_eq!(error.code, ErrorCode::Unauthorized);
            assert_eq!(error.reason(), Some("authentication_failed"));
        }
    }

    #[tokio::test]
    async fn verify_security_answer_without_stored_hash_fails() {
        let user = User {
            security_answer_hash: None,
            ..active_user(1, "ada@example.org", "pw")
        };
        let h = harness(vec![user], vec![]);
        let error = h
            .service
            .verify_security_answer("ada@example.org", "minou")
            .await
            .expect_err("rejected");
        assert_eq!(error.reason(), Some("authentication_failed"));
    }

    #[tokio::test]
    async fn change_password_archives_the_old_hash() {
        let h = harness(vec![active_user(1, "ada@example.org", "pw")], vec![]);
        h.service
            .change_password(1, "pw", "fresh-one")
            .await
            .expect("rotated");
        let stored = h.users.stored(1).expect("stored");
        assert_eq!(stored.password_hash, FakeHasher::hash_of("fresh-one"));
        assert_eq!(stored.last_password_change, Some(now()));
        let history = h.history.lock();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].password_hash, FakeHasher::hash_of("pw"));
    }

    fn history_entry(id: i64, user_id: i64, password: &str, weeks_ago: i64) -> PasswordHistoryEntry {
        PasswordHistoryEntry {
            id,
            user_id,
            password_hash: FakeHasher::hash_of(password),
            changed_at: now() - Duration::weeks(weeks_ago),
        }
    }

    #[rstest]
    #[case::current("pw")]
    #[case::recent_history("older-one")]
    #[tokio::test]
    async fn password_reuse_is_rejected(#[case] new_password: &str) {
        let h = harness(
            vec![active_user(1, "ada@example.org", "pw")],
            vec![history_entry(1, 1, "older-one", 4)],
        );
        let error = h
            .service
            .change_password(1, "pw", new_password)
            .await
            .expect_err("reuse");
        assert_eq!(error.code, ErrorCode::Conflict);
        assert_eq!(error.reason(), Some("password_reused"));
    }

    #[tokio::test]
    async fn reuse_window_only_covers_the_five_newest_hashes() {
        // Six history entries; the oldest fell out of the window and its
        // password may return.
        let history: Vec<_> = (1..=6)
            .map(|i| history_entry(i, 1, &format!("pw-{i}"), 20 - i))
            .collect();
        let h = harness(vec![active_user(1, "ada@example.org", "pw")], history);
        assert!(h.service.change_password(1, "pw", "pw-1").await.is_ok());
        let error = harness(
            vec![active_user(1, "ada@example.org", "pw")],
            (1..=6)
                .map(|i| history_entry(i, 1, &format!("pw-{i}"), 20 - i))
                .collect(),
        )
        .service
        .change_password(1, "pw", "pw-6")
        .await
        .expect_err("still in window");
        assert_eq!(error.reason(), Some("password_reused"));
    }

    #[tokio::test]
    async fn history_is_pruned_to_the_window() {
        let history: Vec<_> = (1..=5)
            .map(|i| history_entry(i, 1, &format!("pw-{i}"), 10 - i))
            .collect();
        let h = harness(vec![active_user(1, "ada@example.org", "pw")], history);
        h.service
            .change_password(1, "pw", "brand-new")
            .await
            .expect("rotated");
        let entries = h.history.lock();
        assert_eq!(entries.len(), 5);
        // The newly archived hash is present, the oldest entry dropped.
        assert!(entries
            .iter()
            .any(|entry| entry.password_hash == FakeHasher::hash_of("pw")));
        assert!(!entries
            .iter()
            .any(|entry| entry.password_hash == FakeHasher::hash_of("pw-1")));
    }

    #[rstest]
    #[case::wrong_old("nope", "fresh-one", ErrorCode::Unauthorized, "invalid_credentials")]
    #[case::blank_new("pw", "  ", ErrorCode::InvalidRequest, "password_required")]
    #[case::blank_old("", "fresh-one", ErrorCode::InvalidRequest, "password_required")]
    #[tokio::test]
    async fn rotation_validates_inputs(
        #[case] old_password: &str,
        #[case] new_password: &str,
        #[case] code: ErrorCode,
        #[case] reason: &str,
    ) {
        let h = harness(vec![active_user(1, "ada@example.org", "pw")], vec![]);
        let error = h
            .service
            .change_password(1, old_password, new_password)
            .await
            .expect_err("rejected");
        assert_eq!(error.code, code);
        assert_eq!(error.reason(), Some(reason));
        assert!(h.history.lock().is_empty());
    }

    #[tokio::test]
    async fn renew_password_rotates_by_email() {
        let h = harness(vec![expired_user()], vec![]);
        h.service
            .renew_password("ada@example.org", "pw", "fresh-one")
            .await
            .expect("renewed");
        let stored = h.users.stored(1).expect("stored");
        assert_eq!(stored.password_hash, FakeHasher::hash_of("fresh-one"));
        // Renewal restores login.
        assert!(h.service.login("ada@example.org", "fresh-one").await.is_ok());
    }

    #[tokio::test]
    async fn update_profile_applies_the_allowlist() {
        let h = harness(vec![active_user(1, "ada@example.org", "pw")], vec![]);
        let updated = h
            .service
            .update_profile(
                1,
                ProfilePatch {
                    firstname: Some("Augusta".into()),
                    active: Some(false),
                    ..ProfilePatch::default()
                },
            )
            .await
            .expect("patched");
        assert_eq!(updated.firstname, "Augusta");
        assert!(!updated.active);
        assert_eq!(updated.email, "ada@example.org");
        assert_eq!(h.users.stored(1).expect("stored").firstname, "Augusta");
    }

    #[tokio::test]
    async fn unsubscribe_deletes_the_account() {
        let h = harness(vec![active_user(1, "ada@example.org", "pw")], vec![]);
        h.service
            .unsubscribe("ada@example.org")
            .await
            .expect("deleted");
        assert!(h.users.stored(1).is_none());
        let error = h
            .service
            .unsubscribe("ada@example.org")
            .await
            .expect_err("already gone");
        assert_eq!(error.code, ErrorCode::NotFound);
    }
}
