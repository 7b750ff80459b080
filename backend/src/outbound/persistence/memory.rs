//! In-memory implementation of every persistence port.
//!
//! Backs handler tests and `DATABASE_URL`-less development runs. A single
//! mutex guards the whole store, which makes the guarded reservation insert
//! trivially atomic: the re-check and the insert happen under one lock.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::ports::{
    AdmissionLimits, BookPersistenceError, BookRepository, GuardedInsert,
    HistoryPersistenceError, PasswordHistoryEntry, PasswordHistoryRepository,
    QuestionPersistenceError, ReservationPersistenceError, ReservationRepository,
    SecurityQuestionRepository, UserPersistenceError, UserRepository,
};
use crate::domain::{
    Book, BookDraft, RejectionReason, Reservation, ReservationDraft, SecurityQuestion, User,
};

#[derive(Debug, Default)]
struct StoreState {
    users: Vec<User>,
    books: Vec<Book>,
    questions: Vec<SecurityQuestion>,
    history: Vec<PasswordHistoryEntry>,
    reservations: Vec<Reservation>,
    next_user_id: i64,
    next_book_id: i64,
    next_question_id: i64,
    next_history_id: i64,
    next_reservation_id: i64,
}

impl StoreState {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }
}

/// Shared in-memory store implementing all persistence ports.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        // A poisoned mutex means a prior panic mid-write; the store state
        // is still structurally sound for tests, so recover the guard.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert(&self, user: &User) -> Result<User, UserPersistenceError> {
        let mut state = self.lock();
        if state
            .users
            .iter()
            .any(|existing| existing.email == user.email)
        {
            return Err(UserPersistenceError::duplicate_email(&user.email));
        }
        let id = StoreState::next_id(&mut state.next_user_id);
        let mut user = user.clone();
        user.id = id;
        state.users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut state = self.lock();
        let slot = state
            .users
            .iter_mut()
            .find(|existing| existing.id == user.id)
            .ok_or_else(|| UserPersistenceError::query("no such user row"))?;
        *slot = user.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.lock().users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn delete(&self, id: i64) -> Result<(), UserPersistenceError> {
        let mut state = self.lock();
        state.users.retain(|user| user.id != id);
        // Mirrors the schema's ON DELETE CASCADE.
        state.history.retain(|entry| entry.user_id != id);
        state.reservations.retain(|r| r.user_id != id);
        Ok(())
    }
}

#[async_trait]
impl BookRepository for InMemoryStore {
    async fn insert(&self, draft: &BookDraft) -> Result<Book, BookPersistenceError> {
        let mut state = self.lock();
        if state
            .books
            .iter()
            .any(|book| book.isbn.eq_ignore_ascii_case(&draft.isbn))
        {
            return Err(BookPersistenceError::duplicate_isbn(&draft.isbn));
        }
        let id = StoreState::next_id(&mut state.next_book_id);
        let book = draft.clone().into_book(id);
        state.books.push(book.clone());
        Ok(book)
    }

    async fn update(&self, book: &Book) -> Result<(), BookPersistenceError> {
        let mut state = self.lock();
        if state
            .books
            .iter()
            .any(|other| other.id != book.id && other.isbn.eq_ignore_ascii_case(&book.isbn))
        {
            return Err(BookPersistenceError::duplicate_isbn(&book.isbn));
        }
        let slot = state
            .books
            .iter_mut()
            .find(|existing| existing.id == book.id)
            .ok_or_else(|| BookPersistenceError::query("no such book row"))?;
        *slot = book.clone();
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), BookPersistenceError> {
        let mut state = self.lock();
        state.books.retain(|book| book.id != id);
        state.reservations.retain(|r| r.book_id != id);
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, BookPersistenceError> {
        Ok(self.lock().books.iter().find(|book| book.id == id).cloned())
    }

    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>, BookPersistenceError> {
        Ok(self
            .lock()
            .books
            .iter()
            .find(|book| book.isbn.eq_ignore_ascii_case(isbn))
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Book>, BookPersistenceError> {
        Ok(self.lock().books.clone())
    }

    async fn find_by_published(&self, published: bool) -> Result<Vec<Book>, BookPersistenceError> {
        Ok(self
            .lock()
            .books
            .iter()
            .filter(|book| book.published == published)
            .cloned()
            .collect())
    }

    async fn find_by_title(&self, title: &str) -> Result<Vec<Book>, BookPersistenceError> {
        Ok(self
            .lock()
            .books
            .iter()
            .filter(|book| book.title.to_lowercase() == title.to_lowercase())
            .cloned()
            .collect())
    }

    async fn find_by_title_contains(
        &self,
        text: &str,
    ) -> Result<Vec<Book>, BookPersistenceError> {
        Ok(self
            .lock()
            .books
            .iter()
            .filter(|book| contains_ignore_case(&book.title, text))
            .cloned()
            .collect())
    }

    async fn find_by_text(&self, text: &str) -> Result<Vec<Book>, BookPersistenceError> {
        Ok(self
            .lock()
            .books
            .iter()
            .filter(|book| {
                contains_ignore_case(&book.title, text)
                    || book
                        .description
                        .as_deref()
                        .is_some_and(|d| contains_ignore_case(d, text))
            })
            .cloned()
            .collect())
    }

    async fn find_by_publication_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Book>, BookPersistenceError> {
        Ok(self
            .lock()
            .books
            .iter()
            .filter(|book| {
                book.publication_date
                    .is_some_and(|date| date >= start && date <= end)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SecurityQuestionRepository for InMemoryStore {
    async fn count(&self) -> Result<i64, QuestionPersistenceError> {
        Ok(self.lock().questions.len() as i64)
    }

    async fn insert_labels(&self, labels: &[&str]) -> Result<(), QuestionPersistenceError> {
        let mut state = self.lock();
        for label in labels {
            let id = StoreState::next_id(&mut state.next_question_id);
            state.questions.push(SecurityQuestion {
                id,
                label: (*label).to_string(),
            });
        }
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: i64,
    ) -> Result<Option<SecurityQuestion>, QuestionPersistenceError> {
        Ok(self
            .lock()
            .questions
            .iter()
            .find(|question| question.id == id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<SecurityQuestion>, QuestionPersistenceError> {
        Ok(self.lock().questions.clone())
    }
}

#[async_trait]
impl PasswordHistoryRepository for InMemoryStore {
    async fn append(
        &self,
        user_id: i64,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<(), HistoryPersistenceError> {
        let mut state = self.lock();
        let id = StoreState::next_id(&mut state.next_history_id);
        state.history.push(PasswordHistoryEntry {
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
            .history
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
            .history
            .retain(|entry| entry.user_id != user_id || kept.contains(&entry.id));
        Ok(())
    }
}

#[async_trait]
impl ReservationRepository for InMemoryStore {
    async fn exists_active(
        &self,
        user_id: i64,
        book_id: i64,
    ) -> Result<bool, ReservationPersistenceError> {
        Ok(self
            .lock()
            .reservations
            .iter()
            .any(|r| r.user_id == user_id && r.book_id == book_id && r.active))
    }

    async fn count_active_for_user(
        &self,
        user_id: i64,
    ) -> Result<i64, ReservationPersistenceError> {
        Ok(self
            .lock()
            .reservations
            .iter()
            .filter(|r| r.user_id == user_id && r.active)
            .count() as i64)
    }

    async fn count_active_for_book(
        &self,
        book_id: i64,
    ) -> Result<i64, ReservationPersistenceError> {
        Ok(self
            .lock()
            .reservations
            .iter()
            .filter(|r| r.book_id == book_id && r.active)
            .count() as i64)
    }

    async fn insert_active_guarded(
        &self,
        draft: &ReservationDraft,
        limits: AdmissionLimits,
    ) -> Result<GuardedInsert, ReservationPersistenceError> {
        let mut state = self.lock();
        if !state.users.iter().any(|user| user.id == draft.user_id) {
            return Ok(GuardedInsert::Rejected(RejectionReason::UserNotFound));
        }
        if !state.books.iter().any(|book| book.id == draft.book_id) {
            return Ok(GuardedInsert::Rejected(RejectionReason::BookNotFound));
        }
        if state
            .reservations
            .iter()
            .any(|r| r.user_id == draft.user_id && r.book_id == draft.book_id && r.active)
        {
            return Ok(GuardedInsert::Rejected(RejectionReason::AlreadyReserved));
        }
        let user_active = state
            .reservations
            .iter()
            .filter(|r| r.user_id == draft.user_id && r.active)
            .count() as i64;
        if user_active >= limits.max_active_per_user {
            return Ok(GuardedInsert::Rejected(
                RejectionReason::UserReservationLimitReached,
            ));
        }
        let book_active = state
            .reservations
            .iter()
            .filter(|r| r.book_id == draft.book_id && r.active)
            .count() as i64;
        if book_active >= i64::from(limits.book_stock) {
            return Ok(GuardedInsert::Rejected(RejectionReason::BookStockExhausted));
        }
        let id = StoreState::next_id(&mut state.next_reservation_id);
        let reservation = draft.clone().into_reservation(id);
        state.reservations.push(reservation.clone());
        Ok(GuardedInsert::Committed(reservation))
    }
}
