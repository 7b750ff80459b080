//! Internal Diesel row structs for database operations.
//!
//! Implementation details of the persistence layer; never exposed to the
//! domain. They exist solely to satisfy Diesel's type requirements for
//! queries and mutations.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

use crate::domain::ports::PasswordHistoryEntry;
use crate::domain::{Book, Reservation, SecurityQuestion, User};

use super::schema::{books, password_history, reservations, security_questions, users};

/// Row struct for reading from the security_questions table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = security_questions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SecurityQuestionRow {
    pub id: i64,
    pub label: String,
}

/// Insertable struct for seeding security questions.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = security_questions)]
pub(crate) struct NewSecurityQuestionRow<'a> {
    pub label: &'a str,
}

impl From<SecurityQuestionRow> for SecurityQuestion {
    fn from(row: SecurityQuestionRow) -> Self {
        Self {
            id: row.id,
            label: row.label,
        }
    }
}

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub birthdate: Option<NaiveDate>,
    pub active: bool,
    pub security_question_id: Option<i64>,
    pub security_answer_hash: Option<String>,
    pub last_password_change: Option<DateTime<Utc>>,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub firstname: &'a str,
    pub lastname: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub birthdate: Option<NaiveDate>,
    pub active: bool,
    pub security_question_id: Option<i64>,
    pub security_answer_hash: Option<&'a str>,
    pub last_password_change: Option<DateTime<Utc>>,
}

/// Changeset struct for updating existing user records.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserUpdate<'a> {
    pub firstname: &'a str,
    pub lastname: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub birthdate: Option<NaiveDate>,
    pub active: bool,
    pub security_question_id: Option<i64>,
    pub security_answer_hash: Option<&'a str>,
    pub last_password_change: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            firstname: row.firstname,
            lastname: row.lastname,
            email: row.email,
            password_hash: row.password_hash,
            role: row.role,
            birthdate: row.birthdate,
            active: row.active,
            security_question_id: row.security_question_id,
            security_answer_hash: row.security_answer_hash,
            last_password_change: row.last_password_change,
        }
    }
}

/// Row struct for reading from the books table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = books)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BookRow {
    pub id: i64,
    pub isbn: String,
    pub title: String,
    pub description: Option<String>,
    pub editor: Option<String>,
    pub category: Option<String>,
    pub language: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub nb_pages: i32,
    pub stock: i32,
    pub published: bool,
}

/// Insertable struct for creating new book records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = books)]
pub(crate) struct NewBookRow<'a> {
    pub isbn: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub editor: Option<&'a str>,
    pub category: Option<&'a str>,
    pub language: Option<&'a str>,
    pub publication_date: Option<NaiveDate>,
    pub nb_pages: i32,
    pub stock: i32,
    pub published: bool,
}

/// Changeset struct for updating existing book records.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = books)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct BookUpdate<'a> {
    pub isbn: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub editor: Option<&'a str>,
    pub category: Option<&'a str>,
    pub language: Option<&'a str>,
    pub publication_date: Option<NaiveDate>,
    pub nb_pages: i32,
    pub stock: i32,
    pub published: bool,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Self {
            id: row.id,
            isbn: row.isbn,
            title: row.title,
            description: row.description,
            editor: row.editor,
            category: row.category,
            language: row.language,
            publication_date: row.publication_date,
            nb_pages: row.nb_pages,
            stock: row.stock,
            published: row.published,
        }
    }
}

/// Row struct for reading from the password_history table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = password_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PasswordHistoryRow {
    pub id: i64,
    pub user_id: i64,
    pub password_hash: String,
    pub changed_at: DateTime<Utc>,
}

/// Insertable struct for archiving a superseded password hash.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = password_history)]
pub(crate) struct NewPasswordHistoryRow<'a> {
    pub user_id: i64,
    pub password_hash: &'a str,
    pub changed_at: DateTime<Utc>,
}

impl From<PasswordHistoryRow> for PasswordHistoryEntry {
    fn from(row: PasswordHistoryRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            password_hash: row.password_hash,
            changed_at: row.changed_at,
        }
    }
}

/// Row struct for reading from the reservations table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = reservations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ReservationRow {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub reserved_at: DateTime<Utc>,
    pub active: bool,
}

/// Insertable struct for creating new reservation records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reservations)]
pub(crate) struct NewReservationRow {
    pub user_id: i64,
    pub book_id: i64,
    pub reserved_at: DateTime<Utc>,
    pub active: bool,
}

impl From<ReservationRow> for Reservation {
    fn from(row: ReservationRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            book_id: row.book_id,
            reserved_at: row.reserved_at,
            active: row.active,
        }
    }
}
