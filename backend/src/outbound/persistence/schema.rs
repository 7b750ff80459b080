//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the migrations exactly; Diesel uses them for
//! compile-time query validation. Regenerate with `diesel print-schema` when
//! the migrations change.

diesel::table! {
    /// Fixed security question reference data, seeded at startup.
    security_questions (id) {
        id -> Int8,
        label -> Varchar,
    }
}

diesel::table! {
    /// Registered user accounts.
    users (id) {
        id -> Int8,
        firstname -> Varchar,
        lastname -> Varchar,
        /// Unique email address, the natural login key.
        email -> Varchar,
        /// PHC-string hash of the current password.
        password_hash -> Varchar,
        role -> Varchar,
        birthdate -> Nullable<Date>,
        active -> Bool,
        security_question_id -> Nullable<Int8>,
        security_answer_hash -> Nullable<Varchar>,
        last_password_change -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Catalogued books.
    books (id) {
        id -> Int8,
        /// Unique ISBN, compared case-insensitively.
        isbn -> Varchar,
        title -> Varchar,
        description -> Nullable<Text>,
        editor -> Nullable<Varchar>,
        category -> Nullable<Varchar>,
        language -> Nullable<Varchar>,
        publication_date -> Nullable<Date>,
        nb_pages -> Int4,
        stock -> Int4,
        published -> Bool,
    }
}

diesel::table! {
    /// Superseded password hashes, pruned to a fixed window per user.
    password_history (id) {
        id -> Int8,
        user_id -> Int8,
        password_hash -> Varchar,
        changed_at -> Timestamptz,
    }
}

diesel::table! {
    /// Book reservations; at most one active row per (user, book) pair.
    reservations (id) {
        id -> Int8,
        user_id -> Int8,
        book_id -> Int8,
        reserved_at -> Timestamptz,
        active -> Bool,
    }
}

diesel::joinable!(users -> security_questions (security_question_id));
diesel::joinable!(password_history -> users (user_id));
diesel::joinable!(reservations -> users (user_id));
diesel::joinable!(reservations -> books (book_id));

diesel::allow_tables_to_appear_in_same_query!(
    books,
    password_history,
    reservations,
    security_questions,
    users,
);
