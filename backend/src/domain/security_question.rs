//! Security questions: static reference data seeded once at bootstrap.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A security question a user can pick at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecurityQuestion {
    /// Surrogate identifier, strictly positive.
    pub id: i64,
    /// Question text shown during the second login step.
    pub label: String,
}

/// The fixed question set installed by the idempotent bootstrap step.
pub const DEFAULT_QUESTION_LABELS: [&str; 5] = [
    "Quel est le nom de votre premier animal ?",
    "Quel est le nom de jeune fille de votre mère ?",
    "Dans quelle ville êtes-vous né ?",
    "Quel est le prénom de votre meilleur ami d'enfance ?",
    "Quel est votre film préféré ?",
];

/// Normalize a security answer so verification ignores case and
/// surrounding whitespace.
pub fn normalize_security_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}
