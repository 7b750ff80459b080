//! Idempotent startup seeding for reference data.

use tracing::info;

use crate::domain::ports::{QuestionPersistenceError, SecurityQuestionRepository};
use crate::domain::DEFAULT_QUESTION_LABELS;

/// Install the fixed security question set when the table is empty.
///
/// Safe to run on every startup; a non-empty table is left untouched.
pub async fn seed_security_questions<Q>(repo: &Q) -> Result<(), QuestionPersistenceError>
where
    Q: SecurityQuestionRepository,
{
    let existing = repo.count().await?;
    if existing > 0 {
        info!(existing, "security questions already seeded, skipping");
        return Ok(());
    }
    repo.insert_labels(&DEFAULT_QUESTION_LABELS).await?;
    info!(
        inserted = DEFAULT_QUESTION_LABELS.len(),
        "security questions seeded"
    );
    Ok(())
}
