//! User account aggregate and the patch type for profile updates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A registered user account.
///
/// `password_hash` and `security_answer_hash` only ever hold PHC hash
/// strings; plaintext never reaches this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Surrogate identifier, strictly positive.
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    /// Globally unique email address.
    pub email: String,
    /// PHC-string hash of the current password.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: String,
    pub birthdate: Option<NaiveDate>,
    /// Accounts start inactive and must be activated before login.
    pub active: bool,
    /// Reference to the chosen security question.
    pub security_question_id: Option<i64>,
    /// PHC-string hash of the normalized security answer.
    #[serde(skip_serializing, default)]
    pub security_answer_hash: Option<String>,
    /// When the current password was set; drives the expiry policy.
    pub last_password_change: Option<DateTime<Utc>>,
}

/// Registration payload handed to the account service.
///
/// Plaintext `password` and `security_answer` exist only in this transient
/// request; the service hashes both and discards them.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub birthdate: Option<NaiveDate>,
    pub security_question_id: Option<i64>,
    pub security_answer: Option<String>,
}

/// Field-allowlisted profile patch.
///
/// Email and password deliberately have no representation here; they can
/// only change through their dedicated flows.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    /// Replacement first name, applied when present and non-blank.
    pub firstname: Option<String>,
    /// Replacement last name, applied when present and non-blank.
    pub lastname: Option<String>,
    /// Replacement role, applied when present and non-blank.
    pub role: Option<String>,
    /// Replacement birthdate, applied when present.
    pub birthdate: Option<NaiveDate>,
    /// Replacement activation flag, applied when present.
    pub active: Option<bool>,
}

impl User {
    /// Apply a [`ProfilePatch`], honouring the non-blank rule for text
    /// fields.
    pub fn apply_patch(&mut self, patch: ProfilePatch) {
        if let Some(firstname) = non_blank(patch.firstname) {
            self.firstname = firstname;
        }
        if let Some(lastname) = non_blank(patch.lastname) {
            self.lastname = lastname;
        }
        if let Some(role) = non_blank(patch.role) {
            self.role = role;
        }
        if let Some(birthdate) = patch.birthdate {
            self.birthdate = Some(birthdate);
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
