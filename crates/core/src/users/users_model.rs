//! User domain models.

use serde::{Deserialize, Serialize};

use crate::constants::PASSWORD_HASH_PREVIEW_CHARS;

/// A registered trainee, one row of the user database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub created_at: String,
}

/// Signup input.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// Admin view of a user with the password hash masked.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserSummary {
    pub email: String,
    pub full_name: String,
    pub created_at: String,
    pub password_hash: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        let preview: String = user
            .password_hash
            .chars()
            .take(PASSWORD_HASH_PREVIEW_CHARS)
            .collect();
        Self {
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            created_at: user.created_at.clone(),
            password_hash: format!("{preview}..."),
        }
    }
}

/// Emails are compared case-insensitively and without surrounding whitespace.
pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
