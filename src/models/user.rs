//! User model
//!
//! A user owns a salted password hash and, once registered, exactly one
//! wrapped data key. The raw data key is never stored here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::UserId;
use crate::crypto::password::{hash_password, verify_password};
use crate::crypto::EncryptedEnvelope;
use crate::error::ExpenseResult;

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: UserId,

    pub username: String,

    pub email: String,

    /// Argon2id PHC string
    #[serde(default)]
    pub password_hash: String,

    /// Data key wrapped under the master key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrapped_key: Option<EncryptedEnvelope>,

    /// Set by the password reset flow; cleared by a password change
    #[serde(default)]
    pub must_change_password: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with no password and no key yet
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            username: username.into(),
            email: email.into(),
            password_hash: String::new(),
            wrapped_key: None,
            must_change_password: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Hash and store a new password
    pub fn set_password(&mut self, password: &str) -> ExpenseResult<()> {
        self.password_hash = hash_password(password)?;
        self.touch();
        Ok(())
    }

    /// Check a password against the stored hash
    pub fn check_password(&self, password: &str) -> ExpenseResult<bool> {
        if self.password_hash.is_empty() {
            return Ok(false);
        }
        verify_password(password, &self.password_hash)
    }

    /// Flag the account as needing a new password
    pub fn invalidate_password(&mut self) {
        self.must_change_password = true;
        self.touch();
    }

    /// Whether the user identifies as `identifier` (username or email)
    pub fn is_identified_by(&self, identifier: &str) -> bool {
        let identifier = identifier.trim();
        self.username.eq_ignore_ascii_case(identifier) || self.email.eq_ignore_ascii_case(identifier)
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
