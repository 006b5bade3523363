//! Custom error types for expense-vault
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions. Cryptographic and configuration failures
//! are always surfaced as errors, never downgraded to default values.

use thiserror::Error;

/// The main error type for expense-vault operations
#[derive(Error, Debug)]
pub enum ExpenseError {
    /// Configuration-related errors (missing master key, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cipher construction, RNG or key-derivation failures
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// An envelope failed authentication: tampered, corrupted or wrong key
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Login attempts are blocked for this identifier
    #[error("Too many failed attempts. Please wait {remaining_secs} seconds before trying again.")]
    LockedOut { remaining_secs: i64 },

    /// Credentials did not verify; the lockout threshold has not been reached yet
    #[error("Invalid credentials. You have {attempts_remaining} attempts left.")]
    InvalidCredentials { attempts_remaining: u32 },

    /// The user has no wrapped data key
    #[error("No data key provisioned for user {0}")]
    KeyNotProvisioned(String),

    /// The user already owns a wrapped data key
    #[error("Data key already provisioned for user {0}")]
    KeyAlreadyProvisioned(String),

    /// The account must set a new password before continuing
    #[error("You must set a new password before continuing")]
    PasswordChangeRequired,

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models and input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ExpenseError {
    /// Create a "not found" error for users
    pub fn user_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "User",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for expenses
    pub fn expense_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Expense",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for budgets
    pub fn budget_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Budget",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if an envelope failed to authenticate
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }

    /// Check if this is a lockout rejection
    pub fn is_locked_out(&self) -> bool {
        matches!(self, Self::LockedOut { .. })
    }
}

impl From<std::io::Error> for ExpenseError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ExpenseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for expense-vault operations
pub type ExpenseResult<T> = Result<T, ExpenseError>;
