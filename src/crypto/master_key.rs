//! Process-wide master key
//!
//! Read once from the `MASTER_KEY` environment variable at startup and kept
//! only in memory for the lifetime of the process.

use std::fmt;

use crate::error::{ExpenseError, ExpenseResult};

use super::SecureString;

/// Environment variable holding the master key
pub const MASTER_KEY_ENV: &str = "MASTER_KEY";

/// The secret that wraps every user's data key
pub struct MasterKey {
    secret: SecureString,
}

impl MasterKey {
    /// Create a master key from a non-empty secret
    pub fn new(secret: impl Into<String>) -> ExpenseResult<Self> {
        let secret = SecureString::new(secret);
        if secret.trim().is_empty() {
            return Err(ExpenseError::Config("Master key must not be empty".into()));
        }
        Ok(Self { secret })
    }

    /// Load the master key from the process environment
    ///
    /// # Errors
    ///
    /// Returns `ExpenseError::Config` if the variable is unset, empty or not
    /// valid unicode. Every encrypted field is unrecoverable without it, so
    /// callers should treat this as fatal.
    pub fn from_env() -> ExpenseResult<Self> {
        match std::env::var(MASTER_KEY_ENV) {
            Ok(value) => Self::new(value),
            Err(std::env::VarError::NotPresent) => Err(ExpenseError::Config(format!(
                "{} environment variable is not set",
                MASTER_KEY_ENV
            ))),
            Err(std::env::VarError::NotUnicode(_)) => Err(ExpenseError::Config(format!(
                "{} environment variable is not valid unicode",
                MASTER_KEY_ENV
            ))),
        }
    }

    pub(crate) fn expose(&self) -> &str {
        self.secret.as_str()
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey([REDACTED])")
    }
}
