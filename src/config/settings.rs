//! Deployment settings for expense-vault
//!
//! Holds the lockout policy and the key-wrapping parameters. The master key
//! itself is never written here; only the per-deployment salt that goes with
//! it is.

use serde::{Deserialize, Serialize};

use super::paths::ExpensePaths;
use crate::auth::LockoutPolicy;
use crate::crypto::KeyWrappingParams;
use crate::error::{ExpenseError, ExpenseResult};
use crate::storage::write_json_atomic;

/// Settings persisted in `config.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Login lockout threshold and window
    #[serde(default)]
    pub lockout: LockoutPolicy,

    /// Salt and iteration count for wrapping-key derivation
    #[serde(default)]
    pub key_wrapping: KeyWrappingParams,

    /// Default currency symbol for display
    #[serde(default = "default_currency")]
    pub currency_symbol: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "$".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            lockout: LockoutPolicy::default(),
            key_wrapping: KeyWrappingParams::default(),
            currency_symbol: default_currency(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or defaults if the file doesn't exist
    pub fn load_or_create(paths: &ExpensePaths) -> ExpenseResult<Self> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| ExpenseError::Io(format!("Failed to read settings file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| ExpenseError::Config(format!("Failed to parse settings file: {}", e)))
    }

    /// Make sure a per-deployment salt exists, persisting a new one if needed
    ///
    /// Returns `true` if a salt was generated. `wrapped_keys` counts the
    /// data keys already wrapped under a salt; a missing salt with wrapped
    /// keys present is a `Config` error and nothing is written.
    pub fn ensure_key_salt(&mut self, paths: &ExpensePaths, wrapped_keys: usize) -> ExpenseResult<bool> {
        if self.key_wrapping.has_salt() {
            return Ok(false);
        }
        if wrapped_keys > 0 {
            return Err(ExpenseError::Config(format!(
                "{} has no key wrapping salt but {} user data key(s) were wrapped with one; \
                 restore the previous config.json",
                paths.settings_file().display(),
                wrapped_keys
            )));
        }

        let iterations = self.key_wrapping.iterations;
        self.key_wrapping = KeyWrappingParams::new();
        self.key_wrapping.iterations = iterations;
        self.save(paths)?;

        tracing::info!("generated per-deployment key wrapping salt");
        Ok(true)
    }

    /// Validate every section
    pub fn validate(&self) -> ExpenseResult<()> {
        self.lockout.validate()?;
        self.key_wrapping.validate()
    }

    /// Save settings to disk, atomically and owner-only
    pub fn save(&self, paths: &ExpensePaths) -> ExpenseResult<()> {
        write_json_atomic(paths.settings_file(), self)
    }
}
