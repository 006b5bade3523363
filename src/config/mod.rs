//! Configuration module for expense-vault
//!
//! - Data directory resolution
//! - Deployment settings (lockout policy, key wrapping salt)
//!
//! The master key is read from the environment by `crypto::MasterKey`.

pub mod paths;
pub mod settings;

pub use paths::ExpensePaths;
pub use settings::Settings;
