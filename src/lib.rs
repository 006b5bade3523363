//! expense-vault - Personal expense tracking with per-user encryption
//!
//! This library provides the core functionality for the `expense` command
//! line tool. Each user owns a random data key, wrapped by a key derived from
//! the deployment's master key; expense amounts and descriptions are stored
//! only as AES-256-GCM envelopes under that data key.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `crypto`: Envelope cipher, key hierarchy and encrypted fields
//! - `auth`: Login lockout guard and password rules
//! - `models`: Core data models (users, expenses, budgets)
//! - `storage`: JSON file storage layer
//! - `services`: Business logic layer
//! - `audit`: Audit logging system
//! - `cli` and `display`: Command handlers and terminal output
//!
//! # Example
//!
//! ```rust,ignore
//! use expense_vault::config::{paths::ExpensePaths, settings::Settings};
//! use expense_vault::crypto::{KeyManager, MasterKey};
//!
//! let master_key = MasterKey::from_env()?;
//! let paths = ExpensePaths::new()?;
//! let mut settings = Settings::load_or_create(&paths)?;
//! settings.ensure_key_salt(&paths, 0)?;
//! let keys = KeyManager::new(&master_key, &settings.key_wrapping)?;
//! ```

pub mod audit;
pub mod auth;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod display;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{ExpenseError, ExpenseResult};
