//! Storage layer for expense-vault
//!
//! JSON file repositories with atomic writes and automatic directory
//! creation, plus the audit log that records changes to them.

pub mod budgets;
pub mod expenses;
pub mod file_io;
pub mod users;

pub use budgets::BudgetRepository;
pub use expenses::ExpenseRepository;
pub use file_io::{append_line, read_json, write_json_atomic};
pub use users::UserRepository;

use crate::audit::{AuditEntry, AuditLogger};
use crate::config::paths::ExpensePaths;
use crate::error::ExpenseResult;

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: ExpensePaths,
    pub users: UserRepository,
    pub expenses: ExpenseRepository,
    pub budgets: BudgetRepository,
    audit: AuditLogger,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: ExpensePaths) -> ExpenseResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            users: UserRepository::new(paths.users_file()),
            expenses: ExpenseRepository::new(paths.expenses_file()),
            budgets: BudgetRepository::new(paths.budgets_file()),
            audit: AuditLogger::new(paths.audit_log()),
            paths,
        })
    }

    pub fn paths(&self) -> &ExpensePaths {
        &self.paths
    }

    /// Load all data from disk
    pub fn load_all(&self) -> ExpenseResult<()> {
        self.users.load()?;
        self.expenses.load()?;
        self.budgets.load()?;
        Ok(())
    }

    /// Append an entry to the audit log
    pub fn log_audit(&self, entry: &AuditEntry) -> ExpenseResult<()> {
        self.audit.log(entry)
    }

    pub fn audit_log(&self) -> &AuditLogger {
        &self.audit
    }
}
