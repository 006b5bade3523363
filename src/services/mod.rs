//! Service layer for expense-vault
//!
//! Business logic on top of the storage layer: validation, encryption of
//! sensitive fields, authentication and audit logging.

pub mod account;
pub mod budget;
pub mod expense;

pub use account::AccountService;
pub use budget::{BudgetReport, BudgetService, CategoryStatus};
pub use expense::{ExpenseFilter, ExpenseService, ExpenseUpdate, NewExpense};
