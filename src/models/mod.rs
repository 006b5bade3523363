//! Core data models for expense-vault
//!
//! Users, their expenses and budgets, plus the value types they are built
//! from (IDs, money, categories).

pub mod budget;
pub mod category;
pub mod expense;
pub mod ids;
pub mod money;
pub mod user;

pub use budget::{Budget, BudgetPeriod};
pub use category::ExpenseCategory;
pub use expense::{Expense, ExpenseView};
pub use ids::{BudgetId, ExpenseId, UserId};
pub use money::{Money, MoneyParseError};
pub use user::User;
