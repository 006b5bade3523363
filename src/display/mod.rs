//! Display formatting for terminal output
//!
//! Formats decrypted expenses and budget reports as tables and detail views.

pub mod budget;
pub mod expense;

pub use budget::{format_budget_list, format_budget_report, format_monthly_totals};
pub use expense::{format_expense_details, format_expense_table};
