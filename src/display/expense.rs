//! Expense display formatting
//!
//! Formats decrypted expense views for terminal output. Only ever receives
//! `ExpenseView`s; envelopes are never printed.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{ExpenseView, Money};

#[derive(Tabled)]
struct ExpenseRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&ExpenseView> for ExpenseRow {
    fn from(view: &ExpenseView) -> Self {
        Self {
            id: view.id.to_string(),
            date: view.date.format("%Y-%m-%d").to_string(),
            category: view.category.to_string(),
            amount: view.amount.to_string(),
            description: truncate(view.description.as_deref().unwrap_or(""), 40),
        }
    }
}

/// Format expenses as a table with a total line
pub fn format_expense_table(expenses: &[ExpenseView]) -> String {
    if expenses.is_empty() {
        return "No expenses found.".to_string();
    }

    let mut table = Table::new(expenses.iter().map(ExpenseRow::from));
    table.with(Style::psql());

    let total = match Money::checked_sum(expenses.iter().map(|e| e.amount)) {
        Some(total) => total.to_string(),
        None => "out of range".to_string(),
    };
    format!(
        "{}\n\n{} expense(s), total {}",
        table,
        expenses.len(),
        total
    )
}

/// Format a single expense
pub fn format_expense_details(expense: &ExpenseView) -> String {
    let mut output = String::new();

    output.push_str(&format!("Expense:     {}\n", expense.id));
    output.push_str(&format!("Date:        {}\n", expense.date.format("%Y-%m-%d")));
    output.push_str(&format!("Category:    {}\n", expense.category));
    output.push_str(&format!("Amount:      {}\n", expense.amount));
    if let Some(description) = &expense.description {
        output.push_str(&format!("Description: {}\n", description));
    }

    output
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
