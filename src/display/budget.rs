//! Budget display formatting

use chrono::NaiveDate;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{Budget, Money};
use crate::services::{BudgetReport, CategoryStatus};

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Budget")]
    budget: String,
    #[tabled(rename = "Spent")]
    spent: String,
    #[tabled(rename = "Remaining")]
    remaining: String,
    #[tabled(rename = "Status")]
    flag: String,
}

impl From<&CategoryStatus> for StatusRow {
    fn from(status: &CategoryStatus) -> Self {
        let (budget, remaining) = if status.has_budget {
            (status.budget_amount.to_string(), status.remaining.to_string())
        } else {
            ("-".to_string(), "-".to_string())
        };
        Self {
            category: status.category.to_string(),
            budget,
            spent: status.spent.to_string(),
            remaining,
            flag: if status.is_over_budget() {
                "OVER".to_string()
            } else {
                String::new()
            },
        }
    }
}

/// Format the budgets a user has set
pub fn format_budget_list(budgets: &[Budget]) -> String {
    if budgets.is_empty() {
        return "No budgets set.".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!("{:<16} {:<8} {:>12}\n", "Category", "Period", "Amount"));
    output.push_str(&format!("{:-<16} {:-<8} {:->12}\n", "", "", ""));
    for budget in budgets {
        output.push_str(&format!(
            "{:<16} {:<8} {:>12}\n",
            budget.category.to_string(),
            budget.period.to_string(),
            budget.amount.to_string()
        ));
    }
    output
}

/// Format a monthly budget report
pub fn format_budget_report(report: &BudgetReport) -> String {
    let mut table = Table::new(report.categories.iter().map(StatusRow::from));
    table.with(Style::psql());

    let mut output = format!("Budget status for {}\n\n{}\n\n", report.month.format("%B %Y"), table);
    output.push_str(&format!("Total budget: {}\n", report.total_budget));
    output.push_str(&format!("Total spent:  {}\n", report.total_spent));
    match report.utilization_percent() {
        Some(percent) => output.push_str(&format!("Utilization:  {:.1}%\n", percent)),
        None => output.push_str("Utilization:  no monthly budgets set\n"),
    }
    output
}

/// Format month totals with a proportional bar
pub fn format_monthly_totals(totals: &[(NaiveDate, Money)]) -> String {
    const BAR_WIDTH: i64 = 30;

    let max = totals.iter().map(|(_, m)| m.cents()).max().unwrap_or(0);
    let mut output = String::new();
    for (month, total) in totals {
        let filled = if max > 0 {
            (total.cents() * BAR_WIDTH / max) as usize
        } else {
            0
        };
        output.push_str(&format!(
            "{}  {:>12}  {}\n",
            month.format("%b %Y"),
            total.to_string(),
            "#".repeat(filled)
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BudgetPeriod, ExpenseCategory, UserId};

    #[test]
    fn test_budget_list() {
        let budget = Budget::new(
            UserId::new(),
            ExpenseCategory::Food,
            BudgetPeriod::Monthly,
            Money::from_cents(30000),
        );
        let output = format_budget_list(&[budget]);
        assert!(output.contains("Food"));
        assert!(output.contains("monthly"));
        assert!(output.contains("$300.00"));
        assert_eq!(format_budget_list(&[]), "No budgets set.");
    }

    #[test]
    fn test_report_flags_overspending() {
        let report = BudgetReport {
            month: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            categories: vec![
                CategoryStatus {
                    category: ExpenseCategory::Utilities,
                    budget_amount: Money::from_cents(5000),
                    spent: Money::from_cents(7500),
                    remaining: Money::from_cents(-2500),
                    has_budget: true,
                },
                CategoryStatus {
                    category: ExpenseCategory::Shopping,
                    budget_amount: Money::zero(),
                    spent: Money::from_cents(999),
                    remaining: Money::zero(),
                    has_budget: false,
                },
            ],
            total_budget: Money::from_cents(5000),
            total_spent: Money::from_cents(8499),
        };

        let output = format_budget_report(&report);
        assert!(output.contains("March 2025"));
        assert!(output.contains("OVER"));
        assert!(output.contains("Utilization:  170.0%"));
    }

    #[test]
    fn test_monthly_totals_bars() {
        let jan = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let feb = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let output = format_monthly_totals(&[(jan, Money::from_cents(1000)), (feb, Money::zero())]);

        let lines: Vec<&str> = output.lines().collect();
        assert!(lines[0].starts_with("Jan 2025"));
        assert!(lines[0].ends_with(&"#".repeat(30)));
        assert!(!lines[1].contains('#'));
    }
}
