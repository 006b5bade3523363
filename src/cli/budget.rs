//! Budget CLI commands
//!
//! Setting per-category budgets and comparing them with spending.

use clap::Subcommand;

use super::{parse_amount, parse_month, AuthArgs, Context};
use crate::display::{format_budget_list, format_budget_report, format_monthly_totals};
use crate::error::ExpenseResult;
use crate::models::{BudgetPeriod, ExpenseCategory};
use crate::services::budget::MAX_TREND_MONTHS;
use crate::services::BudgetService;

/// Budget subcommands
#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Set the budget for a category
    Set {
        #[command(flatten)]
        auth: AuthArgs,
        /// Category name
        category: String,
        /// Amount (e.g., "100" or "100.00")
        amount: String,
        /// Budget period (weekly or monthly)
        #[arg(short, long, default_value = "monthly")]
        period: String,
    },

    /// List budgets
    List {
        #[command(flatten)]
        auth: AuthArgs,
    },

    /// Compare monthly budgets with spending
    Status {
        #[command(flatten)]
        auth: AuthArgs,
        /// Month (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Show total spending for recent months
    Trend {
        #[command(flatten)]
        auth: AuthArgs,
        /// Number of months to show (1 to 120)
        #[arg(short = 'n', long, default_value = "6", value_parser = clap::value_parser!(u32).range(1..=MAX_TREND_MONTHS as i64))]
        months: u32,
        /// Last month shown (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
    },
}

/// Handle a budget command
pub fn handle_budget_command(ctx: &Context<'_>, cmd: BudgetCommands) -> ExpenseResult<()> {
    let service = BudgetService::new(ctx.storage, ctx.keys);

    match cmd {
        BudgetCommands::Set {
            auth,
            category,
            amount,
            period,
        } => {
            let user = auth.authenticate(ctx)?;
            let category: ExpenseCategory = category.parse()?;
            let period: BudgetPeriod = period.parse()?;
            let budget = service.set(&user, category, period, parse_amount(&amount)?)?;
            println!(
                "Budget set: {} {} {}",
                budget.category, budget.period, budget.amount
            );
        }

        BudgetCommands::List { auth } => {
            let user = auth.authenticate(ctx)?;
            print!("{}", format_budget_list(&service.list(&user)?));
        }

        BudgetCommands::Status { auth, month } => {
            let user = auth.authenticate(ctx)?;
            let report = service.status(&user, parse_month(month.as_deref())?)?;
            print!("{}", format_budget_report(&report));
        }

        BudgetCommands::Trend {
            auth,
            months,
            month,
        } => {
            let user = auth.authenticate(ctx)?;
            let totals = service.monthly_totals(&user, parse_month(month.as_deref())?, months)?;
            print!("{}", format_monthly_totals(&totals));
        }
    }

    Ok(())
}
