//! Expense CLI commands
//!
//! These are flattened into the top level: `expense add`, `expense list`, ...

use clap::Subcommand;

use super::{parse_amount, parse_date, AuthArgs, Context};
use crate::display::{format_expense_details, format_expense_table};
use crate::error::ExpenseResult;
use crate::models::ExpenseCategory;
use crate::services::{ExpenseFilter, ExpenseService, ExpenseUpdate, NewExpense};

/// Expense subcommands
#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Record an expense
    Add {
        #[command(flatten)]
        auth: AuthArgs,
        /// Amount (e.g. "12.50")
        amount: String,
        /// Category (Housing, Transportation, Food, ...)
        category: String,
        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short = 'm', long)]
        description: Option<String>,
    },

    /// List recent expenses
    List {
        #[command(flatten)]
        auth: AuthArgs,
        /// Number of expenses to show
        #[arg(short, long, default_value = "15")]
        limit: usize,
    },

    /// Search expenses
    Search {
        #[command(flatten)]
        auth: AuthArgs,
        #[arg(short, long)]
        category: Option<String>,
        /// Earliest date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Latest date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        min: Option<String>,
        #[arg(long)]
        max: Option<String>,
        /// Text contained in the description
        #[arg(short, long)]
        text: Option<String>,
    },

    /// Show one expense
    Show {
        #[command(flatten)]
        auth: AuthArgs,
        /// Expense ID or its first 8+ characters
        id: String,
    },

    /// Change an expense
    Edit {
        #[command(flatten)]
        auth: AuthArgs,
        /// Expense ID or its first 8+ characters
        id: String,
        #[arg(long)]
        amount: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short = 'm', long)]
        description: Option<String>,
        /// Remove the description
        #[arg(long, conflicts_with = "description")]
        clear_description: bool,
    },

    /// Delete an expense
    Delete {
        #[command(flatten)]
        auth: AuthArgs,
        /// Expense ID or its first 8+ characters
        id: String,
    },
}

/// Handle an expense command
pub fn handle_expense_command(ctx: &Context<'_>, cmd: ExpenseCommands) -> ExpenseResult<()> {
    let service = ExpenseService::new(ctx.storage, ctx.keys);

    match cmd {
        ExpenseCommands::Add {
            auth,
            amount,
            category,
            date,
            description,
        } => {
            let user = auth.authenticate(ctx)?;
            let input = NewExpense {
                date: parse_date(date.as_deref())?,
                category: category.parse()?,
                amount: parse_amount(&amount)?,
                description,
            };
            let expense = service.add(&user, input)?;
            println!("Expense added successfully! ({})", expense.id);
        }

        ExpenseCommands::List { auth, limit } => {
            let user = auth.authenticate(ctx)?;
            let expenses = service.recent(&user, limit)?;
            println!("{}", format_expense_table(&expenses));
        }

        ExpenseCommands::Search {
            auth,
            category,
            from,
            to,
            min,
            max,
            text,
        } => {
            let user = auth.authenticate(ctx)?;

            let mut filter = ExpenseFilter::new()
                .date_range(
                    from.as_deref().map(|d| parse_date(Some(d))).transpose()?,
                    to.as_deref().map(|d| parse_date(Some(d))).transpose()?,
                )
                .amount_range(
                    min.as_deref().map(parse_amount).transpose()?,
                    max.as_deref().map(parse_amount).transpose()?,
                );
            if let Some(category) = category {
                filter = filter.category(category.parse::<ExpenseCategory>()?);
            }
            if let Some(text) = text {
                filter = filter.text(text);
            }

            let expenses = service.search(&user, &filter)?;
            println!("{}", format_expense_table(&expenses));
        }

        ExpenseCommands::Show { auth, id } => {
            let user = auth.authenticate(ctx)?;
            let expense = service.get(&user, &id)?;
            let view = service.decrypt(&user, &expense)?;
            print!("{}", format_expense_details(&view));
        }

        ExpenseCommands::Edit {
            auth,
            id,
            amount,
            category,
            date,
            description,
            clear_description,
        } => {
            let user = auth.authenticate(ctx)?;
            let changes = ExpenseUpdate {
                date: date.as_deref().map(|d| parse_date(Some(d))).transpose()?,
                category: category.map(|c| c.parse::<ExpenseCategory>()).transpose()?,
                amount: amount.as_deref().map(parse_amount).transpose()?,
                description: if clear_description {
                    Some(None)
                } else {
                    description.map(Some)
                },
            };
            let expense = service.update(&user, &id, changes)?;
            println!("Expense updated successfully! ({})", expense.id);
        }

        ExpenseCommands::Delete { auth, id } => {
            let user = auth.authenticate(ctx)?;
            let expense = service.delete(&user, &id)?;
            println!("Expense deleted successfully! ({})", expense.id);
        }
    }

    Ok(())
}
