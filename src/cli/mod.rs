//! CLI command handlers
//!
//! Bridges clap argument parsing with the service layer. Every command that
//! touches a user's data authenticates through the login guard first.

pub mod budget;
pub mod expense;
pub mod user;

pub use budget::{handle_budget_command, BudgetCommands};
pub use expense::{handle_expense_command, ExpenseCommands};
pub use user::{handle_user_command, UserCommands};

use chrono::{Local, NaiveDate};
use clap::Args;

use crate::auth::LoginGuard;
use crate::crypto::{KeyManager, SecureString};
use crate::error::{ExpenseError, ExpenseResult};
use crate::models::{Money, User};
use crate::services::AccountService;
use crate::storage::Storage;

/// Everything a command handler needs
pub struct Context<'a> {
    pub storage: &'a Storage,
    pub keys: &'a KeyManager,
    pub guard: &'a LoginGuard,
}

impl<'a> Context<'a> {
    pub fn accounts(&self) -> AccountService<'a> {
        AccountService::new(self.storage, self.keys, self.guard)
    }
}

/// Credentials for commands that act on a user's data
#[derive(Args, Debug, Clone)]
pub struct AuthArgs {
    /// Username or email
    #[arg(short, long, env = "EXPENSE_USER")]
    pub user: String,

    /// Password (prompted for if not given)
    #[arg(long, env = "EXPENSE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl AuthArgs {
    /// Log in and refuse accounts that must change their password first
    pub fn authenticate(&self, ctx: &Context<'_>) -> ExpenseResult<User> {
        let password = match &self.password {
            Some(password) => SecureString::new(password.clone()),
            None => prompt_secret("Password: ")?,
        };

        let accounts = ctx.accounts();
        let user = accounts.login(&self.user, &password)?;
        accounts.require_active(&user)?;
        Ok(user)
    }
}

/// Read a secret from the terminal without echo
pub(crate) fn prompt_secret(prompt: &str) -> ExpenseResult<SecureString> {
    rpassword::prompt_password(prompt)
        .map(SecureString::new)
        .map_err(|e| ExpenseError::Io(format!("Failed to read password: {}", e)))
}

/// A new password and its confirmation, from the flag or two prompts
pub(crate) fn new_password_pair(given: Option<&str>) -> ExpenseResult<(SecureString, SecureString)> {
    match given {
        Some(password) => Ok((SecureString::new(password), SecureString::new(password))),
        None => {
            let first = prompt_secret("New password: ")?;
            let confirm = prompt_secret("Confirm password: ")?;
            Ok((first, confirm))
        }
    }
}

/// Parse a `YYYY-MM-DD` date, defaulting to today
pub(crate) fn parse_date(value: Option<&str>) -> ExpenseResult<NaiveDate> {
    match value {
        Some(value) => NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
            ExpenseError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", value))
        }),
        None => Ok(Local::now().date_naive()),
    }
}

/// Parse a `YYYY-MM` month into its first day, defaulting to this month
pub(crate) fn parse_month(value: Option<&str>) -> ExpenseResult<NaiveDate> {
    match value {
        Some(value) => NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d")
            .map_err(|_| {
                ExpenseError::Validation(format!("Invalid month '{}', expected YYYY-MM", value))
            }),
        None => parse_date(None),
    }
}

pub(crate) fn parse_amount(value: &str) -> ExpenseResult<Money> {
    Money::parse(value).map_err(|e| ExpenseError::Validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(Some("2025-01-15")).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
        );
        assert!(parse_date(Some("15/01/2025")).unwrap_err().is_validation());
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(
            parse_month(Some("2025-02")).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()
        );
        assert!(parse_month(Some("2025-13")).is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("12.5").unwrap(), Money::from_cents(1250));
        assert!(parse_amount("twelve").unwrap_err().is_validation());
    }
}
