//! User CLI commands
//!
//! Registration, login and the password reset and change flows.

use clap::Subcommand;

use super::{new_password_pair, prompt_secret, Context};
use crate::auth::validate_new_password;
use crate::crypto::SecureString;
use crate::error::{ExpenseError, ExpenseResult};

/// User subcommands
#[derive(Subcommand)]
pub enum UserCommands {
    /// Register a new user
    Register {
        username: String,
        email: String,
        /// Password (prompted for, with confirmation, if not given)
        #[arg(long, env = "EXPENSE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Check credentials; retries interactively until success or lockout
    Login {
        /// Username or email
        identifier: String,
        #[arg(long, env = "EXPENSE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Reset a forgotten password by email
    ResetPassword {
        email: String,
        #[arg(long, env = "EXPENSE_NEW_PASSWORD", hide_env_values = true)]
        new_password: Option<String>,
    },

    /// Change the password of an account (required after a reset)
    ChangePassword {
        /// Username or email
        identifier: String,
        /// Current password
        #[arg(long, env = "EXPENSE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        #[arg(long, env = "EXPENSE_NEW_PASSWORD", hide_env_values = true)]
        new_password: Option<String>,
    },
}

/// Handle a user command
pub fn handle_user_command(ctx: &Context<'_>, cmd: UserCommands) -> ExpenseResult<()> {
    let accounts = ctx.accounts();

    match cmd {
        UserCommands::Register {
            username,
            email,
            password,
        } => {
            let (password, confirm) = new_password_pair(password.as_deref())?;
            validate_new_password(&password, &confirm)?;
            let user = accounts.register(&username, &email, &password)?;
            println!("Registered {} ({})", user.username, user.id);
            println!("Registration successful. Please log in.");
        }

        UserCommands::Login {
            identifier,
            password,
        } => {
            // With a password supplied there is nobody to retry
            let interactive = password.is_none();
            let mut given = password.map(SecureString::new);

            loop {
                let password = match given.take() {
                    Some(password) => password,
                    None => prompt_secret("Password: ")?,
                };

                match accounts.login(&identifier, &password) {
                    Ok(user) => {
                        println!("Logged in successfully as {}.", user.username);
                        if user.must_change_password {
                            println!(
                                "Your password has been reset. Run 'expense user change-password {}' to continue.",
                                user.username
                            );
                        }
                        return Ok(());
                    }
                    Err(err @ ExpenseError::InvalidCredentials { .. }) if interactive => {
                        eprintln!("{}", err);
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        UserCommands::ResetPassword {
            email,
            new_password,
        } => {
            accounts.request_password_reset(&email)?;
            println!("Please create a new password for your account.");
            let (password, confirm) = new_password_pair(new_password.as_deref())?;
            accounts.reset_password(&email, &password, &confirm)?;
            println!("Your password has been updated successfully. Please log in with your new password.");
        }

        UserCommands::ChangePassword {
            identifier,
            password,
            new_password,
        } => {
            let current = match password {
                Some(password) => SecureString::new(password),
                None => prompt_secret("Current password: ")?,
            };
            // Flagged accounts may log in, but only to get here
            let user = accounts.login(&identifier, &current)?;
            let (password, confirm) = new_password_pair(new_password.as_deref())?;
            accounts.change_password(user.id, &password, &confirm)?;
            println!("Your password has been updated successfully.");
        }
    }

    Ok(())
}
