use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use expense_vault::auth::LoginGuard;
use expense_vault::cli::{
    handle_budget_command, handle_expense_command, handle_user_command, AuthArgs, BudgetCommands,
    Context, ExpenseCommands, UserCommands,
};
use expense_vault::config::{paths::ExpensePaths, settings::Settings};
use expense_vault::crypto::{KeyManager, MasterKey};
use expense_vault::storage::Storage;

#[derive(Parser)]
#[command(
    name = "expense",
    author = "Kaylee Beyene",
    version,
    about = "Personal expense tracker with per-user encryption",
    long_about = "expense-vault records personal expenses and budgets. Amounts and \
                  descriptions are encrypted with a per-user data key, which is in turn \
                  wrapped by the MASTER_KEY of the deployment."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Registration, login and password management
    #[command(subcommand)]
    User(UserCommands),

    #[command(flatten)]
    Expense(ExpenseCommands),

    /// Budget management commands
    #[command(subcommand)]
    Budget(BudgetCommands),

    /// Show your most recent audit log entries
    Audit {
        #[command(flatten)]
        auth: AuthArgs,
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let paths = ExpensePaths::new()?;

    let command = match cli.command {
        Some(Commands::Config) => {
            let settings = Settings::load_or_create(&paths)?;
            print_config(&paths, &settings);
            return Ok(());
        }
        Some(command) => command,
        None => {
            println!("expense-vault - encrypted personal expense tracking");
            println!();
            println!("Run 'expense --help' for usage information.");
            println!("Run 'expense user register <USERNAME> <EMAIL>' to get started.");
            return Ok(());
        }
    };

    // Nothing touches stored data without the master key
    let master_key = MasterKey::from_env()?;

    let storage = Storage::new(paths)?;
    storage.load_all()?;

    let mut settings = Settings::load_or_create(storage.paths())?;
    settings.ensure_key_salt(storage.paths(), storage.users.count_with_keys()?)?;
    settings.validate()?;

    let keys = KeyManager::new(&master_key, &settings.key_wrapping)?;
    let guard = LoginGuard::new(settings.lockout);
    let ctx = Context {
        storage: &storage,
        keys: &keys,
        guard: &guard,
    };

    match command {
        Commands::User(cmd) => handle_user_command(&ctx, cmd)?,
        Commands::Expense(cmd) => handle_expense_command(&ctx, cmd)?,
        Commands::Budget(cmd) => handle_budget_command(&ctx, cmd)?,
        Commands::Audit { auth, limit } => {
            let user = auth.authenticate(&ctx)?;
            let entries = storage.audit_log().read_recent_for(user.id, limit)?;
            if entries.is_empty() {
                println!("No audit entries.");
            }
            for entry in entries {
                println!("{}", entry.format_human_readable());
            }
        }
        Commands::Config => print_config(storage.paths(), &settings),
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // Diagnostics go to stderr so command output stays clean
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_config(paths: &ExpensePaths, settings: &Settings) {
    println!("expense-vault Configuration");
    println!("===========================");
    println!("Base directory: {}", paths.base_dir().display());
    println!("Data directory: {}", paths.data_dir().display());
    println!("Audit log:      {}", paths.audit_log().display());
    println!();
    println!("Settings:");
    println!("  Lockout threshold:   {}", settings.lockout.threshold);
    println!("  Lockout duration:    {}s", settings.lockout.duration_secs);
    println!("  PBKDF2 iterations:   {}", settings.key_wrapping.iterations);
    println!(
        "  Key salt:            {}",
        if settings.key_wrapping.has_salt() {
            "present"
        } else {
            "not yet generated"
        }
    );
    println!("  Currency symbol:     {}", settings.currency_symbol);
}
