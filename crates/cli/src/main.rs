//! Tally CLI - Database migrations and provisioning tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! tally migrate
//!
//! # Create a user with an opening balance
//! tally user create -u alice -p 'correct horse battery' --balance 100
//!
//! # Add or reprice a catalog item
//! tally item set -n widget -p 19.99
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user create` - Create a user and provision their balance row
//! - `item set` - Insert or replace a catalog price

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tally")]
#[command(author, version, about = "Tally CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage the price catalog
    Item {
        #[command(subcommand)]
        action: ItemAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user with a balance row
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,

        /// Opening balance
        #[arg(short, long, default_value = "0")]
        balance: String,
    },
}

#[derive(Subcommand)]
enum ItemAction {
    /// Insert an item or replace its price
    Set {
        /// Item name
        #[arg(short, long)]
        name: String,

        /// Price
        #[arg(short, long)]
        price: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                password,
                balance,
            } => {
                commands::user::create(&username, &password, &balance).await?;
            }
        },
        Commands::Item { action } => match action {
            ItemAction::Set { name, price } => commands::item::set(&name, &price).await?,
        },
    }
    Ok(())
}
