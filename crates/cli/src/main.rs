//! Camellia CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! camellia-cli migrate run
//!
//! # Seed the catalog with demo products
//! camellia-cli seed
//!
//! # Create an admin user
//! camellia-cli admin create -e admin@example.com -p s3cret-password --phone +15551234567
//! ```
//!
//! # Commands
//!
//! - `migrate run` - Apply pending database migrations
//! - `seed` - Insert the demo product catalog
//! - `admin create` - Create admin users

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "camellia-cli")]
#[command(author, version, about = "Camellia CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Seed the catalog with demo products
    Seed,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Run,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin password (minimum 8 characters)
        #[arg(short, long)]
        password: String,

        /// Admin phone number in E.164 form, e.g. +15551234567
        #[arg(long)]
        phone: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { action } => match action {
            MigrateAction::Run => commands::migrate::run().await?,
        },
        Commands::Seed => commands::seed::catalog().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                password,
                phone,
            } => {
                commands::admin::create_user(&email, &password, phone.as_deref()).await?;
            }
        },
    }
    Ok(())
}
