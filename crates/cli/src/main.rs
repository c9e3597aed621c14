//! Trails CLI - Database migrations and user directory management.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! trails-cli migrate
//!
//! # Register a user (role defaults to User)
//! trails-cli user create -e walker@example.com -r admin
//!
//! # Change the role of an existing user
//! trails-cli user set-role -e walker@example.com -r user
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user create` - Register a user in the directory
//! - `user set-role` - Change a user's role

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "trails-cli")]
#[command(author, version, about = "Trails API CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage the user directory
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Register a new user
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Role (`user` or `admin`)
        #[arg(short, long, default_value = "user")]
        role: String,
    },
    /// Change the role of an existing user
    SetRole {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// New role (`user` or `admin`)
        #[arg(short, long)]
        role: String,
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create { email, role } => {
                let id = commands::user::create_user(&email, &role).await?;
                tracing::info!(user_id = %id, "User registered");
            }
            UserAction::SetRole { email, role } => {
                commands::user::set_role(&email, &role).await?;
            }
        },
    }
    Ok(())
}
