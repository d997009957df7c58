//! MadeInWorld CLI - operator tooling.
//!
//! # Usage
//!
//! ```bash
//! # Purge expired verification codes and stale rate-limit buckets now
//! miw-cli sweep
//!
//! # Mint a session token for manual API testing
//! miw-cli token --email shopper@example.com --subject 6f1c...
//! ```
//!
//! # Commands
//!
//! - `sweep` - One retention pass against the auth database
//! - `token` - Sign a session token with the configured `JWT_SECRET`

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "miw-cli")]
#[command(author, version, about = "MadeInWorld operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete expired verification codes and old rate-limit buckets
    Sweep,
    /// Mint a session token
    Token {
        /// Email claim
        #[arg(short, long)]
        email: String,

        /// Subject claim (user ID). Defaults to a fresh random ID.
        #[arg(short, long)]
        subject: Option<String>,
    },
}

#[tokio::main]
async fn main() {
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
        Commands::Sweep => commands::sweep::run().await?,
        Commands::Token { email, subject } => {
            commands::token::run(&email, subject.as_deref())?;
        }
    }
    Ok(())
}
