//! Storekeep CLI - database migrations and development tools.
//!
//! # Usage
//!
//! ```bash
//! # Run dashboard database migrations
//! sk-cli migrate
//!
//! # Load a demo catalog owned by an identity-provider user
//! sk-cli seed -f seed/demo.yaml
//!
//! # Mint a session token for API calls during development
//! sk-cli dev-token -u user_2abc --ttl 3600
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sk-cli")]
#[command(author, version, about = "Storekeep CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed a demo catalog from a YAML file
    Seed {
        /// Path to the seed file
        #[arg(short, long, default_value = "seed/demo.yaml")]
        file: String,
    },
    /// Print a signed session token for `Authorization: Bearer`
    DevToken {
        /// Identity-provider user id to put in `sub`
        #[arg(short, long)]
        user: String,

        /// Lifetime in seconds
        #[arg(long, default_value_t = 3600)]
        ttl: i64,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::run(&file).await?,
        Commands::DevToken { user, ttl } => commands::token::run(&user, ttl)?,
    }
    Ok(())
}
