//! ParcelDesk CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! parceldesk-cli migrate
//!
//! # Seed one opening batch per product that has stock but no batches
//! parceldesk-cli seed opening-stock
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed opening-stock` - Seed pre-existing stock as FIFO batches

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "parceldesk-cli")]
#[command(author, version, about = "ParcelDesk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed database data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Create one opening batch per product that has stock but no batches
    OpeningStock,
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
        Commands::Seed { target } => match target {
            SeedTarget::OpeningStock => commands::seed::opening_stock().await?,
        },
    }
    Ok(())
}
