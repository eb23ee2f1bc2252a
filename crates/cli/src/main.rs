//! Myshop CLI - Database migrations and catalog management.
//!
//! # Usage
//!
//! ```bash
//! # Create the catalog schema and the session table
//! myshop-cli migrate
//!
//! # Load categories and products from a YAML file
//! myshop-cli seed seed/catalog.yaml
//! ```
//!
//! Both commands read `MYSHOP_DATABASE_URL` (or `DATABASE_URL`), optionally
//! from a `.env` file.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "myshop-cli")]
#[command(author, version, about = "Myshop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run catalog and session store migrations
    Migrate,
    /// Upsert categories and products from a YAML file
    Seed {
        /// Path to the catalog YAML file
        file: PathBuf,
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

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => {
            let summary = commands::seed::run(&file).await?;
            tracing::info!(
                categories = summary.categories,
                products = summary.products,
                "Seed complete"
            );
        }
    }
    Ok(())
}
