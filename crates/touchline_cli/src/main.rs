//! Touchline CLI
//!
//! Command-line tools for a Touchline store directory.
//!
//! # Commands
//!
//! - `inspect` - Display entity counts and store metadata
//! - `verify` - Check stored data and referential integrity
//! - `export` - Write the full store snapshot as JSON
//! - `import-legacy` - Import a schema-v1 archive
//! - `push` / `pull` - Whole-store transfer through a demo cloud
//! - `migrate-to-cloud` / `migrate-to-local` - Verified migrations
//!   through a demo cloud

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Touchline command-line store tools.
#[derive(Parser)]
#[command(name = "touchline")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display entity counts and store metadata
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check stored data and referential integrity
    Verify,

    /// Write the full store snapshot as JSON
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a schema-v1 legacy archive
    ImportLegacy {
        /// The archive file
        file: PathBuf,
    },

    /// Push the whole store into a fresh demo cloud
    Push,

    /// Pull a snapshot back into the store through a demo cloud
    Pull {
        /// Snapshot file seeding the demo cloud (defaults to the
        /// store's own snapshot)
        #[arg(short, long)]
        snapshot: Option<PathBuf>,
    },

    /// Run the verified local-to-cloud migration into a demo cloud
    MigrateToCloud {
        /// Clear the destination first instead of merging
        #[arg(long)]
        replace: bool,
    },

    /// Run the verified cloud-to-local migration from a demo cloud
    MigrateToLocal {
        /// Snapshot file seeding the demo cloud (defaults to the
        /// store's own snapshot)
        #[arg(short, long)]
        snapshot: Option<PathBuf>,

        /// Clear the demo cloud after a verified download
        #[arg(long)]
        delete_cloud: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Store path required for inspect")?;
            commands::inspect::run(&path, &format)?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or("Store path required for verify")?;
            commands::verify::run(&path)?;
        }
        Commands::Export { output } => {
            let path = cli.path.ok_or("Store path required for export")?;
            commands::export::run(&path, output.as_deref())?;
        }
        Commands::ImportLegacy { file } => {
            let path = cli.path.ok_or("Store path required for import-legacy")?;
            commands::import_legacy::run(&path, &file)?;
        }
        Commands::Push => {
            let path = cli.path.ok_or("Store path required for push")?;
            commands::push::run(&path)?;
        }
        Commands::Pull { snapshot } => {
            let path = cli.path.ok_or("Store path required for pull")?;
            commands::pull::run(&path, snapshot.as_deref())?;
        }
        Commands::MigrateToCloud { replace } => {
            let path = cli.path.ok_or("Store path required for migrate-to-cloud")?;
            commands::migrate::to_cloud(&path, replace)?;
        }
        Commands::MigrateToLocal {
            snapshot,
            delete_cloud,
        } => {
            let path = cli.path.ok_or("Store path required for migrate-to-local")?;
            commands::migrate::to_local(&path, snapshot.as_deref(), delete_cloud)?;
        }
        Commands::Version => {
            println!("Touchline CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Snapshot schema v{}", touchline_model::SCHEMA_VERSION);
        }
    }

    Ok(())
}
