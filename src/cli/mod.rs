pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "weighbridge")]
#[command(about = "Look up product weights from catalog pages", long_about = None)]
pub struct Cli {
    /// Number of parallel workers (overrides the config file)
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// Path to the weights database
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Path to a config file instead of the default location
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve weights for a list of identifiers
    Enrich {
        /// Identifiers to resolve
        ids: Vec<String>,

        /// Read identifiers from a file, one per line ("-" for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Neither read nor write the weights database
        #[arg(long)]
        no_store: bool,
    },
    /// Resolve the weight of a single identifier
    Get {
        /// Identifier to resolve
        id: String,
    },
    /// List stored weights
    Stored,
    /// Delete stored weights
    Forget {
        /// Identifier to delete; all entries if omitted
        id: Option<String>,
    },
}
