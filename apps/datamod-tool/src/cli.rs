use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load and validate a configuration, then list its entities
    Check {
        /// Path to the TOML configuration
        config: PathBuf,
    },

    /// Show what a scenario reference resolves to
    Resolve {
        /// Path to the TOML configuration
        config: PathBuf,

        /// Reference as written in a scenario, e.g. "User"
        reference: String,
    },

    /// Insert seed data into a memory store and print its contents
    Seed {
        /// Path to the TOML configuration
        config: PathBuf,

        /// Create a fixture after seeding: entity reference and JSON data
        #[arg(long, num_args = 2, value_names = ["ENTITY", "JSON"])]
        fixture: Option<Vec<String>>,

        /// Unique column for the fixture
        #[arg(long, requires = "fixture")]
        unique: Option<String>,
    },
}
