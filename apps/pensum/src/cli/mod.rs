//! # Pensum CLI Module
//!
//! This module implements the CLI interface for Pensum.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `catalog` - List the catalog
//! - `recommend` - Courses eligible next term
//! - `plan` - Compute an optimal multi-term plan
//! - `validate` - Check a catalog file and report problems
//! - `mirror` - Write the catalog into a redb database
//! - `inspect` - Read a mirror database back

mod commands;

use clap::{Parser, Subcommand};
use pensum_core::PlannerError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Pensum - academic planning engine
///
/// Reads a curriculum catalog, tells students which courses they can take
/// next and computes the shortest sequence of terms that finishes the rest.
#[derive(Parser, Debug)]
#[command(name = "pensum")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the catalog file (CSV or JSON)
    #[arg(short = 'C', long, global = true, default_value = "catalog.csv")]
    pub catalog: PathBuf,

    /// Catalog format (csv, json); guessed from the extension when omitted
    #[arg(short = 'F', long, global = true)]
    pub format: Option<String>,

    /// Path to a TOML settings file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// List every course ordered by level
    Catalog,

    /// Show the courses eligible next term
    Recommend {
        /// Completed course codes (comma-separated)
        #[arg(short, long, default_value = "")]
        completed: String,
    },

    /// Compute a makespan-optimal plan for the remaining courses
    Plan {
        /// Completed course codes (comma-separated)
        #[arg(short, long, default_value = "")]
        completed: String,

        /// Credit cap per term (defaults to the configured value)
        #[arg(short, long)]
        max_credits: Option<u32>,

        /// Ignore the progression window
        #[arg(short, long)]
        flexible: bool,

        /// Re-check the plan invariants before printing
        #[arg(long)]
        verify: bool,
    },

    /// Validate the catalog file
    Validate,

    /// Mirror the catalog into a redb database
    Mirror {
        /// Database path
        #[arg(short, long, default_value = "catalog.redb")]
        db: PathBuf,
    },

    /// Show what a mirror database holds
    Inspect {
        /// Database path
        #[arg(short, long, default_value = "catalog.redb")]
        db: PathBuf,
    },
}

// =============================================================================
// EXIT CODES
// =============================================================================

/// Process exit code for a failed command: 2 when no plan fits, 3 when the
/// solver ran out of time, 1 for everything else.
pub fn exit_code(error: &PlannerError) -> i32 {
    match error {
        PlannerError::Infeasible { .. } => 2,
        PlannerError::SolveTimeout { .. } => 3,
        _ => 1,
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), PlannerError> {
    let source = CatalogSource {
        path: cli.catalog,
        format: cli.format,
    };
    let json_mode = cli.json_mode;
    let config = cli.config.as_deref();

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(&source, config, &host, port).await,
        Some(Commands::Catalog) => cmd_catalog(&source, json_mode),
        Some(Commands::Recommend { completed }) => cmd_recommend(&source, json_mode, &completed),
        Some(Commands::Plan {
            completed,
            max_credits,
            flexible,
            verify,
        }) => cmd_plan(
            &source,
            config,
            json_mode,
            &completed,
            max_credits,
            flexible,
            verify,
        ),
        Some(Commands::Validate) | None => cmd_validate(&source, json_mode, cli.verbose),
        Some(Commands::Mirror { db }) => cmd_mirror(&source, json_mode, &db),
        Some(Commands::Inspect { db }) => cmd_inspect(json_mode, &db, cli.verbose),
    }
}
