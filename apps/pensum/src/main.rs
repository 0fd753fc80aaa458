//! # Pensum - Academic Planning Server
//!
//! The main binary for the Pensum curriculum planner.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for catalog, eligibility and plan operations
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │               apps/pensum (THE BINARY)            │
//! │                                                   │
//! │   ┌─────────────┐            ┌─────────────┐      │
//! │   │    CLI      │            │  HTTP API   │      │
//! │   │   (clap)    │            │   (axum)    │      │
//! │   └──────┬──────┘            └──────┬──────┘      │
//! │          └──────────────┬───────────┘             │
//! │                         ▼                         │
//! │                 ┌───────────────┐                 │
//! │                 │  pensum-core  │                 │
//! │                 │  (THE LOGIC)  │                 │
//! │                 └───────────────┘                 │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! pensum --catalog cursos.csv server --host 0.0.0.0 --port 8000
//!
//! # CLI operations
//! pensum --catalog cursos.csv recommend -c MAT1031,IIC1103
//! pensum --catalog cursos.csv plan -c MAT1031 --max-credits 20 --verify
//! pensum --catalog cursos.csv mirror --db catalog.redb
//! ```

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // PENSUM_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("PENSUM_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pensum=info,pensum_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(cli::exit_code(&e));
    }
}

/// Print the Pensum startup banner.
fn print_banner() {
    println!(
        r#"
  ██████╗ ███████╗███╗   ██╗███████╗██╗   ██╗███╗   ███╗
  ██╔══██╗██╔════╝████╗  ██║██╔════╝██║   ██║████╗ ████║
  ██████╔╝█████╗  ██╔██╗ ██║███████╗██║   ██║██╔████╔██║
  ██╔═══╝ ██╔══╝  ██║╚██╗██║╚════██║██║   ██║██║╚██╔╝██║
  ██║     ███████╗██║ ╚████║███████║╚██████╔╝██║ ╚═╝ ██║
  ╚═╝     ╚══════╝╚═╝  ╚═══╝╚══════╝ ╚═════╝ ╚═╝     ╚═╝

  Academic Planning Server v{}

  Prerequisites • Credit caps • Optimal plans
"#,
        env!("CARGO_PKG_VERSION")
    );
}
