//! # INSEPA - Sequential Indexing Editor
//!
//! The main binary for the INSEPA indexing engine.
//!
//! This application provides:
//! - CLI interface for namespace, block, pool and CB operations
//! - TOML configuration for document locations
//! - Single-writer persistence of the two JSON documents
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 apps/insepa (THE BINARY)                 │
//! │                                                          │
//! │  ┌─────────────┐   ┌─────────────┐   ┌───────────────┐   │
//! │  │    CLI      │   │   Config    │   │ DocumentStore │   │
//! │  │   (clap)    │   │   (toml)    │   │ (tokio Mutex) │   │
//! │  └──────┬──────┘   └──────┬──────┘   └───────┬───────┘   │
//! │         └─────────────────┼──────────────────┘           │
//! │                           ▼                              │
//! │                   ┌───────────────┐                      │
//! │                   │  insepa-core  │                      │
//! │                   │  (THE LOGIC)  │                      │
//! │                   └───────────────┘                      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! insepa init
//! insepa mae add "Gênesis"
//! insepa block save -n 1 "Olá Adam." --context "Saudação" -o "Olá, minha criadora."
//! insepa cb set -n 1 disponivel "1, 2"
//! insepa cb trigger -n 1 1 2
//! ```

use clap::Parser;
use insepa::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // INSEPA_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("INSEPA_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "insepa=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the INSEPA startup banner.
fn print_banner() {
    println!(
        r#"
  ██╗███╗   ██╗███████╗███████╗██████╗  █████╗
  ██║████╗  ██║██╔════╝██╔════╝██╔══██╗██╔══██╗
  ██║██╔██╗ ██║███████╗█████╗  ██████╔╝███████║
  ██║██║╚██╗██║╚════██║██╔══╝  ██╔═══╝ ██╔══██║
  ██║██║ ╚████║███████║███████╗██║     ██║  ██║
  ╚═╝╚═╝  ╚═══╝╚══════╝╚══════╝╚═╝     ╚═╝  ╚═╝

  Sequential Indexing Editor v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
