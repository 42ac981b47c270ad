//! paged-fetch command line.
//!
//! # Architecture Overview
//!
//! ```text
//!   PageRequest ──▶ feed ──▶ DataSource ──▶ RetryPolicy ──▶ GET ?page=N
//!                    ▲            │                               │
//!                    │            ▼                               │
//!               rows, state  PageResult ◀── ApiPage | FetchError ◀┘
//!
//!   cross-cutting: config (TOML, validated) · observability (tracing, metrics)
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use paged_fetch::config::{load_config, FetchConfig};
use paged_fetch::observability::logging::init_logging;
use paged_fetch::source::{DataSource, PageRequest, SortDirection};

#[derive(Parser)]
#[command(name = "paged-fetch")]
#[command(about = "Fetch pages of sortable remote tables", long_about = None)]
struct Cli {
    /// TOML configuration file. Built-in endpoints are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured log level.
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured endpoints
    Endpoints,
    /// Fetch one page from an endpoint
    Fetch {
        /// Endpoint name, e.g. `activities` or `suppliers`
        endpoint: String,

        #[arg(short, long, default_value_t = 0)]
        page: u32,

        /// Column to sort by (ignored by endpoints that do not honor sort)
        #[arg(short, long, default_value = "")]
        sort: String,

        /// asc, desc or none
        #[arg(short, long, default_value = "none")]
        direction: SortDirection,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => FetchConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }

    init_logging(&config.observability)?;

    tracing::debug!(
        endpoints = config.endpoints.len(),
        max_attempts = config.retries.max_attempts,
        base_delay_ms = config.retries.base_delay_ms,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Endpoints => {
            println!("{}", serde_json::to_string_pretty(&config.endpoints)?);
        }
        Commands::Fetch {
            endpoint,
            page,
            sort,
            direction,
        } => {
            let Some(endpoint) = config.endpoint(&endpoint).cloned() else {
                return Err(format!("unknown endpoint '{}'", endpoint).into());
            };

            let source = DataSource::from_config(&config)?;
            let result = source
                .fetch_page(&endpoint, &PageRequest::new(sort, direction, page))
                .await;

            if !result.succeeded {
                eprintln!("Results unavailable: rate limit reached or API error");
            }
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
