//! # cdash-runner
//!
//! Command-line entry point for the crypto dashboard data backend.
//!
//! Loads a JSON configuration file, builds the priority fallback client from
//! the configured endpoints, and prints JSON envelopes to stdout.
//!
//! # Usage
//!
//! ```bash
//! cdash-runner config.json markets --per-page 20
//! cdash-runner config.json custom-add --name "Moon Coin" --symbol moon
//! cdash-runner config.json --log-level debug sources
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use cdash_md::NormalizerRegistry;
use cdash_runner::{
    CustomCryptoStore, MarketService, NewCryptoForm, PlaceholderLogo, listing_params,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;

/// Crypto Dashboard Data Backend.
#[derive(Parser)]
#[command(name = "cdash-runner", about = "Crypto Dashboard Data Backend")]
struct Cli {
    /// Configuration file path (JSON).
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Optional log directory for file output (overrides `app.log_path`).
    #[arg(long)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the market listing through the endpoint chain.
    Markets {
        #[arg(long, default_value = "usd")]
        vs_currency: String,
        #[arg(long, default_value = "market_cap_desc")]
        order: String,
        #[arg(long, default_value_t = 100)]
        per_page: u32,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// List user-submitted entries.
    CustomList,
    /// Submit a new entry.
    CustomAdd {
        #[arg(long)]
        name: String,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        website: Option<String>,
        #[arg(long)]
        twitter: Option<String>,
        #[arg(long)]
        github: Option<String>,
    },
    /// Show registered endpoints and normalizers.
    Sources,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EndpointInfo {
    name: String,
    priority: i32,
    timeout_ms: u64,
}

#[derive(Serialize)]
struct SourcesBody {
    endpoints: Vec<EndpointInfo>,
    normalizers: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // 1. Load configuration
    let config = cdash_core::config::load_config(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;

    // 2. Initialize logging
    let log_dir = cli.log_dir.clone().or_else(|| config.log_path());
    cdash_core::logging::init_logging(&cli.log_level, log_dir.as_deref(), &config.module_name());
    info!("cdash-runner starting, config={}, log_level={}", cli.config.display(), cli.log_level);

    // 3. Build the pipeline
    let registry = Arc::new(NormalizerRegistry::with_defaults());
    let client = cdash_src::build_client(&config, Arc::clone(&registry))?;
    info!("{} endpoint(s) registered", client.endpoints().len());

    let store = match &config.custom_store_path {
        Some(path) => CustomCryptoStore::open(path)?,
        None => CustomCryptoStore::in_memory(),
    };
    let placeholder = config.effective_placeholder_logo();
    let service = MarketService::new(
        Arc::new(client),
        Arc::new(RwLock::new(store)),
        Arc::new(PlaceholderLogo::new(placeholder.clone())),
        placeholder,
    );

    // 4. Run the command
    let ok = match cli.command {
        Command::Markets { vs_currency, order, per_page, page } => {
            let params = listing_params(&vs_currency, &order, per_page, page);
            let envelope = service.markets(&params).await;
            print_json(&envelope)?;
            envelope.is_success()
        }
        Command::CustomList => {
            let envelope = service.custom_list().await;
            print_json(&envelope)?;
            envelope.is_success()
        }
        Command::CustomAdd { name, symbol, image, description, website, twitter, github } => {
            let form = NewCryptoForm { name, symbol, image, description, website, twitter, github };
            let envelope = service.add_custom(form).await;
            print_json(&envelope)?;
            envelope.is_success()
        }
        Command::Sources => {
            let endpoints = service
                .client()
                .endpoints()
                .iter()
                .map(|e| EndpointInfo {
                    name: e.name.clone(),
                    priority: e.priority,
                    timeout_ms: u64::try_from(e.timeout.as_millis()).unwrap_or(u64::MAX),
                })
                .collect();
            print_json(&SourcesBody { endpoints, normalizers: registry.registered_sources() })?;
            true
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
