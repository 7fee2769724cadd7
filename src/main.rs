use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use claims_intake::config::Config;
use claims_intake::logging::{init_console_logging, init_logging};
use claims_intake::metrics::init_metrics;
use claims_intake::pipeline::ingestion::decode;
use claims_intake::pipeline::storage::build_storage;
use claims_intake::pipeline::BatchAssembler;
use claims_intake::rate_limiter::RateLimiter;
use claims_intake::server::{start_server, AppState};

#[derive(Parser)]
#[command(name = "claims_intake")]
#[command(about = "Dental claims intake service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Port to listen on (overrides config and CLAIMS_PORT)
        #[arg(long)]
        port: Option<u16>,
        /// Path to a TOML config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Check a CSV upload offline without storing anything
    Validate {
        file: PathBuf,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::from_path(path)?.with_env()?,
        None => Config::load()?,
    };
    Ok(config)
}

async fn serve(port: Option<u16>, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path.as_ref())?;
    let _guard = init_logging(&config.logging);
    init_metrics();

    let storage = build_storage(&config.storage)
        .await
        .context("failed to initialize claim storage")?;
    let limiter = RateLimiter::new(config.rate_limit.max_requests, config.rate_limit.window());
    let port = port.unwrap_or(config.server.port);

    info!(
        "Starting claims intake on port {} ({:?} storage)",
        port, config.storage.backend
    );
    start_server(AppState::new(storage, limiter), port).await?;
    Ok(())
}

fn validate(file: PathBuf) -> anyhow::Result<()> {
    let config = load_config(None)?;
    init_console_logging(&config.logging);

    let content =
        std::fs::read(&file).with_context(|| format!("failed to read {}", file.display()))?;
    let rows = decode(&content)?;
    let outcomes = BatchAssembler::new().evaluate(&rows);

    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(claim) => println!(
                "row {}: ok  npi={} procedure={} net_fee={}",
                outcome.row,
                claim.fields().provider_npi,
                claim.fields().submitted_procedure,
                claim.net_fee()
            ),
            Err(e) => {
                failed += 1;
                println!("row {}: FAILED {}", outcome.row, e);
            }
        }
    }

    println!("\n{} row(s), {} valid, {} invalid", outcomes.len(), outcomes.len() - failed, failed);
    if failed > 0 {
        error!("{} would be rejected", file.display());
        bail!("{failed} invalid row(s); the upload would be rejected");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, config } => serve(port, config).await,
        Commands::Validate { file } => validate(file),
    }
}
