//! Command-line entry points for pinshift.

mod format;
mod output;
mod sink;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use format::{format_bytes, format_duration};
use pinshift_core::config::AppConfig;
use pinshift_pinning::{PinningClient, fetch_all};
use pinshift_transfer::{Coordinator, NodeFunding, NodeUploader, UploadError, UploadSource};
use sink::ConsoleSink;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_NAME: &str = "pinshift.log";

#[derive(Parser)]
#[command(name = "pinshift")]
#[command(about = "Export pinned CIDs and upload backups to a storage node")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, env = "PINSHIFT_CONFIG", default_value = "pinshift.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export every pinned CID to a timestamped JSON file
    ExportPins {
        /// Output directory (overrides config)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Upload a backup archive to the storage node
    Upload {
        /// Archive to upload
        file: PathBuf,
    },
    /// Show the price of uploading a file and the funded balance
    Quote {
        /// Archive to price
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let Cli { config, command } = Cli::parse();

    let config = match load_config(&config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("✗ {err:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = init_tracing(config.log_dir.as_deref()) {
        eprintln!("✗ {err:#}");
        return ExitCode::FAILURE;
    }

    let result = match command {
        Commands::ExportPins { output_dir } => handle_export_pins(&config, output_dir).await,
        Commands::Upload { file } => handle_upload(&config, &file).await,
        Commands::Quote { file } => handle_quote(&config, &file).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("✗ {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Load configuration (file is optional, env vars can provide/override everything).
fn load_config(path: &Path) -> Result<AppConfig> {
    let mut figment = Figment::new();

    if path.exists() {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("PINSHIFT_").split("__"));

    let config: AppConfig = figment
        .extract()
        .context("failed to load configuration")?;
    for warning in config.validate().context("invalid configuration")? {
        eprintln!("warning: {warning}");
    }
    Ok(config)
}

/// Console output at `RUST_LOG` (default info); the log file, when
/// configured, also receives debug lines such as throttled progress.
fn init_tracing(log_dir: Option<&Path>) -> Result<()> {
    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()));

    let file = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            let path = dir.join(LOG_FILE_NAME);
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file))
                    .with_filter(LevelFilter::DEBUG),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .context("failed to initialize logging")?;
    Ok(())
}

async fn handle_export_pins(config: &AppConfig, output_dir: Option<PathBuf>) -> Result<()> {
    let jwt = config
        .pinning
        .jwt
        .as_deref()
        .context("pinning service JWT not configured (set PINSHIFT_PINNING__JWT)")?;
    let client = PinningClient::new(&config.pinning.api_url, jwt)?;

    tracing::info!(api_url = %config.pinning.api_url, "Exporting pinned CIDs");
    let pins = fetch_all(&client, config.pinning.page_limit)
        .await
        .context("pin listing failed")?;

    let dir = output_dir.unwrap_or_else(|| config.output_dir.clone());
    let path = output::write_export(&dir, &pins).await?;

    tracing::info!(count = pins.len(), path = %path.display(), "Pin export written");
    println!("✓ Exported {} pinned CIDs to {}", pins.len(), path.display());
    Ok(())
}

fn build_coordinator(config: &AppConfig) -> Result<Coordinator<NodeUploader, NodeFunding>> {
    let uploader = NodeUploader::builder(&config.node.url, &config.node.currency)
        .token(config.node.token.clone())
        .chunk_size(config.upload.chunk_size)
        .concurrency(config.upload.concurrency)
        .max_retries(config.upload.max_chunk_retries)
        .build()?;
    let funding = NodeFunding::new(
        &config.node.url,
        &config.node.currency,
        config.node.address.clone(),
    )?;
    Ok(Coordinator::builder(uploader, funding)
        .report_interval(config.upload.report_interval())
        .build()?)
}

async fn open_source(file: &Path) -> Result<UploadSource> {
    match UploadSource::open(file).await {
        Ok(source) => Ok(source),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            anyhow::bail!("file not found: {}", file.display())
        }
        Err(err) => Err(err).with_context(|| format!("failed to open {}", file.display())),
    }
}

async fn handle_upload(config: &AppConfig, file: &Path) -> Result<()> {
    let source = open_source(file).await?;
    let decimals = config.node.decimals;
    let currency = &config.node.currency;

    tracing::info!(
        file = %file.display(),
        size = %format_bytes(source.total_size()),
        node = %config.node.url,
        "Preparing upload"
    );

    let coordinator = build_coordinator(config)?;
    let receipt = match coordinator.upload_with_sink(source, ConsoleSink).await {
        Ok(receipt) => receipt,
        Err(UploadError::InsufficientBalance {
            price,
            balance,
            deficit,
        }) => anyhow::bail!(
            "insufficient balance: price {} {currency}, balance {} {currency}, short by {} atomic units ({} {currency})",
            price.display_with_decimals(decimals),
            balance.display_with_decimals(decimals),
            deficit,
            deficit.display_with_decimals(decimals),
        ),
        Err(err) => return Err(err.into()),
    };

    println!(
        "✓ Uploaded {} in {} ({} chunks, {} retried attempts)",
        format_bytes(receipt.total_bytes),
        format_duration(receipt.elapsed),
        receipt.chunks,
        receipt.chunk_errors
    );
    println!("  Transaction: {}", receipt.transaction_id);
    println!(
        "  Cost: {} {currency}",
        receipt.price.display_with_decimals(decimals)
    );
    Ok(())
}

async fn handle_quote(config: &AppConfig, file: &Path) -> Result<()> {
    let source = open_source(file).await?;
    let decimals = config.node.decimals;
    let currency = &config.node.currency;

    let coordinator = build_coordinator(config)?;
    let quote = coordinator.quote(source.total_size()).await?;

    println!("Size:    {}", format_bytes(quote.bytes));
    println!(
        "Price:   {} {currency} ({} atomic units)",
        quote.price.display_with_decimals(decimals),
        quote.price
    );
    println!(
        "Balance: {} {currency} ({} atomic units)",
        quote.balance.display_with_decimals(decimals),
        quote.balance
    );
    match quote.deficit() {
        Some(deficit) => println!(
            "Short by {} {currency} ({} atomic units)",
            deficit.display_with_decimals(decimals),
            deficit
        ),
        None => println!("Balance covers this upload"),
    }
    Ok(())
}
