//! bulkops - Run batched bulk operations with progress, cancellation and retry.
//!
//! Usage:
//!   bulkops run ITEMS.json           Run simulated operations over the items
//!   bulkops config                   Print the effective configuration
//!   bulkops --help                   Show help

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};
use dashmap::DashMap;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use bulkops_core::{BulkConfig, BulkProgress, BulkResult};
use bulkops_engine::BulkOperation;

#[derive(Parser)]
#[command(
    name = "bulkops",
    version,
    about = "Run batched bulk operations",
    long_about = "bulkops runs an operation over a list of items in fixed-size batches,\n\
                  reporting progress per item and supporting cancellation and retry of\n\
                  failed items. Operations are simulated from the item file."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run simulated operations over a JSON item list
    Run {
        /// JSON file containing the items
        items: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,

        /// Retry failed items once after the run
        #[arg(short, long)]
        retry: bool,

        /// Cancel the run once this many items have settled
        #[arg(long)]
        cancel_after: Option<usize>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the effective configuration as TOML
    Config {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[derive(Args)]
struct ConfigArgs {
    /// TOML file with `batch_size` and `delay_between_batches_ms`
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum operations in flight per batch
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Pause between batches in milliseconds
    #[arg(short, long)]
    delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// A simulated work item.
#[derive(Debug, Clone, Deserialize)]
struct SimulatedItem {
    id: String,
    #[serde(default)]
    label: Option<String>,
    /// How long the operation takes.
    #[serde(default)]
    latency_ms: u64,
    /// Failure message; the operation fails while attempts remain.
    #[serde(default)]
    fail: Option<String>,
    /// Number of attempts that fail before the item succeeds.
    #[serde(default = "default_fail_attempts")]
    fail_attempts: usize,
}

fn default_fail_attempts() -> usize {
    1
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            items,
            config,
            retry,
            cancel_after,
            format,
        } => {
            let config = resolve_config(&config)?;
            run_items(&items, config, retry, cancel_after, format).await?;
        }
        Command::Config { config } => {
            let config = resolve_config(&config)?;
            print!("{}", toml::to_string(&config)?);
        }
    }

    Ok(())
}

/// Load the config file (if any) and apply command-line overrides.
fn resolve_config(args: &ConfigArgs) -> Result<BulkConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => BulkConfig::default(),
    };

    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(delay_ms) = args.delay_ms {
        config.delay_between_batches_ms = delay_ms;
    }

    config.validate()?;
    tracing::debug!(?config, "Resolved configuration");
    Ok(config)
}

fn load_config(path: &Path) -> Result<BulkConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}

fn load_items(path: &Path) -> Result<Vec<SimulatedItem>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read items {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid item list {}", path.display()))
}

/// Build an engine whose operation replays each item's simulated outcome.
fn build_engine(
    items: Vec<SimulatedItem>,
    config: BulkConfig,
    quiet: bool,
) -> Result<BulkOperation<SimulatedItem>> {
    let attempts: Arc<DashMap<String, usize>> = Arc::new(DashMap::new());

    let engine = BulkOperation::new(
        items,
        |item: &SimulatedItem| item.id.clone(),
        |item: &SimulatedItem| item.label.clone().unwrap_or_else(|| item.id.clone()),
        move |item: SimulatedItem| {
            let attempt = {
                let mut count = attempts.entry(item.id.clone()).or_insert(0);
                *count += 1;
                *count
            };
            async move {
                if item.latency_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(item.latency_ms)).await;
                }
                match item.fail {
                    Some(message) if attempt <= item.fail_attempts => Err(message),
                    _ => Ok(()),
                }
            }
        },
        config,
    )?;

    Ok(engine.with_on_progress(move |progress| {
        if !quiet {
            eprintln!("{}", format_progress(progress));
        }
    }))
}

async fn run_items(
    path: &Path,
    config: BulkConfig,
    retry: bool,
    cancel_after: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let items = load_items(path)?;
    let quiet = matches!(format, OutputFormat::Json);

    if !quiet {
        eprintln!(
            "Running {} items (batch size {}, {}ms between batches)...",
            items.len(),
            config.batch_size,
            config.delay_between_batches_ms
        );
    }

    let engine = build_engine(items, config, quiet)?;
    let mut result = execute_with_cancel(&engine, cancel_after).await?;

    if retry && result.failed > 0 {
        if !quiet {
            eprintln!("Retrying {} failed items...", result.failed);
        }
        result = engine.retry_failed().await?;
    }

    match format {
        OutputFormat::Text => print_result(&result),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }

    if result.cancelled {
        return Err(eyre!("Run cancelled: {}", result.summary()));
    }
    Ok(())
}

/// Execute, cancelling once `cancel_after` items have settled.
async fn execute_with_cancel(
    engine: &BulkOperation<SimulatedItem>,
    cancel_after: Option<usize>,
) -> Result<BulkResult> {
    let Some(limit) = cancel_after else {
        return Ok(engine.execute().await?);
    };

    let mut rx = engine.subscribe();
    let run = engine.execute();
    tokio::pin!(run);

    loop {
        tokio::select! {
            result = &mut run => return Ok(result?),
            changed = rx.changed() => {
                if changed.is_err() {
                    continue;
                }
                let settled = rx.borrow_and_update().progress().completed;
                if settled >= limit {
                    engine.cancel();
                }
            }
        }
    }
}

fn format_progress(progress: &BulkProgress) -> String {
    format!(
        "[{}/{}] {:>5.1}%  {} ok, {} failed",
        progress.completed,
        progress.total,
        progress.percentage,
        progress.successful,
        progress.failed
    )
}

fn print_result(result: &BulkResult) {
    println!();
    println!("{}", "─".repeat(60));
    println!(" {}", result.summary());
    println!(
        " Finished in {:.2}s",
        (result.finished_at - result.started_at)
            .to_std()
            .unwrap_or_default()
            .as_secs_f64()
    );
    println!("{}", "─".repeat(60));

    for item in result.items.iter().filter(|item| item.is_error()) {
        println!(
            "   {} ({}): {}",
            item.label,
            item.id,
            item.error.as_deref().unwrap_or_default()
        );
    }
}
