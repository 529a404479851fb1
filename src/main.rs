//! Catalog-Ingest main entry point
//!
//! This is the command-line interface for the catalog detail ingestion pipeline.

use catalog_ingest::config::{load_config_with_hash, Config};
use catalog_ingest::ingest::{load_catalog, Pipeline, RetryPolicy};
use catalog_ingest::output::{load_statistics, print_plan, print_run_report, print_statistics};
use catalog_ingest::source::{build_http_client, StoreApi};
use catalog_ingest::storage::{open_storage, Storage};
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Catalog-Ingest: incremental detail ingestion for a large catalog
///
/// Fetches genres, categories, store tags and prices for every catalog entity
/// in paced batches and commits each batch atomically. Interrupted runs are
/// resumed by running again; progress is derived from the database.
#[derive(Parser, Debug)]
#[command(name = "catalog-ingest")]
#[command(version)]
#[command(about = "Incremental catalog detail ingestion", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Clear previously ingested details before running
    #[arg(long)]
    fresh: bool,

    /// Validate config and show the pending frontier without fetching
    #[arg(long, conflicts_with_all = ["stats", "load_catalog"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "load_catalog", "fresh"])]
    stats: bool,

    /// Fetch the catalog into the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "fresh"])]
    load_catalog: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        let cancel = CancellationToken::new();
        spawn_interrupt_handler(cancel.clone());

        if cli.load_catalog {
            handle_load_catalog(&config, &cancel).await?;
        } else {
            handle_ingest(&config, cli.fresh, &cancel).await?;
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_ingest=info,warn"),
            1 => EnvFilter::new("catalog_ingest=debug,info"),
            2 => EnvFilter::new("catalog_ingest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Cancels the run on the first Ctrl-C
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current step");
            cancel.cancel();
        }
    });
}

/// Handles the --dry-run mode: validates config and shows the pending work
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Catalog-Ingest Dry Run ===\n");

    let ingest = &config.ingest;
    println!("Ingest Configuration:");
    println!("  Batch size: {}", ingest.batch_size);
    println!("  Inter-fetch delay: {}s", ingest.inter_fetch_delay_seconds);
    println!("  Inter-batch delay: {}s", ingest.inter_batch_delay_seconds);
    println!(
        "  Retries: {} attempts, {:?} backoff from {}s up to {}s",
        ingest.max_fetch_attempts,
        ingest.retry_strategy,
        ingest.retry_base_delay_seconds,
        ingest.retry_max_delay_seconds
    );
    println!("  Fetch tags: {}", ingest.fetch_tags);
    if let Some(range) = ingest.id_range {
        println!("  Id range: [{}, {})", range.start, range.end);
    }

    println!("\nSource:");
    println!("  Details: {}", config.source.details_url);
    println!("  Store pages: {}", config.source.store_page_url);
    println!("  Country: {}", config.source.country_code);

    println!("\nDatabase: {}\n", config.storage.database_path);

    let pipeline = Pipeline::from_config(config)?;
    let plan = pipeline.plan()?;
    print_plan(&plan, ingest.batch_size);

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.storage.database_path);

    let storage = open_storage(Path::new(&config.storage.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --load-catalog mode: seeds the entity table
async fn handle_load_catalog(
    config: &Config,
    cancel: &CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = build_http_client(&config.source)?;
    let source = StoreApi::new(client, &config.source);
    let mut storage = open_storage(Path::new(&config.storage.database_path))?;
    let policy = RetryPolicy::from_config(&config.ingest);

    match load_catalog(&source, &mut storage, &policy, cancel).await {
        Ok(report) => {
            println!(
                "✓ Catalog loaded: {} entries, {} unique, {} new",
                report.fetched, report.unique, report.inserted
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Catalog load failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the main ingestion run
async fn handle_ingest(
    config: &Config,
    fresh: bool,
    cancel: &CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut pipeline = Pipeline::from_config(config)?;

    if fresh {
        tracing::info!("Clearing previously ingested details");
        pipeline.storage_mut().clear_ingested()?;
    }

    match pipeline.run(cancel).await {
        Ok(report) => {
            print_run_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Ingestion failed: {}", e);
            Err(e.into())
        }
    }
}
