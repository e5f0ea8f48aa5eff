//! Reel-Harvest main entry point
//!
//! This is the command-line interface for the Reel-Harvest catalogue harvester.

use clap::Parser;
use reel_harvest::config::{load_config_with_hash, Config};
use reel_harvest::crawler::{crawl, WorkerPool};
use reel_harvest::url::listing_page_url;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Reel-Harvest: a paginated catalogue harvester
///
/// Reel-Harvest walks the numbered listing pages of a catalogue site with a
/// fixed pool of workers, extracts one record per detail page, and stores
/// each record once in a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "reel-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A paginated catalogue harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Number of listing pages to crawl (overrides crawler.total-pages)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pages: Option<u32>,

    /// Number of concurrent workers (overrides crawler.workers)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..=256))]
    workers: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let total_pages = cli.pages.unwrap_or(config.crawler.total_pages);
    let workers = cli.workers.unwrap_or(config.crawler.workers);

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, total_pages, workers)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, total_pages, workers, &config_hash).await?;
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
            0 => EnvFilter::new("reel_harvest=info,warn"),
            1 => EnvFilter::new("reel_harvest=debug,info"),
            2 => EnvFilter::new("reel_harvest=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(
    config: &Config,
    total_pages: u32,
    workers: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Reel-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Base URL: {}", config.crawler.base_url);
    println!("  Category: {}", config.crawler.category);
    println!("  Pages: {}", total_pages);
    println!("  Workers: {}", workers);
    println!("  Page size: {}", config.crawler.page_size);
    println!("  Fetch retries: {}", config.crawler.fetch_retries);
    println!(
        "  Listing attempts: {} (backoff from {}ms)",
        config.crawler.resolve_attempts, config.crawler.resolve_backoff_ms
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    let first = listing_page_url(&config.crawler.base_url, &config.crawler.category, 1)?;
    let last = listing_page_url(
        &config.crawler.base_url,
        &config.crawler.category,
        total_pages,
    )?;
    println!("\nListing Pages:");
    println!("  First: {}", first);
    println!("  Last: {}", last);

    let pool = WorkerPool::new(workers as usize, config.crawler.page_size);

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would queue {} tasks for {} workers",
        pool.total_tasks(total_pages),
        pool.workers()
    );

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use reel_harvest::output::{load_statistics, print_statistics};
    use reel_harvest::storage::open_storage;
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    // Open the database
    let storage = open_storage(Path::new(&config.output.database_path))?;

    // Load statistics
    let stats = load_statistics(&storage)?;

    // Print statistics
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    total_pages: u32,
    workers: u32,
    config_hash: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Harvesting {} pages of {}/{} with {} workers",
        total_pages,
        config.crawler.base_url,
        config.crawler.category,
        workers
    );

    // Run the crawler
    match crawl(config, total_pages, workers as usize, config_hash).await {
        Ok(report) => {
            tracing::info!(
                "Crawl completed: {} tasks succeeded, {} skipped",
                report.completed,
                report.failed
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
