//! Estate-Harvest main entry point
//!
//! This is the command-line interface for the Estate-Harvest listing harvester.

use anyhow::Context;
use clap::Parser;
use estate_harvest::config::{load_config_with_hash, Config};
use estate_harvest::crawler::{harvest, HarvestOptions};
use estate_harvest::output::{build_sinks, RunStatus, Sink};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Estate-Harvest: an incremental real-estate listing harvester
///
/// Estate-Harvest walks paginated listing categories, follows every listing
/// to its detail page, and checkpoints a deduplicated, normalized dataset to
/// CSV, JSON and SQLite while the crawl progresses.
#[derive(Parser, Debug)]
#[command(name = "estate-harvest")]
#[command(version = "1.0.0")]
#[command(about = "An incremental real-estate listing harvester", long_about = None)]
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

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the listing database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Only crawl the given listing type (repeatable)
    #[arg(long = "category", value_name = "TYPE")]
    categories: Vec<String>,

    /// Crawl categories one after another instead of concurrently
    #[arg(long)]
    sequential: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let options = HarvestOptions {
        only: cli.categories,
        sequential: cli.sequential,
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, &options);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_harvest(&config, &config_hash, &options).await?;
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
            0 => EnvFilter::new("estate_harvest=info,warn"),
            1 => EnvFilter::new("estate_harvest=debug,info"),
            2 => EnvFilter::new("estate_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows the validated configuration
fn handle_dry_run(config: &Config, options: &HarvestOptions) {
    println!("=== Estate-Harvest Dry Run ===\n");

    let crawler = &config.crawler;
    println!("Crawler Configuration:");
    println!("  Concurrent detail fetches: {}", crawler.max_concurrent_details);
    println!(
        "  Retries: {} (backoff {}ms, rate-limit cooldown {}ms)",
        crawler.max_retries, crawler.base_backoff_ms, crawler.rate_limit_cooldown_ms
    );
    println!("  Request timeout: {}s", crawler.request_timeout_secs);
    println!("  Page delay: {}ms", crawler.page_delay_ms);
    println!("  Minimum items per page: {}", crawler.min_items_per_page);
    println!("  Checkpoint every: {} records", crawler.checkpoint_every);
    println!("  Images per listing: {}", crawler.max_images);

    println!("\nSite:");
    println!("  Name: {}", config.site.name);
    println!("  Root URL: {}", config.site.root_url);
    println!("  Media host: {}", config.site.media_host);
    println!("  Country code: +{}", config.site.country_code);
    if !config.site.allowed_domains.is_empty() {
        println!("  Also allowed: {}", config.site.allowed_domains.join(", "));
    }

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    let formats: Vec<String> = config
        .output
        .formats
        .iter()
        .map(|format| format!("{:?}", format).to_lowercase())
        .collect();
    println!("  Formats: {}", formats.join(", "));
    println!("  Database: {}", config.output.database_path);

    println!("\nCategories ({}):", config.categories.len());
    for category in &config.categories {
        let selected = options.selects(category);
        let pages = category
            .max_pages
            .map_or_else(|| "unbounded".to_string(), |n| format!("max {} pages", n));
        println!(
            "  {} {} -> {} (target {}, {})",
            if selected { "-" } else { "x" },
            category.listing_type,
            category.url,
            category.target,
            pages
        );
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would harvest up to {} listings",
        config.categories.iter().map(|c| c.target).sum::<usize>()
    );
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use estate_harvest::output::{load_statistics, open_database, print_statistics};
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    let conn = open_database(Path::new(&config.output.database_path))
        .context("Failed to open listing database")?;
    let stats = load_statistics(&conn).context("Failed to load statistics")?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(
    config: &Config,
    config_hash: &str,
    options: &HarvestOptions,
) -> anyhow::Result<()> {
    tracing::info!(
        "Site: {}, categories: {}, formats: {:?}",
        config.site.name,
        config.categories.len(),
        config.output.formats
    );

    let sinks = Arc::new(build_sinks(config, config_hash).context("Failed to set up output sinks")?);

    let reports = tokio::select! {
        result = harvest(config, sinks.clone(), options) => match result {
            Ok(reports) => reports,
            Err(e) => {
                if let Err(e) = sinks.finalize(RunStatus::Failed) {
                    tracing::error!("Failed to finalize sinks: {}", e);
                }
                return Err(e).context("Harvest setup failed");
            }
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, the latest checkpoints are kept");
            if let Err(e) = sinks.finalize(RunStatus::Interrupted) {
                tracing::error!("Failed to finalize sinks: {}", e);
            }
            return Ok(());
        }
    };

    for report in &reports {
        println!("{}", report);
    }
    let total: usize = reports.iter().map(|r| r.records).sum();
    tracing::info!("Harvest completed: {} records", total);

    if let Err(e) = sinks.finalize(RunStatus::Completed) {
        tracing::error!("Failed to finalize sinks: {}", e);
    }

    Ok(())
}
