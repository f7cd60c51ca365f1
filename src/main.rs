//! Catalog-Harvest main entry point
//!
//! This is the command-line interface for the Catalog-Harvest scraper.

use anyhow::Context;
use catalog_harvest::config::{read_config_with_hash, validate, Config};
use catalog_harvest::crawler::Paginator;
use catalog_harvest::harvest;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Catalog-Harvest: a paginated catalog scraper
///
/// Crawls a paginated listing, enriches each entry from its detail page,
/// resolves shared sub-resources once, optionally downloads assets, and
/// writes the collection as JSON.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(version)]
#[command(about = "A paginated catalog scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG", env = "HARVEST_CONFIG")]
    config: PathBuf,

    /// Listing URL, overriding source.url
    #[arg(long, env = "HARVEST_SRC")]
    src: Option<String>,

    /// JSON output path, overriding output.data-path
    #[arg(long, env = "HARVEST_OUT_DATA")]
    out_data: Option<String>,

    /// Asset directory, overriding assets.dir
    #[arg(long, env = "HARVEST_OUT_ASSETS")]
    out_assets: Option<String>,

    /// Asset reference prefix, overriding assets.path-prefix
    #[arg(long, env = "HARVEST_PATH_ASSETS")]
    path_assets: Option<String>,

    /// Workers per pipeline stage, overriding pipeline.concurrency
    #[arg(long, env = "HARVEST_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without any request
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, hash) = match read_config_with_hash(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    tracing::info!("Configuration read (hash: {})", hash);

    apply_overrides(&mut config, &cli)?;
    tracing::info!("Configuration validated");

    if cli.dry_run {
        handle_dry_run(&config)?;
        return Ok(());
    }

    match harvest(config).await {
        Ok(count) => {
            tracing::info!("Harvest finished: {} records written", count);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_harvest=info,warn"),
            1 => EnvFilter::new("catalog_harvest=debug,info"),
            2 => EnvFilter::new("catalog_harvest=trace,debug"),
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

/// Applies command-line and environment overrides, then validates the result
fn apply_overrides(config: &mut Config, cli: &Cli) -> anyhow::Result<()> {
    if let Some(src) = &cli.src {
        config.source.url = src.clone();
    }
    if let Some(out_data) = &cli.out_data {
        config.output.data_path = out_data.clone();
    }
    if let Some(concurrency) = cli.concurrency {
        config.pipeline.concurrency = concurrency;
    }

    match config.assets.as_mut() {
        Some(assets) => {
            if let Some(dir) = &cli.out_assets {
                assets.dir = dir.clone();
            }
            if let Some(prefix) = &cli.path_assets {
                assets.path_prefix = prefix.clone();
            }
        }
        None if cli.out_assets.is_some() || cli.path_assets.is_some() => {
            anyhow::bail!("--out-assets/--path-assets require an [assets] section in the config");
        }
        None => {}
    }

    validate(config).context("invalid configuration")?;
    Ok(())
}

/// Handles the --dry-run mode: shows what would be harvested
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Catalog-Harvest Dry Run ===\n");

    let source = url::Url::parse(&config.source.url)?;
    let base = catalog_harvest::crawler::base_origin(&source);
    let paginator = Paginator::new(&config.source, base.clone())?;

    println!("Source:");
    println!("  First page: {}", paginator.page_url(1));
    println!("  Base origin: {}", base);
    println!("  Full page size: {}", config.source.page_size);
    println!(
        "  404 on first page: {:?}",
        config.source.first_page_not_found
    );

    println!("\nPipeline:");
    println!("  Workers per stage: {}", config.pipeline.workers());
    println!("  User agent: {}", config.http.user_agent);

    println!("\nStages:");
    println!("  crawl: listing items '{}'", config.listing.item);
    match &config.detail {
        Some(detail) => {
            println!("  enrich: detail name '{}'", detail.name);
            for reference in &detail.references {
                println!("  resolve: {} via '{}'", reference.name, reference.selector);
            }
        }
        None => println!("  enrich: skipped"),
    }
    match &config.assets {
        Some(assets) => println!(
            "  download: into {} as {}/<file>",
            assets.dir, assets.path_prefix
        ),
        None => println!("  download: skipped"),
    }

    println!("\nOutput:");
    println!("  Data: {}", config.output.data_path);

    println!("\n✓ Configuration is valid");
    Ok(())
}
