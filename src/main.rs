use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pagedal::common::DalConfig;
use pagedal::storage::disk::Dal;

/// Pagedal - exercise a page-oriented data access layer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Backing data file
    #[arg(short, long, default_value = "test.db")]
    path: PathBuf,

    /// Configuration file (TOML) with page_size and max_pages
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Bytes per page, overrides the configuration file
    #[arg(long)]
    page_size: Option<usize>,

    /// Total addressable pages, overrides the configuration file
    #[arg(long)]
    max_pages: Option<usize>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let config = load_config(&args)?;
    run_scenario(&args.path, config)
}

fn init_logging(args: &Args) {
    let level = if args.verbose { "debug" } else { args.log_level.as_str() };

    let filter = EnvFilter::try_new(format!("pagedal={level}"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

fn load_config(args: &Args) -> Result<DalConfig> {
    let mut config = match &args.config {
        Some(path) => DalConfig::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => DalConfig::default(),
    };

    if let Some(page_size) = args.page_size {
        config.page_size = page_size;
    }
    if let Some(max_pages) = args.max_pages {
        config.max_pages = max_pages;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Allocate, release and reallocate a page, write it, then read it back
/// through a reopened file.
fn run_scenario(path: &Path, config: DalConfig) -> Result<()> {
    println!("Pagedal - a page-oriented data access layer");
    println!("===========================================\n");

    let mut dal = Dal::create(path, config)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    println!(
        "Created {} (page size {}, {} pages)",
        path.display(),
        config.page_size,
        config.max_pages
    );

    let page_id = dal.allocate_page_id()?;
    println!("Allocated page: {}", page_id);

    dal.release_page_id(page_id)?;
    let reused = dal.allocate_page_id()?;
    println!("Released and reallocated: {}", reused);

    let mut page = dal.allocate_empty_page()?;
    page.set_id(reused);
    page.write_at(0, b"data")?;
    dal.write_page(&page).context("Failed to write page")?;
    dal.close()?;
    info!(%reused, "page written and file closed");

    let mut dal = Dal::open(path, config)
        .with_context(|| format!("Failed to reopen {}", path.display()))?;
    let read = dal.read_page(reused).context("Failed to read page")?;
    dal.close()?;

    ensure!(
        &read.payload()[..4] == b"data",
        "page {} came back with unexpected contents",
        reused
    );
    println!(
        "Read back {}: {:?}",
        read.id(),
        String::from_utf8_lossy(&read.payload()[..4])
    );

    println!("\nDemo completed successfully!");
    Ok(())
}
