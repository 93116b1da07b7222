//! Postal dump import pipeline.
//!
//! Decides whether the local database is stale, downloads and extracts the
//! archive when the remote copy is newer, and bulk-loads the dump in chunks.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use larch::config::Config;
use larch::import::Importer;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Import the postal dump into a SQLite database")]
struct Args {
    /// Tab-separated input file (defaults to <save-dir>/allCountries.txt)
    #[arg(long)]
    input_file: Option<PathBuf>,

    /// SQLite database file (defaults to <save-dir>/locations.db)
    #[arg(long)]
    db_file: Option<PathBuf>,

    /// Optional TOML config file; CLI flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Remote archive URL
    #[arg(long)]
    url: Option<String>,

    /// Rows per parsed chunk (one chunk = one insert transaction)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = build_config(&args)?;

    info!("Larch Import Pipeline");
    info!(
        "Importing {} into {}",
        config.data_path().display(),
        config.db_path().display()
    );

    let importer = Importer::new(config);
    let store = importer.run().await.context("Import failed")?;

    let total_entries = store.total_entries().await?;
    let country_count = store.country_count().await?;
    store.close().await;

    println!("Data import completed successfully.");
    println!("Total entries in database: {}", total_entries);
    println!("Number of countries: {}", country_count);

    Ok(())
}

fn build_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path).context("Failed to load config file")?,
        None => Config::default(),
    };

    if let Some(input_file) = &args.input_file {
        config.data_file = Some(input_file.clone());
        // The archive lives next to the dump it extracts to.
        if config.archive_file.is_none() {
            config.archive_file = Some(input_file.with_extension("zip"));
        }
    }
    if let Some(db_file) = &args.db_file {
        config.db_file = Some(db_file.clone());
    }
    if let Some(url) = &args.url {
        config.url = url.clone();
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }

    Ok(config)
}
