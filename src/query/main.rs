//! Query CLI for the postal gazetteer.
//!
//! `search` runs one lookup against an existing database; `stats` prints
//! aggregate statistics. Both tell a missing database apart from an empty
//! result set.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use larch::config::DEFAULT_RESULT_LIMIT;
use larch::db::Store;

mod criteria;
use criteria::{resolve, Criteria};

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Query the postal gazetteer database")]
struct Args {
    /// SQLite database file
    #[arg(long, default_value = "data/locations.db")]
    db_file: PathBuf,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search for locations with exactly one criteria group
    Search {
        /// Place name substring (case-insensitive)
        #[arg(long)]
        name: Option<String>,

        /// Postal code to search for; needs --country-code
        #[arg(long)]
        postal_code: Option<String>,

        /// Two-letter country code
        #[arg(long)]
        country_code: Option<String>,

        /// Latitude for coordinate search
        #[arg(long)]
        lat: Option<f64>,

        /// Longitude for coordinate search
        #[arg(long)]
        lon: Option<f64>,

        /// Search radius in km for coordinate search
        #[arg(long, default_value_t = 10.0)]
        radius: f64,

        /// Result cap for coordinate search
        #[arg(long, default_value_t = DEFAULT_RESULT_LIMIT)]
        limit: u32,
    },

    /// Display statistics about the database
    Stats,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let level = if args.debug { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if !args.db_file.exists() {
        println!(
            "Database file not found at {}. Run the ingest command first.",
            args.db_file.display()
        );
        return Ok(ExitCode::FAILURE);
    }

    let store = Store::open(&args.db_file).await?;
    if !store.table_exists().await? {
        println!("Database tables not found. Run the ingest command first.");
        return Ok(ExitCode::FAILURE);
    }

    match args.command {
        Command::Search {
            name,
            postal_code,
            country_code,
            lat,
            lon,
            radius,
            limit,
        } => {
            let criteria = resolve(name, postal_code, country_code, lat, lon, radius)?;
            debug!("searching with {:?}", criteria);
            run_search(&store, criteria, limit).await?;
        }
        Command::Stats => run_stats(&store).await?,
    }

    Ok(ExitCode::SUCCESS)
}

async fn run_search(store: &Store, criteria: Criteria, limit: u32) -> Result<()> {
    let results: Vec<serde_json::Value> = match criteria {
        Criteria::Name(name) => to_json(store.search_by_name(&name).await)?,
        Criteria::PostalCode {
            country_code,
            postal_code,
        } => to_json(store.search_by_postal_code(&country_code, &postal_code).await)?,
        Criteria::CountryCode(country_code) => {
            to_json(store.search_by_country_code(&country_code).await)?
        }
        Criteria::Coordinates {
            lat,
            lon,
            radius_km,
        } => to_json(
            store
                .search_by_coordinates(lat, lon, radius_km, limit)
                .await?,
        )?,
    };

    if results.is_empty() {
        println!("No results found");
    } else {
        for result in results {
            println!("Found: {}", result);
        }
    }

    Ok(())
}

async fn run_stats(store: &Store) -> Result<()> {
    let total_entries = store
        .total_entries()
        .await
        .context("Unable to retrieve statistics")?;
    let country_count = store
        .country_count()
        .await
        .context("Unable to retrieve statistics")?;
    let top_countries = store
        .top_countries(5)
        .await
        .context("Unable to retrieve statistics")?;

    println!("Total entries: {}", total_entries);
    println!("Number of countries: {}", country_count);
    println!("Top 5 countries by number of entries:");
    for country in top_countries {
        println!("  {}: {}", country.country_code, country.entries);
    }

    Ok(())
}

fn to_json<T: serde::Serialize>(records: Vec<T>) -> Result<Vec<serde_json::Value>> {
    records
        .into_iter()
        .map(|r| serde_json::to_value(r).map_err(Into::into))
        .collect()
}
