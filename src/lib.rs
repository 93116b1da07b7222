//! Larch - a postal-code gazetteer backed by SQLite
//!
//! This library provides shared types and modules for the ingest and query binaries.

pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod parser;
pub mod remote;

pub use config::Config;
pub use db::Store;
pub use error::{Error, Result};
pub use import::Importer;
pub use models::{CountryCount, Geolocation, Location, Placemark};
