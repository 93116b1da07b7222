//! Runtime configuration for the import pipeline and query engine.
//!
//! A [`Config`] value is built once (defaults, TOML file, CLI overrides) and
//! passed explicitly into the orchestrator and query engine. There is no
//! process-wide configuration state.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Default GeoNames postal-code archive.
pub const DEFAULT_URL: &str = "https://download.geonames.org/export/zip/allCountries.zip";

/// Rows per parsed chunk (one chunk = one insert transaction).
pub const DEFAULT_CHUNK_SIZE: usize = 200_000;

/// Default result cap for coordinate searches.
pub const DEFAULT_RESULT_LIMIT: u32 = 100;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Remote archive URL.
    pub url: String,

    /// Directory that holds the downloaded archive, the extracted dump and
    /// the database, unless overridden per file below.
    pub save_dir: PathBuf,

    /// Rows per parsed chunk.
    pub chunk_size: usize,

    /// Explicit archive path; derived from `save_dir` when absent.
    pub archive_file: Option<PathBuf>,

    /// Explicit extracted-dump path; derived from `save_dir` when absent.
    pub data_file: Option<PathBuf>,

    /// Explicit database path; derived from `save_dir` when absent.
    pub db_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            save_dir: PathBuf::from("data"),
            chunk_size: DEFAULT_CHUNK_SIZE,
            archive_file: None,
            data_file: None,
            db_file: None,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|_| Error::NotFound(path.as_ref().to_path_buf()))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
        Ok(config)
    }

    /// Local path of the downloaded archive.
    pub fn archive_path(&self) -> PathBuf {
        self.archive_file
            .clone()
            .unwrap_or_else(|| self.save_dir.join("allCountries.zip"))
    }

    /// Local path of the extracted tab-separated dump.
    pub fn data_path(&self) -> PathBuf {
        self.data_file
            .clone()
            .unwrap_or_else(|| self.save_dir.join("allCountries.txt"))
    }

    /// Local path of the SQLite database.
    pub fn db_path(&self) -> PathBuf {
        self.db_file
            .clone()
            .unwrap_or_else(|| self.save_dir.join("locations.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn derived_paths_follow_save_dir() {
        let config = Config {
            save_dir: PathBuf::from("/tmp/gazetteer"),
            ..Config::default()
        };
        assert_eq!(config.archive_path(), PathBuf::from("/tmp/gazetteer/allCountries.zip"));
        assert_eq!(config.data_path(), PathBuf::from("/tmp/gazetteer/allCountries.txt"));
        assert_eq!(config.db_path(), PathBuf::from("/tmp/gazetteer/locations.db"));
    }

    #[test]
    fn explicit_paths_win_over_save_dir() {
        let config = Config {
            db_file: Some(PathBuf::from("/elsewhere/locations.db")),
            ..Config::default()
        };
        assert_eq!(config.db_path(), PathBuf::from("/elsewhere/locations.db"));
        assert_eq!(config.archive_path(), PathBuf::from("data/allCountries.zip"));
    }

    #[test]
    fn load_from_file_applies_defaults_for_missing_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "chunk_size = 500\nsave_dir = \"/var/lib/gazetteer\"").unwrap();

        let config = Config::load_from_file(file.path()).unwrap();
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.save_dir, PathBuf::from("/var/lib/gazetteer"));
        assert_eq!(config.url, DEFAULT_URL);
    }

    #[test]
    fn load_from_missing_file_is_not_found() {
        let err = Config::load_from_file("/no/such/config.toml").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
