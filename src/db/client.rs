//! SQLite store handle and schema management.

use std::path::{Path, PathBuf};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::Result;

const CREATE_TABLE: &str = "\
CREATE TABLE IF NOT EXISTS locations (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    country_code TEXT NOT NULL,
    postal_code  TEXT NOT NULL,
    place_name   TEXT NOT NULL DEFAULT '',
    admin_name1  TEXT NOT NULL DEFAULT '',
    admin_code1  TEXT NOT NULL DEFAULT '',
    admin_name2  TEXT NOT NULL DEFAULT '',
    admin_code2  TEXT NOT NULL DEFAULT '',
    admin_name3  TEXT NOT NULL DEFAULT '',
    admin_code3  TEXT NOT NULL DEFAULT '',
    latitude     REAL NOT NULL,
    longitude    REAL NOT NULL,
    accuracy     INTEGER
)";

const CREATE_INDEXES: [&str; 2] = [
    "CREATE INDEX IF NOT EXISTS idx_locations_country_code ON locations (country_code)",
    "CREATE INDEX IF NOT EXISTS idx_locations_postal_code ON locations (postal_code)",
];

/// Handle to one destination database.
///
/// Cheap to clone; every logical operation checks a connection out of the
/// pool and returns it on all exit paths.
#[derive(Clone, Debug)]
pub struct Store {
    pool: SqlitePool,
    path: PathBuf,
}

impl Store {
    /// Open the database at `path`, creating the file if missing.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        Ok(Self { pool, path })
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the table and its secondary indexes if absent. Never drops
    /// or rewrites existing tables.
    pub async fn create_schema(&self) -> Result<()> {
        info!("creating database tables");
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        for statement in CREATE_INDEXES {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Whether the locations table has been created.
    pub async fn table_exists(&self) -> Result<bool> {
        let name: Option<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'locations'",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(name.is_some())
    }

    /// Whether the destination both exists and holds at least one row.
    pub async fn is_populated(&self) -> Result<bool> {
        if !self.table_exists().await? {
            return Ok(false);
        }
        Ok(self.total_entries().await? > 0)
    }

    /// Delete every stored row. The table itself is kept.
    pub async fn clear(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM locations")
            .execute(&self.pool)
            .await?;
        let deleted = result.rows_affected();
        if deleted > 0 {
            info!("cleared {} existing records", deleted);
        }
        Ok(deleted)
    }

    /// Post-load optimization, run in its own transaction.
    pub async fn optimize(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("PRAGMA optimize").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Close the pool, flushing the WAL back into the main database file.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn scratch_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("locations.db")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn fresh_database_has_no_table() {
        let (_dir, store) = scratch_store().await;
        assert!(!store.table_exists().await.unwrap());
        assert!(!store.is_populated().await.unwrap());
    }

    #[tokio::test]
    async fn schema_creation_is_idempotent() {
        let (_dir, store) = scratch_store().await;
        store.create_schema().await.unwrap();
        store.create_schema().await.unwrap();
        assert!(store.table_exists().await.unwrap());
        assert!(!store.is_populated().await.unwrap());
    }

    #[tokio::test]
    async fn clear_keeps_the_table() {
        let (_dir, store) = scratch_store().await;
        store.create_schema().await.unwrap();
        sqlx::query(
            "INSERT INTO locations (country_code, postal_code, latitude, longitude) \
             VALUES ('US', '90210', 34.0901, -118.4065)",
        )
        .execute(store.pool())
        .await
        .unwrap();
        assert!(store.is_populated().await.unwrap());

        assert_eq!(store.clear().await.unwrap(), 1);
        assert!(store.table_exists().await.unwrap());
        assert!(!store.is_populated().await.unwrap());
    }

    #[tokio::test]
    async fn optimize_succeeds_on_a_loaded_store() {
        let (_dir, store) = scratch_store().await;
        store.create_schema().await.unwrap();
        store.optimize().await.unwrap();
    }
}
