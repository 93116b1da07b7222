//! Bulk insertion with one transaction per chunk.

use tracing::{debug, info};

use super::Store;
use crate::error::Result;
use crate::models::Location;

const INSERT_ROW: &str = "\
INSERT INTO locations (
    country_code, postal_code, place_name,
    admin_name1, admin_code1, admin_name2, admin_code2, admin_name3, admin_code3,
    latitude, longitude, accuracy
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// Bulk inserter keeping a running total across chunks.
///
/// Each chunk commits in its own transaction: an aborted chunk rolls back
/// alone, previously committed chunks stay.
pub struct BulkInserter {
    store: Store,
    total_inserted: u64,
    chunks_committed: u64,
}

impl BulkInserter {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            total_inserted: 0,
            chunks_committed: 0,
        }
    }

    /// Insert one parsed chunk inside a single transaction.
    pub async fn insert_chunk(&mut self, records: &[Location]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        debug!("inserting chunk of {} records", records.len());

        let mut tx = self.store.pool().begin().await?;
        for record in records {
            sqlx::query(INSERT_ROW)
                .bind(&record.country_code)
                .bind(&record.postal_code)
                .bind(&record.place_name)
                .bind(&record.admin_name1)
                .bind(&record.admin_code1)
                .bind(&record.admin_name2)
                .bind(&record.admin_code2)
                .bind(&record.admin_name3)
                .bind(&record.admin_code3)
                .bind(record.latitude)
                .bind(record.longitude)
                .bind(record.accuracy)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        self.total_inserted += records.len() as u64;
        self.chunks_committed += 1;
        info!(
            "inserted {} records ({} total)",
            records.len(),
            self.total_inserted
        );

        Ok(records.len() as u64)
    }

    /// Finish inserting and return (records, chunks) totals.
    pub fn finish(self) -> (u64, u64) {
        (self.total_inserted, self.chunks_committed)
    }

    /// Get current totals
    pub fn stats(&self) -> (u64, u64) {
        (self.total_inserted, self.chunks_committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(country: &str, postal: &str, lat: f64, lon: f64) -> Location {
        Location {
            country_code: country.to_string(),
            postal_code: postal.to_string(),
            place_name: String::new(),
            admin_name1: String::new(),
            admin_code1: String::new(),
            admin_name2: String::new(),
            admin_code2: String::new(),
            admin_name3: String::new(),
            admin_code3: String::new(),
            latitude: lat,
            longitude: lon,
            accuracy: None,
        }
    }

    #[tokio::test]
    async fn chunks_accumulate_running_totals() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("locations.db")).await.unwrap();
        store.create_schema().await.unwrap();

        let mut inserter = BulkInserter::new(store.clone());
        inserter
            .insert_chunk(&[
                sample("US", "90210", 34.0901, -118.4065),
                sample("CA", "H3Z", 45.4850, -73.5800),
            ])
            .await
            .unwrap();
        inserter
            .insert_chunk(&[sample("DE", "10115", 52.53, 13.38)])
            .await
            .unwrap();

        assert_eq!(inserter.stats(), (3, 2));
        assert_eq!(inserter.finish(), (3, 2));
        assert_eq!(store.total_entries().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn empty_chunk_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("locations.db")).await.unwrap();
        store.create_schema().await.unwrap();

        let mut inserter = BulkInserter::new(store.clone());
        assert_eq!(inserter.insert_chunk(&[]).await.unwrap(), 0);
        assert_eq!(inserter.finish(), (0, 0));
    }

    #[tokio::test]
    async fn failed_chunk_does_not_roll_back_committed_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("locations.db")).await.unwrap();
        store.create_schema().await.unwrap();

        let mut inserter = BulkInserter::new(store.clone());
        inserter
            .insert_chunk(&[sample("US", "90210", 34.0901, -118.4065)])
            .await
            .unwrap();

        // Second chunk fails mid-transaction once the table disappears.
        sqlx::query("DROP TABLE locations")
            .execute(store.pool())
            .await
            .unwrap();
        let err = inserter
            .insert_chunk(&[sample("CA", "H3Z", 45.4850, -73.5800)])
            .await;
        assert!(err.is_err());

        // The failed chunk never made it into the totals.
        assert_eq!(inserter.stats(), (1, 1));
    }
}
