//! Import orchestration: check the destination, probe freshness, fetch the
//! archive when newer, then load chunk by chunk and optimize.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::config::Config;
use crate::db::{BulkInserter, Store};
use crate::error::{Error, Result};
use crate::parser::{process_chunk, ChunkReader};
use crate::remote;

/// Import pipeline over a single destination database.
///
/// The importer is the sole writer. One run at a time per importer: a second
/// concurrent [`Importer::run`] fails fast with [`Error::ImportInProgress`]
/// instead of queueing. Runs from separate processes against the same
/// destination are not coordinated here; callers serialize those.
pub struct Importer {
    config: Config,
    client: reqwest::Client,
    running: AtomicBool,
}

struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Importer {
    pub fn new(config: Config) -> Self {
        Self {
            client: remote::http_client(),
            config,
            running: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn acquire(&self) -> Result<RunGuard<'_>> {
        if self
            .running
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(Error::ImportInProgress);
        }
        Ok(RunGuard(&self.running))
    }

    /// Run one import and return a live handle to the store.
    ///
    /// When the destination is already populated and fresh, the load is
    /// skipped entirely. Any failure during fetch, extract, parse, insert or
    /// optimize aborts the run and propagates with its original cause;
    /// chunks committed before the failure stay committed.
    pub async fn run(&self) -> Result<Store> {
        let _guard = self.acquire()?;

        let store = Store::open(self.config.db_path()).await?;

        if !self.reload_needed(&store).await? {
            info!("database is up to date");
            return Ok(store);
        }

        let data_path = self.fetch_if_newer().await?;

        store.create_schema().await?;
        store.clear().await?;

        let mut reader = ChunkReader::open(&data_path, self.config.chunk_size)?;
        let mut inserter = BulkInserter::new(store.clone());
        let mut dropped = 0u64;

        while let Some(chunk) = reader.next_chunk()? {
            let processed = process_chunk(&chunk);
            dropped += processed.dropped;
            inserter.insert_chunk(&processed.records).await?;
        }

        let malformed = reader.skipped();
        let (inserted, chunks) = inserter.finish();
        store.optimize().await?;

        info!(
            "import complete: {} records in {} chunks ({} rows dropped for missing coordinates, {} malformed lines skipped)",
            inserted, chunks, dropped, malformed
        );

        Ok(store)
    }

    /// Destination check, then freshness: a missing or empty destination, a
    /// missing archive, an archive newer than the destination, or a newer
    /// remote copy all require a reload.
    async fn reload_needed(&self, store: &Store) -> Result<bool> {
        if !store.is_populated().await? {
            return Ok(true);
        }

        let archive = self.config.archive_path();
        if !archive.exists() {
            return Ok(true);
        }

        let archive_modified = fs::metadata(&archive)?.modified()?;
        let db_modified = fs::metadata(store.path())?.modified()?;
        if archive_modified > db_modified {
            return Ok(true);
        }

        remote::check_for_updates(&self.client, &self.config.url, &archive).await
    }

    /// Download and extract when the remote probe reports a newer archive;
    /// otherwise fall back to what is already on disk, extracting the cached
    /// archive if the dump itself is gone. Returns the dump path to parse.
    async fn fetch_if_newer(&self) -> Result<PathBuf> {
        let archive = self.config.archive_path();
        let data_path = self.config.data_path();
        let extract_to = data_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.save_dir.clone());

        let no_data_file = |path: PathBuf| Error::InvalidArchive {
            path,
            reason: "no .txt file among extracted entries".to_string(),
        };

        if remote::check_for_updates(&self.client, &self.config.url, &archive).await? {
            remote::download_archive(&self.client, &self.config.url, &archive).await?;
            let extracted = remote::extract_archive(&archive, &extract_to).await?;
            return remote::find_data_file(&extracted)
                .cloned()
                .ok_or_else(|| no_data_file(archive));
        }

        if !data_path.exists() && archive.exists() {
            let extracted = remote::extract_archive(&archive, &extract_to).await?;
            return remote::find_data_file(&extracted)
                .cloned()
                .ok_or_else(|| no_data_file(archive));
        }

        Ok(data_path)
    }
}
