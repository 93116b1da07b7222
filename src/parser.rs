//! Chunked parser for the tab-separated postal dump.
//!
//! The dump is multi-million rows, so it is consumed as a finite sequence of
//! bounded batches rather than loaded whole. Re-opening a [`ChunkReader`]
//! restarts the sequence from the first row, which keeps the chunk-per-
//! transaction failure boundary of the import pipeline intact.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{ByteRecord, ReaderBuilder};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::Location;

/// Input-file column order. Fixed by the upstream dump format, no header row.
pub const COLUMNS: [&str; 12] = [
    "country_code",
    "postal_code",
    "place_name",
    "admin_name1",
    "admin_code1",
    "admin_name2",
    "admin_code2",
    "admin_name3",
    "admin_code3",
    "latitude",
    "longitude",
    "accuracy",
];

/// One raw batch of rows, at most `chunk_size` long.
#[derive(Debug)]
pub struct Chunk {
    /// Column names the raw fields were read under.
    pub columns: Vec<String>,
    /// Raw field values, one entry per surviving input line.
    pub rows: Vec<Vec<String>>,
}

/// Output of [`process_chunk`]: rows ready for insertion plus the count of
/// rows dropped for missing coordinates.
#[derive(Debug, Default)]
pub struct ProcessedChunk {
    pub records: Vec<Location>,
    pub dropped: u64,
}

/// Streaming reader over the dump file.
#[derive(Debug)]
pub struct ChunkReader {
    reader: csv::Reader<File>,
    path: PathBuf,
    chunk_size: usize,
    skipped: u64,
    done: bool,
}

impl ChunkReader {
    /// Open a fresh pass over the dump at `path`.
    ///
    /// Fails with [`Error::NotFound`] before the first batch is requested if
    /// the file does not exist.
    pub fn open<P: AsRef<Path>>(path: P, chunk_size: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(Error::NotFound(path));
        }

        debug!(
            "loading rows from {} in chunks of {}",
            path.display(),
            chunk_size
        );

        let file = File::open(&path)?;
        let reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(file);

        Ok(Self {
            reader,
            path,
            chunk_size,
            skipped: 0,
            done: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines skipped so far: wrong column count or undecodable bytes.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Read the next batch, or `None` once the file is exhausted.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        if self.done {
            return Ok(None);
        }

        let mut rows = Vec::new();
        let mut record = ByteRecord::new();

        while rows.len() < self.chunk_size {
            match self.reader.read_byte_record(&mut record) {
                Ok(true) => {
                    if record.len() != COLUMNS.len() {
                        self.skipped += 1;
                        continue;
                    }
                    match decode_record(&record) {
                        Some(fields) => rows.push(fields),
                        None => self.skipped += 1,
                    }
                }
                Ok(false) => {
                    self.done = true;
                    break;
                }
                Err(e) if e.is_io_error() => return Err(csv_io_error(e)),
                Err(_) => self.skipped += 1,
            }
        }

        if rows.is_empty() {
            return Ok(None);
        }

        debug!("loaded chunk with {} rows", rows.len());
        Ok(Some(Chunk {
            columns: COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows,
        }))
    }
}

/// Validate and coerce one raw batch into insertable rows.
///
/// Verifies all twelve required columns are present (a violated batch yields
/// zero records), reads declared text columns as raw text with the empty
/// string standing in for missing data, coerces latitude/longitude/accuracy
/// leniently, and drops rows whose latitude or longitude is missing.
pub fn process_chunk(chunk: &Chunk) -> ProcessedChunk {
    debug!("processing chunk of size {}", chunk.rows.len());

    let missing: Vec<&str> = COLUMNS
        .iter()
        .filter(|name| !chunk.columns.iter().any(|have| have == *name))
        .copied()
        .collect();
    if !missing.is_empty() {
        warn!("missing columns in chunk: {:?}", missing);
        return ProcessedChunk::default();
    }

    let index = |name: &str| -> usize {
        chunk
            .columns
            .iter()
            .position(|have| have == name)
            .expect("column presence checked above")
    };

    let text_at = |row: &[String], name: &str| -> String {
        row.get(index(name)).cloned().unwrap_or_default()
    };

    let lat_idx = index("latitude");
    let lon_idx = index("longitude");
    let acc_idx = index("accuracy");

    let mut records = Vec::with_capacity(chunk.rows.len());
    let mut dropped = 0u64;

    for row in &chunk.rows {
        let latitude = row.get(lat_idx).and_then(|v| numeric(v));
        let longitude = row.get(lon_idx).and_then(|v| numeric(v));

        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            dropped += 1;
            continue;
        };

        records.push(Location {
            // Stored normalized so exact lookups can normalize their
            // arguments the same way.
            country_code: text_at(row, "country_code").to_uppercase(),
            postal_code: text_at(row, "postal_code").trim().to_string(),
            place_name: text_at(row, "place_name"),
            admin_name1: text_at(row, "admin_name1"),
            admin_code1: text_at(row, "admin_code1"),
            admin_name2: text_at(row, "admin_name2"),
            admin_code2: text_at(row, "admin_code2"),
            admin_name3: text_at(row, "admin_name3"),
            admin_code3: text_at(row, "admin_code3"),
            latitude,
            longitude,
            accuracy: row.get(acc_idx).and_then(|v| numeric(v)).map(|v| v as i64),
        });
    }

    debug!(
        "processed {} records from chunk ({} dropped)",
        records.len(),
        dropped
    );
    ProcessedChunk { records, dropped }
}

/// Lenient numeric coercion: unparseable or empty values become missing.
fn numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

fn decode_record(record: &ByteRecord) -> Option<Vec<String>> {
    let mut fields = Vec::with_capacity(record.len());
    for raw in record.iter() {
        fields.push(std::str::from_utf8(raw).ok()?.to_string());
    }
    Some(fields)
}

fn csv_io_error(e: csv::Error) -> Error {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => Error::Io(io),
        other => Error::Io(std::io::Error::other(format!("{:?}", other))),
    }
}
