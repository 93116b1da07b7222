//! HTTP freshness probe and archive download.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::{CONTENT_LENGTH, LAST_MODIFIED};
use reqwest::{Client, StatusCode};
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, Result};

/// Build the HTTP client used for all remote archive access.
///
/// The archive host rejects default library user agents, so a browser-like
/// one is sent.
pub fn http_client() -> Client {
    Client::builder()
        .user_agent(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
        )
        .build()
        .expect("Failed to create HTTP client")
}

/// Decide whether the remote archive differs from the locally cached copy.
///
/// Issues a HEAD request and compares `Content-Length` and `Last-Modified`
/// against the local file's size and modification time. A missing local
/// file always counts as an update.
pub async fn check_for_updates(client: &Client, url: &str, current_file: &Path) -> Result<bool> {
    if !current_file.exists() {
        return Ok(true);
    }

    let url = Url::parse(url).map_err(|e| Error::Config(e.to_string()))?;
    let response = client.head(url).send().await?.error_for_status()?;

    let remote_size = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);
    let remote_modified = response
        .headers()
        .get(LAST_MODIFIED)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| DateTime::parse_from_rfc2822(v).ok());

    let metadata = fs::metadata(current_file)?;
    let local_modified: DateTime<Utc> = metadata.modified()?.into();

    if remote_size != metadata.len() {
        return Ok(true);
    }

    if let Some(remote_modified) = remote_modified {
        debug!(
            "remote modified: {}, local modified: {}",
            remote_modified, local_modified
        );
        if remote_modified > local_modified {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Download the archive at `url` to `filename`, streaming to disk.
///
/// A 403 response is access-forbidden and is never retried. Other HTTP and
/// transport failures propagate after the client's own timeout behavior; no
/// retry layer is added here.
pub async fn download_archive(client: &Client, url: &str, filename: &Path) -> Result<()> {
    info!("downloading {} from {}", filename.display(), url);

    if let Some(parent) = filename.parent() {
        fs::create_dir_all(parent)?;
    }

    let response = client.get(url).send().await?;
    if response.status() == StatusCode::FORBIDDEN {
        return Err(Error::RemoteAccessDenied(url.to_string()));
    }
    let response = response.error_for_status()?;

    let total_size = response.content_length().unwrap_or(0);
    let pb = ProgressBar::new(total_size);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let mut file = fs::File::create(filename)?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }

    pb.finish_and_clear();
    info!("downloaded {} ({} bytes)", filename.display(), downloaded);

    Ok(())
}
