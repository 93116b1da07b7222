//! Remote archive access: freshness probing, download, extraction.

mod archive;
mod fetch;

pub use archive::{extract_archive, find_data_file};
pub use fetch::{check_for_updates, download_archive, http_client};
