//! ZIP archive extraction.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tracing::info;
use zip::ZipArchive;

use crate::error::{Error, Result};

/// Extract `zip_path` into `extract_to`, returning the extracted file paths.
///
/// An unreadable archive, or one containing no entries, is fatal.
pub async fn extract_archive(zip_path: &Path, extract_to: &Path) -> Result<Vec<PathBuf>> {
    if !zip_path.exists() {
        return Err(Error::NotFound(zip_path.to_path_buf()));
    }

    info!("extracting {}", zip_path.display());
    fs::create_dir_all(extract_to)?;

    let zip_path = zip_path.to_path_buf();
    let extract_to = extract_to.to_path_buf();
    let extracted = tokio::task::spawn_blocking(move || extract_blocking(&zip_path, &extract_to))
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))??;

    info!("extracted {} files", extracted.len());
    Ok(extracted)
}

fn extract_blocking(zip_path: &Path, extract_to: &Path) -> Result<Vec<PathBuf>> {
    let invalid = |reason: String| Error::InvalidArchive {
        path: zip_path.to_path_buf(),
        reason,
    };

    let file = File::open(zip_path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| invalid(e.to_string()))?;

    if archive.len() == 0 {
        return Err(invalid("archive contains no entries".to_string()));
    }

    let mut extracted = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|e| invalid(e.to_string()))?;

        // enclosed_name rejects entries that would escape the target dir
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            continue;
        };
        let dest = extract_to.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&dest)?;
            continue;
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out = File::create(&dest)?;
        std::io::copy(&mut entry, &mut out)?;
        extracted.push(dest);
    }

    Ok(extracted)
}

/// Pick the tab-separated dump out of the extracted file list.
pub fn find_data_file(extracted: &[PathBuf]) -> Option<&PathBuf> {
    extracted
        .iter()
        .find(|p| p.extension().is_some_and(|ext| ext == "txt"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut writer = ZipWriter::new(file);
        for (name, content) in entries {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap();
    }

    #[tokio::test]
    async fn missing_archive_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_archive(Path::new("/no/such/archive.zip"), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn extracts_entries_and_returns_their_paths() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("dump.zip");
        write_zip(
            &zip_path,
            &[
                ("allCountries.txt", b"US\t90210".as_slice()),
                ("readme.md", b"about".as_slice()),
            ],
        );

        let out_dir = dir.path().join("out");
        let extracted = extract_archive(&zip_path, &out_dir).await.unwrap();

        assert_eq!(extracted.len(), 2);
        assert_eq!(
            fs::read(out_dir.join("allCountries.txt")).unwrap(),
            b"US\t90210"
        );
    }

    #[tokio::test]
    async fn empty_archive_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("empty.zip");
        write_zip(&zip_path, &[]);

        let err = extract_archive(&zip_path, dir.path()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArchive { .. }));
    }

    #[tokio::test]
    async fn garbage_bytes_are_an_invalid_archive() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("garbage.zip");
        fs::write(&zip_path, b"this is not a zip file").unwrap();

        let err = extract_archive(&zip_path, dir.path()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArchive { .. }));
    }

    #[test]
    fn data_file_is_the_txt_entry() {
        let extracted = vec![
            PathBuf::from("/tmp/out/readme.md"),
            PathBuf::from("/tmp/out/allCountries.txt"),
        ];
        assert_eq!(
            find_data_file(&extracted),
            Some(&PathBuf::from("/tmp/out/allCountries.txt"))
        );
        assert_eq!(find_data_file(&[]), None);
    }
}
