// src/archive.rs

//! Source archive download, checksum verification, and extraction. Calls
//! the HTTP/archive crates directly rather than shelling out to `curl`/`tar`.

use crate::error::{Error, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

pub fn download(url: &str, dest: &Path) -> Result<()> {
    info!("downloading {}", url);
    let response = reqwest::blocking::get(url)
        .map_err(|e| Error::NetworkError(format!("GET {url} failed: {e}")))?;
    let response = response
        .error_for_status()
        .map_err(|e| Error::NetworkError(format!("GET {url} failed: {e}")))?;

    let progress = response.content_length().map(|len| {
        let bar = indicatif::ProgressBar::new(len);
        bar.set_style(
            indicatif::ProgressStyle::with_template("{bar:40} {bytes}/{total_bytes} {msg}")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar()),
        );
        bar.set_message(url.to_string());
        bar
    });

    let bytes = response
        .bytes()
        .map_err(|e| Error::NetworkError(format!("reading body of {url} failed: {e}")))?;
    if let Some(bar) = &progress {
        bar.set_position(bytes.len() as u64);
        bar.finish_and_clear();
    }

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(dest)?;
    file.write_all(&bytes)?;
    debug!("wrote {} bytes to {}", bytes.len(), dest.display());
    Ok(())
}

pub fn verify_checksum(path: &Path, expected_sha256: &str) -> Result<()> {
    let data = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    let actual = hex_encode(&hasher.finalize());

    if actual.eq_ignore_ascii_case(expected_sha256) {
        Ok(())
    } else {
        Err(Error::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: expected_sha256.to_string(),
            actual,
        })
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Extract a tarball (`.tar`, `.tar.gz`/`.tgz`, `.tar.xz`) into `dest_dir`.
pub fn extract(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dest_dir)?;
    let file = File::open(archive_path)?;
    let name = archive_path.to_string_lossy();

    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        let decoder = flate2::read::GzDecoder::new(file);
        tar::Archive::new(decoder).unpack(dest_dir)?;
    } else if name.ends_with(".tar.xz") {
        let decoder = xz2::read::XzDecoder::new(file);
        tar::Archive::new(decoder).unpack(dest_dir)?;
    } else if name.ends_with(".tar") {
        tar::Archive::new(file).unpack(dest_dir)?;
    } else {
        return Err(Error::CatalogParseError {
            path: archive_path.to_path_buf(),
            reason: "unrecognized archive extension".to_string(),
        });
    }

    Ok(())
}

/// If an extracted archive produced exactly one top-level directory, return
/// it; most upstream tarballs nest their contents under a single
/// `name-version/` prefix.
pub fn single_subdir(dest_dir: &Path) -> Option<std::path::PathBuf> {
    let mut entries: Vec<_> = std::fs::read_dir(dest_dir).ok()?.filter_map(|e| e.ok()).collect();
    if entries.len() == 1 && entries[0].path().is_dir() {
        Some(entries.remove(0).path())
    } else {
        None
    }
}
