//! Node artifact download and extraction

use crate::node::NodeError;
use flate2::read::GzDecoder;
use std::path::{Path, PathBuf};
use tar::Archive;
use tracing::{debug, info};

/// Download a prebuilt tar.gz archive and return the path of the named
/// binary inside it.
///
/// A binary already present under `dest_dir` is reused without
/// re-downloading.
pub async fn fetch_archive(
    url: &str,
    binary_name: &str,
    dest_dir: &Path,
) -> Result<PathBuf, NodeError> {
    if let Some(existing) = find_binary(dest_dir, binary_name) {
        debug!("Reusing downloaded node at {}", existing.display());
        return Ok(existing);
    }

    std::fs::create_dir_all(dest_dir)?;

    info!("Downloading {}", url);
    let response = reqwest::get(url)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| NodeError::Download {
            url: url.to_string(),
            source: e,
        })?;
    let bytes = response.bytes().await.map_err(|e| NodeError::Download {
        url: url.to_string(),
        source: e,
    })?;

    extract_tar_gz(&bytes, dest_dir)?;

    let binary =
        find_binary(dest_dir, binary_name).ok_or_else(|| NodeError::BinaryMissing(binary_name.to_string()))?;
    make_executable(&binary)?;
    Ok(binary)
}

/// Unpack a gzip-compressed tarball into a directory
pub fn extract_tar_gz(bytes: &[u8], dest: &Path) -> Result<(), NodeError> {
    let decoder = GzDecoder::new(bytes);
    let mut archive = Archive::new(decoder);
    archive.unpack(dest).map_err(NodeError::Extract)
}

/// Locate a file by name anywhere under a directory
fn find_binary(dir: &Path, name: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = find_binary(&path, name) {
                return Some(found);
            }
        } else if path.file_name().and_then(|n| n.to_str()) == Some(name) {
            return Some(path);
        }
    }
    None
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), NodeError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), NodeError> {
    Ok(())
}
