//! Build cache keyed by toolchain + dependency lockfile

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Restores and saves configured paths under a per-user cache root
#[derive(Debug, Clone)]
pub struct BuildCache {
    root: PathBuf,
}

impl BuildCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Cache root under the platform's per-user cache directory
    pub fn with_default_root() -> Result<Self> {
        let base = dirs::cache_dir().context("Could not determine a cache directory")?;
        Ok(Self::new(base.join("gantry")))
    }

    /// Cache key for a cell: toolchain + SHA-256 of the lockfile.
    ///
    /// A missing lockfile hashes as empty so a fresh checkout still gets
    /// a stable key.
    pub fn key(&self, toolchain: &str, lockfile: &Path) -> String {
        let mut hasher = Sha256::new();
        hasher.update(toolchain.as_bytes());
        hasher.update([0u8]);
        match std::fs::read(lockfile) {
            Ok(bytes) => hasher.update(&bytes),
            Err(_) => {
                warn!("Lockfile {} not found, keying on toolchain only", lockfile.display());
            }
        }
        format!("{:x}", hasher.finalize())
    }

    /// Restore cached paths into the working directory.
    ///
    /// Returns whether the key was present (a cache hit).
    pub fn restore(&self, key: &str, workdir: &Path, paths: &[PathBuf]) -> Result<bool> {
        let entry = self.root.join(key);
        if !entry.is_dir() {
            debug!("Cache miss for key {}", key);
            return Ok(false);
        }

        for path in paths {
            let src = entry.join(path);
            if !src.exists() {
                continue;
            }
            let dst = workdir.join(path);
            copy_dir_all(&src, &dst)
                .with_context(|| format!("Failed to restore cached path {}", path.display()))?;
        }
        debug!("Cache hit for key {}", key);
        Ok(true)
    }

    /// Save the configured paths from the working directory under the key
    pub fn save(&self, key: &str, workdir: &Path, paths: &[PathBuf]) -> Result<()> {
        let entry = self.root.join(key);
        for path in paths {
            let src = workdir.join(path);
            if !src.exists() {
                continue;
            }
            let dst = entry.join(path);
            copy_dir_all(&src, &dst)
                .with_context(|| format!("Failed to save cache path {}", path.display()))?;
        }
        Ok(())
    }
}

fn copy_dir_all(src: &Path, dst: &Path) -> std::io::Result<()> {
    if src.is_file() {
        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(src, dst)?;
        return Ok(());
    }

    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
