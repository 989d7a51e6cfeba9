//! Git repository queries for the commit gate

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Files staged for the pending commit (added, copied, or modified)
pub async fn staged_files(repo_root: &Path) -> Result<Vec<PathBuf>> {
    git_paths(
        repo_root,
        &["diff", "--cached", "--name-only", "--diff-filter=ACM", "-z"],
    )
    .await
}

/// Every tracked file, for `--all-files` runs
pub async fn tracked_files(repo_root: &Path) -> Result<Vec<PathBuf>> {
    git_paths(repo_root, &["ls-files", "-z"]).await
}

/// The repository's top-level directory
pub async fn repo_root() -> Result<PathBuf> {
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .output()
        .await
        .context("Failed to run git")?;
    if !output.status.success() {
        anyhow::bail!("Not inside a git repository");
    }
    let root = String::from_utf8(output.stdout).context("git returned non-UTF-8 output")?;
    Ok(PathBuf::from(root.trim()))
}

async fn git_paths(repo_root: &Path, args: &[&str]) -> Result<Vec<PathBuf>> {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_root)
        .output()
        .await
        .context("Failed to run git")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git {} failed: {}", args.join(" "), stderr.trim());
    }

    let stdout = String::from_utf8(output.stdout).context("git returned non-UTF-8 paths")?;
    let files: Vec<PathBuf> = stdout
        .split('\0')
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect();
    debug!("git {} listed {} files", args.join(" "), files.len());
    Ok(files)
}
