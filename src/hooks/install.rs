//! Pre-commit hook installation

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

const HOOK_SCRIPT: &str = "#!/bin/sh\n# Installed by gantry; runs the configured commit gate.\nexec gantry hooks run\n";

/// Write `.git/hooks/pre-commit` so git runs the gate on every commit
pub fn install_pre_commit_hook(repo_root: &Path) -> Result<PathBuf> {
    let git_dir = repo_root.join(".git");
    if !git_dir.is_dir() {
        anyhow::bail!("{} is not a git repository", repo_root.display());
    }

    let hooks_dir = git_dir.join("hooks");
    std::fs::create_dir_all(&hooks_dir)
        .with_context(|| format!("Failed to create {}", hooks_dir.display()))?;

    let hook_path = hooks_dir.join("pre-commit");
    std::fs::write(&hook_path, HOOK_SCRIPT)
        .with_context(|| format!("Failed to write {}", hook_path.display()))?;
    make_executable(&hook_path)?;

    info!("Installed pre-commit hook at {}", hook_path.display());
    Ok(hook_path)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
