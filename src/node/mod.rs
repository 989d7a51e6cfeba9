//! Background test node supervision
//!
//! A job's end-to-end tests need a live node. The supervisor resolves the
//! host platform against the configured artifact table, obtains the
//! binary (prebuilt archive or build from source), starts it in the
//! background with output captured to a log file, and - when a probe is
//! configured - waits for the node's port to accept connections before
//! returning.

pub mod fetch;
pub mod probe;

use crate::core::config::{NodeConfig, NodeSource};
use crate::core::platform::Platform;
use crate::execution::command::{CommandError, CommandExecutor, CommandSpec};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{debug, info};

/// Errors from obtaining or launching the node
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("No node artifact configured for platform '{0}'")]
    UnsupportedPlatform(Platform),

    #[error("Failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to extract node archive: {0}")]
    Extract(#[source] std::io::Error),

    #[error("Archive did not contain binary '{0}'")]
    BinaryMissing(String),

    #[error("Failed to build node from source: {0}")]
    Build(#[source] CommandError),

    #[error("Failed to start node binary {binary}: {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Node did not accept connections on port {port} within {timeout_secs}s")]
    NotReady { port: u16, timeout_secs: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A running background node.
///
/// The child is spawned with kill-on-drop, so dropping the handle stops
/// the node with the cell that started it.
pub struct NodeHandle {
    child: Child,
    /// Where the node's output is captured
    pub log_path: PathBuf,
}

impl NodeHandle {
    /// OS process id, when still running
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Stop the node explicitly
    pub async fn shutdown(mut self) -> Result<(), NodeError> {
        self.child.kill().await?;
        Ok(())
    }
}

/// Obtains and launches the background node for a cell
pub struct NodeSupervisor<E> {
    executor: Arc<E>,
    /// Where downloads and source builds land
    work_root: PathBuf,
}

impl<E: CommandExecutor> NodeSupervisor<E> {
    pub fn new(executor: Arc<E>, work_root: impl Into<PathBuf>) -> Self {
        Self {
            executor,
            work_root: work_root.into(),
        }
    }

    /// Launch the node for a platform, per the artifact lookup table
    pub async fn launch(
        &self,
        config: &NodeConfig,
        platform: Platform,
        workdir: &Path,
    ) -> Result<NodeHandle, NodeError> {
        let source = config
            .artifacts
            .get(&platform)
            .ok_or(NodeError::UnsupportedPlatform(platform))?;

        let binary = match source {
            NodeSource::Archive { url, binary } => {
                info!("Fetching node archive for {}", platform);
                fetch::fetch_archive(url, binary, &self.work_root.join("node")).await?
            }
            NodeSource::Build {
                repo,
                rev,
                command,
                binary,
            } => {
                info!("Building node from source for {}", platform);
                self.build_from_source(repo, rev.as_deref(), command, binary)
                    .await?
            }
        };

        let log_path = workdir.join(&config.log_file);
        let handle = spawn_node(&binary, &config.args, workdir, &log_path)?;
        info!(
            "Node started (pid {:?}), logging to {}",
            handle.pid(),
            log_path.display()
        );

        if let Some(ref ready) = config.ready {
            probe::wait_ready(
                ready.port,
                Duration::from_secs(ready.timeout_secs),
                Duration::from_millis(ready.interval_ms),
            )
            .await?;
            info!("Node ready on port {}", ready.port);
        } else {
            debug!("No readiness probe configured, not waiting for the node");
        }

        Ok(handle)
    }

    async fn build_from_source(
        &self,
        repo: &str,
        rev: Option<&str>,
        command: &str,
        binary: &Path,
    ) -> Result<PathBuf, NodeError> {
        let checkout = self.work_root.join("node-src");
        let built = checkout.join(binary);
        if built.is_file() {
            debug!("Reusing previously built node at {}", built.display());
            return Ok(built);
        }

        if !checkout.is_dir() {
            let clone = CommandSpec::new(format!("git clone {} {}", repo, checkout.display()));
            self.executor.run(&clone).await.map_err(NodeError::Build)?;
        }
        if let Some(rev) = rev {
            let checkout_rev = CommandSpec::new(format!("git checkout {}", rev)).cwd(&checkout);
            self.executor
                .run(&checkout_rev)
                .await
                .map_err(NodeError::Build)?;
        }

        let build = CommandSpec::new(command).cwd(&checkout);
        self.executor.run(&build).await.map_err(NodeError::Build)?;

        if !built.is_file() {
            return Err(NodeError::BinaryMissing(binary.display().to_string()));
        }
        Ok(built)
    }
}

fn spawn_node(
    binary: &Path,
    args: &[String],
    workdir: &Path,
    log_path: &Path,
) -> Result<NodeHandle, NodeError> {
    let log = std::fs::File::create(log_path)?;
    let log_err = log.try_clone()?;

    let child = Command::new(binary)
        .args(args)
        .current_dir(workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err))
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| NodeError::Spawn {
            binary: binary.to_path_buf(),
            source: e,
        })?;

    Ok(NodeHandle {
        child,
        log_path: log_path.to_path_buf(),
    })
}
