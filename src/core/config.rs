//! Pipeline configuration from YAML

use crate::core::platform::Platform;
use crate::core::trigger::TriggerConfig;
use crate::hooks::config::{validate_hooks, HookDefinition};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Top-level pipeline configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name
    pub name: String,

    /// Events that start the pipeline
    #[serde(default)]
    pub triggers: TriggerConfig,

    /// Environment injected into every spawned command
    /// (e.g. RUST_BACKTRACE=full for full error backtraces)
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// The matrix of cells to run
    pub matrix: MatrixConfig,

    /// Toolchain installation options shared by all cells
    #[serde(default)]
    pub toolchain: ToolchainConfig,

    /// Build cache keyed by toolchain + dependency lockfile
    #[serde(default)]
    pub cache: Option<CacheConfig>,

    /// Auxiliary CLI tools installed before the job runs
    #[serde(default)]
    pub tools: Vec<ToolConfig>,

    /// Background test node started before the job runs
    #[serde(default)]
    pub node: Option<NodeConfig>,

    /// Version-report commands run before the job
    #[serde(default)]
    pub diagnostics: Vec<String>,

    /// Pre-commit hooks (the commit gate side of the configuration)
    #[serde(default)]
    pub hooks: Vec<HookDefinition>,

    /// Timeout applied to each step's command
    #[serde(default)]
    pub step_timeout_secs: Option<u64>,
}

/// Matrix axes and the jobs enumerated over them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixConfig {
    /// Platforms cells run on
    pub platforms: Vec<Platform>,

    /// Toolchain channels cells build with
    pub toolchains: Vec<String>,

    /// Verification jobs
    pub jobs: Vec<JobConfig>,

    /// Cells removed from the cross product
    #[serde(default)]
    pub exclude: Vec<MatrixExclude>,
}

/// One verification job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Unique job identifier
    pub id: String,

    /// Human-readable job name
    #[serde(default)]
    pub name: Option<String>,

    /// The command this job runs
    pub command: String,
}

impl JobConfig {
    /// Display name, falling back to the id
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// A cell excluded from the matrix cross product.
///
/// Every field that is set must match for the cell to be excluded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixExclude {
    #[serde(default)]
    pub platform: Option<Platform>,

    #[serde(default)]
    pub toolchain: Option<String>,

    #[serde(default)]
    pub job: Option<String>,
}

/// Toolchain installation options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolchainConfig {
    /// Extra components installed with the channel (e.g. rust-src)
    #[serde(default)]
    pub components: Vec<String>,

    /// Rustup profile to install with
    #[serde(default)]
    pub profile: Option<String>,
}

/// Build cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Dependency lockfile hashed into the cache key
    #[serde(default = "default_lockfile")]
    pub lockfile: PathBuf,

    /// Paths restored before and saved after the job
    #[serde(default = "default_cache_paths")]
    pub paths: Vec<PathBuf>,
}

fn default_lockfile() -> PathBuf {
    PathBuf::from("Cargo.lock")
}

fn default_cache_paths() -> Vec<PathBuf> {
    vec![PathBuf::from("target")]
}

/// An auxiliary CLI tool installed before the job runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Tool name
    pub name: String,

    /// Command that installs the tool
    pub install: String,

    /// Binary probed on PATH; when present the install step is skipped
    #[serde(default)]
    pub if_missing: Option<String>,

    /// Platforms the tool is installed on (all when unset)
    #[serde(default)]
    pub platforms: Option<Vec<Platform>>,
}

/// Background test node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Platform-to-artifact lookup table. Every matrix platform must
    /// resolve to exactly one source.
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub artifacts: BTreeMap<Platform, NodeSource>,

    /// Arguments passed to the node binary
    #[serde(default)]
    pub args: Vec<String>,

    /// File the node's output is captured to
    #[serde(default = "default_node_log")]
    pub log_file: PathBuf,

    /// Readiness probe polled before later steps run. Without a probe
    /// the launch is fire-and-forget.
    #[serde(default)]
    pub ready: Option<ReadyProbe>,
}

fn default_node_log() -> PathBuf {
    PathBuf::from("node.log")
}

/// How the node binary is obtained on one platform
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeSource {
    /// Download a prebuilt archive and extract the binary
    Archive { url: String, binary: String },

    /// Clone and build the node from source
    Build {
        repo: String,
        #[serde(default)]
        rev: Option<String>,
        command: String,
        binary: PathBuf,
    },
}

/// TCP readiness probe for the background node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyProbe {
    /// Port the node listens on
    pub port: u16,

    /// How long to keep polling before giving up
    #[serde(default = "default_ready_timeout")]
    pub timeout_secs: u64,

    /// Delay between polls
    #[serde(default = "default_ready_interval")]
    pub interval_ms: u64,
}

fn default_ready_timeout() -> u64 {
    60
}

fn default_ready_interval() -> u64 {
    500
}

impl PipelineConfig {
    /// Load pipeline configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read {}", path.as_ref().display()))?;
        Self::from_yaml(&content)
    }

    /// Parse pipeline configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Look up a job by id
    pub fn job(&self, id: &str) -> Option<&JobConfig> {
        self.matrix.jobs.iter().find(|j| j.id == id)
    }

    /// Validate the pipeline configuration
    pub fn validate(&self) -> Result<()> {
        if self.matrix.platforms.is_empty() {
            anyhow::bail!("Matrix lists no platforms");
        }
        if self.matrix.toolchains.is_empty() {
            anyhow::bail!("Matrix lists no toolchains");
        }
        if self.matrix.jobs.is_empty() {
            anyhow::bail!("Matrix lists no jobs");
        }

        let mut seen_ids = std::collections::HashSet::new();
        for job in &self.matrix.jobs {
            if !seen_ids.insert(&job.id) {
                anyhow::bail!("Duplicate job ID: {}", job.id);
            }
            if job.command.trim().is_empty() {
                anyhow::bail!("Job '{}' has an empty command", job.id);
            }
        }

        for exclude in &self.matrix.exclude {
            if exclude.platform.is_none() && exclude.toolchain.is_none() && exclude.job.is_none() {
                anyhow::bail!("Matrix exclude entry matches every cell");
            }
            if let Some(platform) = exclude.platform {
                if !self.matrix.platforms.contains(&platform) {
                    anyhow::bail!("Matrix exclude references unlisted platform '{}'", platform);
                }
            }
            if let Some(ref toolchain) = exclude.toolchain {
                if !self.matrix.toolchains.contains(toolchain) {
                    anyhow::bail!(
                        "Matrix exclude references unlisted toolchain '{}'",
                        toolchain
                    );
                }
            }
            if let Some(ref job) = exclude.job {
                if self.job(job).is_none() {
                    anyhow::bail!("Matrix exclude references non-existent job '{}'", job);
                }
            }
        }

        self.triggers.validate()?;

        let mut seen_tools = std::collections::HashSet::new();
        for tool in &self.tools {
            if !seen_tools.insert(&tool.name) {
                anyhow::bail!("Duplicate tool name: {}", tool.name);
            }
            if tool.install.trim().is_empty() {
                anyhow::bail!("Tool '{}' has an empty install command", tool.name);
            }
        }

        // Every listed platform needs exactly one node-source branch. The
        // map already guarantees at most one; presence is checked here.
        if let Some(ref node) = self.node {
            for platform in &self.matrix.platforms {
                if !node.artifacts.contains_key(platform) {
                    anyhow::bail!("No node artifact configured for platform '{}'", platform);
                }
            }
        }

        for diagnostic in &self.diagnostics {
            if diagnostic.trim().is_empty() {
                anyhow::bail!("Empty diagnostics command");
            }
        }

        validate_hooks(&self.hooks)?;

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Configuration exercising every section, shaped like the contract
    /// template this tool grew out of.
    pub(crate) const FULL_YAML: &str = r#"
name: "contract-ci"

triggers:
  push:
    branches: [main]
    tags: ['v[0-9]+\.[0-9]+\.[0-9]+']
  pull_request:
    branches: [main]

env:
  RUST_BACKTRACE: full

matrix:
  platforms: [linux, macos, windows]
  toolchains: [stable]
  jobs:
    - id: fmt
      name: "Format check"
      command: "cargo fmt --all -- --check"
    - id: lint
      command: "cargo dylint --all -- --all-features"
    - id: contract-build
      command: "cargo contract build"
    - id: e2e
      command: "cargo test --features e2e-tests -- --nocapture"

toolchain:
  components: [rust-src]
  profile: minimal

cache:
  lockfile: Cargo.lock
  paths: [target]

tools:
  - name: cargo-contract
    install: "cargo install cargo-contract --locked"
    if_missing: cargo-contract
  - name: cargo-dylint
    install: "cargo install cargo-dylint --locked"
    if_missing: cargo-dylint
  - name: dylint-link
    install: "cargo install dylint-link --locked"
    if_missing: dylint-link

node:
  artifacts:
    linux:
      archive:
        url: "https://example.invalid/node-linux.tar.gz"
        binary: substrate-contracts-node
    macos:
      archive:
        url: "https://example.invalid/node-mac.tar.gz"
        binary: substrate-contracts-node
    windows:
      build:
        repo: "https://github.com/paritytech/substrate-contracts-node"
        rev: "v0.23.0"
        command: "cargo build --release"
        binary: "target/release/substrate-contracts-node.exe"
  args: ["--dev"]
  log_file: node.log
  ready:
    port: 9944
    timeout_secs: 60
    interval_ms: 500

diagnostics:
  - "rustup show"
  - "cargo contract --version"

hooks:
  - id: trailing-whitespace
    name: "Trim trailing whitespace"
    builtin: trailing-whitespace
    types: [text]
  - id: end-of-file-fixer
    name: "Fix end of files"
    builtin: end-of-file-fixer
    types: [text]
  - id: fmt
    name: "cargo fmt"
    entry: "cargo fmt --all"
    types: [rust]
    pass_filenames: false
  - id: fmt-check
    name: "cargo fmt check"
    entry: "cargo fmt --all -- --check"
    types: [rust]
    pass_filenames: false
  - id: lint
    name: "cargo dylint"
    entry: "cargo dylint --all -- --all-features"
    types: [rust]
    pass_filenames: false
  - id: contract-check
    name: "cargo contract check"
    entry: "cargo contract check"
    types: [rust]
    pass_filenames: false
"#;

    #[test]
    fn test_parse_full_config() {
        let config = PipelineConfig::from_yaml(FULL_YAML).unwrap();
        assert_eq!(config.name, "contract-ci");
        assert_eq!(config.matrix.platforms.len(), 3);
        assert_eq!(config.matrix.jobs.len(), 4);
        assert_eq!(config.tools.len(), 3);
        assert_eq!(config.hooks.len(), 6);
        assert_eq!(config.env.get("RUST_BACKTRACE").map(String::as_str), Some("full"));

        let node = config.node.as_ref().unwrap();
        assert_eq!(node.artifacts.len(), 3);
        assert!(matches!(
            node.artifacts.get(&Platform::Windows),
            Some(NodeSource::Build { .. })
        ));
        assert_eq!(node.ready.as_ref().unwrap().port, 9944);
    }

    #[test]
    fn test_duplicate_job_id_fails() {
        let yaml = r#"
name: "Test"
matrix:
  platforms: [linux]
  toolchains: [stable]
  jobs:
    - id: fmt
      command: "cargo fmt"
    - id: fmt
      command: "cargo fmt --check"
"#;
        assert!(PipelineConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_empty_axis_fails() {
        let yaml = r#"
name: "Test"
matrix:
  platforms: []
  toolchains: [stable]
  jobs:
    - id: fmt
      command: "cargo fmt"
"#;
        assert!(PipelineConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_exclude_unknown_job_fails() {
        let yaml = r#"
name: "Test"
matrix:
  platforms: [linux]
  toolchains: [stable]
  jobs:
    - id: fmt
      command: "cargo fmt"
  exclude:
    - job: nonexistent
"#;
        assert!(PipelineConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_missing_node_artifact_fails() {
        let yaml = r#"
name: "Test"
matrix:
  platforms: [linux, windows]
  toolchains: [stable]
  jobs:
    - id: fmt
      command: "cargo fmt"
node:
  artifacts:
    linux:
      archive:
        url: "https://example.invalid/node.tar.gz"
        binary: node
"#;
        let err = PipelineConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("windows"));
    }

    #[test]
    fn test_invalid_tag_pattern_fails() {
        let yaml = r#"
name: "Test"
triggers:
  push:
    tags: ['v[']
matrix:
  platforms: [linux]
  toolchains: [stable]
  jobs:
    - id: fmt
      command: "cargo fmt"
"#;
        assert!(PipelineConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_hook_without_action_fails() {
        let yaml = r#"
name: "Test"
matrix:
  platforms: [linux]
  toolchains: [stable]
  jobs:
    - id: fmt
      command: "cargo fmt"
hooks:
  - id: broken
    name: "Broken"
    types: [rust]
"#;
        assert!(PipelineConfig::from_yaml(yaml).is_err());
    }
}
