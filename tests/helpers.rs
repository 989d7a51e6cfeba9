//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use gantry::execution::{CommandError, CommandExecutor, CommandOutput, CommandSpec};
use std::sync::Mutex;

/// Executor that records every command line and fails on request
pub struct RecordingExecutor {
    pub seen: Mutex<Vec<String>>,
    pub fail_on: Vec<String>,
    pub present_binaries: Vec<String>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
            fail_on: Vec::new(),
            present_binaries: Vec::new(),
        }
    }

    pub fn failing_on(patterns: &[&str]) -> Self {
        Self {
            fail_on: patterns.iter().map(|p| p.to_string()).collect(),
            ..Self::new()
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        self.seen.lock().unwrap().push(spec.command.clone());
        if self.fail_on.iter().any(|p| spec.command.contains(p)) {
            return Err(CommandError::NonZeroExit {
                command: spec.command.clone(),
                code: 1,
                stderr: "injected failure".to_string(),
            });
        }
        Ok(CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
        })
    }

    async fn binary_exists(&self, name: &str) -> bool {
        self.present_binaries.iter().any(|b| b == name)
    }
}

/// A pipeline configuration shaped like the contract template's CI:
/// format check, lint, contract build and e2e jobs over one platform.
pub const CONTRACT_CI_YAML: &str = r#"
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
  platforms: [linux]
  toolchains: [stable]
  jobs:
    - id: fmt
      command: "cargo fmt --all -- --check"
    - id: lint
      command: "cargo dylint --all -- --all-features"
    - id: contract-build
      command: "cargo contract build"
    - id: e2e
      command: "cargo test --features e2e-tests -- --nocapture"

toolchain:
  components: [rust-src]

tools:
  - name: cargo-contract
    install: "cargo install cargo-contract --locked"
    if_missing: cargo-contract

diagnostics:
  - "rustup show"
"#;
