//! Job runner - executes one matrix cell's step plan

use crate::core::config::PipelineConfig;
use crate::core::matrix::MatrixCell;
use crate::core::state::StepStatus;
use crate::core::step::{Step, StepAction};
use crate::execution::cache::BuildCache;
use crate::execution::command::{CommandExecutor, CommandSpec, DEFAULT_TIMEOUT_SECS};
use crate::execution::engine::EventSink;
use crate::execution::engine::ExecutionEvent;
use crate::execution::plan::build_plan;
use crate::node::{NodeHandle, NodeSupervisor};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Outcome of one step
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub name: String,
    pub status: StepStatus,
}

/// Outcome of one matrix cell
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub cell: String,
    pub steps: Vec<StepReport>,
    pub passed: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl JobReport {
    /// The step the job failed on, if any
    pub fn failed_step(&self) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.status.is_failure())
    }
}

/// Executes a cell's plan strictly in sequence.
///
/// The first failing step fails the job; the remaining steps are
/// reported as skipped. A node launched for the cell is stopped when the
/// cell finishes.
pub struct JobRunner<E> {
    executor: Arc<E>,
    cache: Option<BuildCache>,
    workdir: PathBuf,
    work_root: PathBuf,
}

impl<E: CommandExecutor> JobRunner<E> {
    pub fn new(
        executor: Arc<E>,
        cache: Option<BuildCache>,
        workdir: impl Into<PathBuf>,
        work_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            executor,
            cache,
            workdir: workdir.into(),
            work_root: work_root.into(),
        }
    }

    /// Run one cell to completion
    pub async fn run(
        &self,
        config: &PipelineConfig,
        cell: &MatrixCell,
        events: &EventSink,
    ) -> JobReport {
        let started_at = Utc::now();
        let label = cell.label();
        info!("Running cell {}", label);

        let plan = build_plan(config, cell);
        let mut reports = Vec::with_capacity(plan.len());
        let mut node: Option<NodeHandle> = None;
        let mut failed = false;

        for step in &plan {
            if failed {
                reports.push(StepReport {
                    name: step.name.clone(),
                    status: StepStatus::Skipped {
                        reason: "previous step failed".to_string(),
                    },
                });
                continue;
            }

            if !step.applies_to(cell.platform) {
                reports.push(StepReport {
                    name: step.name.clone(),
                    status: StepStatus::Skipped {
                        reason: format!("not applicable on {}", cell.platform),
                    },
                });
                continue;
            }

            events(ExecutionEvent::StepStarted {
                cell: label.clone(),
                step: step.name.clone(),
            });

            let clock = Instant::now();
            let status = match self.run_step(config, cell, step, &mut node).await {
                Ok(Some(reason)) => StepStatus::Skipped { reason },
                Ok(None) => StepStatus::Passed {
                    duration_ms: clock.elapsed().as_millis() as u64,
                },
                Err(error) => {
                    failed = true;
                    StepStatus::Failed {
                        error,
                        duration_ms: clock.elapsed().as_millis() as u64,
                    }
                }
            };

            events(ExecutionEvent::StepFinished {
                cell: label.clone(),
                step: step.name.clone(),
                status: status.clone(),
            });
            reports.push(StepReport {
                name: step.name.clone(),
                status,
            });
        }

        if let Some(handle) = node {
            if let Err(e) = handle.shutdown().await {
                warn!("Failed to stop node for {}: {}", label, e);
            }
        }

        JobReport {
            cell: label,
            steps: reports,
            passed: !failed,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Run one step. `Ok(Some(reason))` means the step was skipped.
    async fn run_step(
        &self,
        config: &PipelineConfig,
        cell: &MatrixCell,
        step: &Step,
        node: &mut Option<NodeHandle>,
    ) -> Result<Option<String>, String> {
        match &step.action {
            StepAction::Command(command) => {
                let spec = self.command_spec(config, cell, command);
                self.executor
                    .run(&spec)
                    .await
                    .map(|_| None)
                    .map_err(|e| e.to_string())
            }

            StepAction::InstallTool(tool) => {
                if let Some(ref probe) = tool.if_missing {
                    if self.executor.binary_exists(probe).await {
                        return Ok(Some(format!("{} already installed", tool.name)));
                    }
                }
                let spec = self.command_spec(config, cell, &tool.install);
                self.executor
                    .run(&spec)
                    .await
                    .map(|_| None)
                    .map_err(|e| e.to_string())
            }

            StepAction::RestoreCache => {
                let (cache, cache_config) = match (&self.cache, &config.cache) {
                    (Some(c), Some(cc)) => (c, cc),
                    _ => return Ok(Some("no cache configured".to_string())),
                };
                let key = cache.key(&cell.toolchain, &self.workdir.join(&cache_config.lockfile));
                match cache.restore(&key, &self.workdir, &cache_config.paths) {
                    Ok(true) => Ok(None),
                    Ok(false) => Ok(Some("cache miss".to_string())),
                    Err(e) => Err(e.to_string()),
                }
            }

            StepAction::SaveCache => {
                let (cache, cache_config) = match (&self.cache, &config.cache) {
                    (Some(c), Some(cc)) => (c, cc),
                    _ => return Ok(Some("no cache configured".to_string())),
                };
                let key = cache.key(&cell.toolchain, &self.workdir.join(&cache_config.lockfile));
                cache
                    .save(&key, &self.workdir, &cache_config.paths)
                    .map(|_| None)
                    .map_err(|e| e.to_string())
            }

            StepAction::LaunchNode => {
                let node_config = match &config.node {
                    Some(n) => n,
                    None => return Ok(Some("no node configured".to_string())),
                };
                let supervisor = NodeSupervisor::new(self.executor.clone(), &self.work_root);
                let handle = supervisor
                    .launch(node_config, cell.platform, &self.workdir)
                    .await
                    .map_err(|e| e.to_string())?;
                *node = Some(handle);
                Ok(None)
            }
        }
    }

    fn command_spec(&self, config: &PipelineConfig, cell: &MatrixCell, command: &str) -> CommandSpec {
        let mut spec = CommandSpec::new(command)
            .cwd(&self.workdir)
            .timeout_secs(config.step_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
            .env("RUSTUP_TOOLCHAIN", &cell.toolchain);
        for (key, value) in &config.env {
            spec = spec.env(key, value);
        }
        spec
    }
}
