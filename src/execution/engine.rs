//! Matrix engine - orchestrates a run across all enumerated cells

use crate::core::config::PipelineConfig;
use crate::core::matrix::MatrixCell;
use crate::core::state::{RunState, RunStatus, StepStatus};
use crate::execution::cache::BuildCache;
use crate::execution::command::CommandExecutor;
use crate::execution::runner::{JobReport, JobRunner};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;
use tracing::{error, info};
use uuid::Uuid;

/// Events that occur during a run
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        run_id: Uuid,
        pipeline_name: String,
        total_cells: usize,
    },
    CellStarted {
        cell: String,
    },
    StepStarted {
        cell: String,
        step: String,
    },
    StepFinished {
        cell: String,
        step: String,
        status: StepStatus,
    },
    CellFinished {
        cell: String,
        passed: bool,
    },
    RunCompleted {
        run_id: Uuid,
        status: RunStatus,
    },
}

/// Type for event handlers
pub type EventSink = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// How cells are scheduled across the matrix
///
/// Cells share no state, so they can run in parallel; sequential is the
/// default because local cells share a working directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulingStrategy {
    #[default]
    Sequential,
    Parallel,
}

/// Result of a whole run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub state: RunState,
    pub jobs: Vec<JobReport>,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.state.status == RunStatus::Passed
    }
}

/// Matrix execution engine
pub struct MatrixEngine<E> {
    executor: Arc<E>,
    strategy: SchedulingStrategy,
    cache: Option<BuildCache>,
    workdir: PathBuf,
    work_root: PathBuf,
    handlers: Arc<Mutex<Vec<EventSink>>>,
}

impl<E: CommandExecutor + 'static> MatrixEngine<E> {
    pub fn new(
        executor: E,
        strategy: SchedulingStrategy,
        workdir: impl Into<PathBuf>,
        work_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            executor: Arc::new(executor),
            strategy,
            cache: None,
            workdir: workdir.into(),
            work_root: work_root.into(),
            handlers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Enable the build cache for this run
    pub fn with_cache(mut self, cache: BuildCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.push(Arc::new(handler));
        }
    }

    fn sink(&self) -> EventSink {
        let handlers = self.handlers.clone();
        Arc::new(move |event: ExecutionEvent| {
            if let Ok(handlers) = handlers.lock() {
                for handler in handlers.iter() {
                    handler(event.clone());
                }
            }
        })
    }

    fn runner(&self) -> JobRunner<E> {
        JobRunner::new(
            self.executor.clone(),
            self.cache.clone(),
            self.workdir.clone(),
            self.work_root.clone(),
        )
    }

    /// Execute the given cells and aggregate a run report
    pub async fn execute(&self, config: &PipelineConfig, cells: Vec<MatrixCell>) -> RunReport {
        let mut state = RunState::new();
        state.start(cells.len());
        let sink = self.sink();

        info!(
            "Starting run {} for pipeline '{}' ({} cells)",
            state.run_id,
            config.name,
            cells.len()
        );
        sink(ExecutionEvent::RunStarted {
            run_id: state.run_id,
            pipeline_name: config.name.clone(),
            total_cells: cells.len(),
        });

        let jobs = match self.strategy {
            SchedulingStrategy::Sequential => self.run_sequential(config, cells, &sink).await,
            SchedulingStrategy::Parallel => self.run_parallel(config, cells, &sink).await,
        };

        for job in &jobs {
            state.record_cell(job.passed);
            if !job.passed {
                if let Some(step) = job.failed_step() {
                    error!("Cell {} failed at step '{}'", job.cell, step.name);
                }
            }
        }
        state.finish();

        info!("Run {} finished: {:?}", state.run_id, state.status);
        sink(ExecutionEvent::RunCompleted {
            run_id: state.run_id,
            status: state.status,
        });

        RunReport { state, jobs }
    }

    async fn run_sequential(
        &self,
        config: &PipelineConfig,
        cells: Vec<MatrixCell>,
        sink: &EventSink,
    ) -> Vec<JobReport> {
        let runner = self.runner();
        let mut jobs = Vec::with_capacity(cells.len());
        for cell in cells {
            sink(ExecutionEvent::CellStarted { cell: cell.label() });
            let report = runner.run(config, &cell, sink).await;
            sink(ExecutionEvent::CellFinished {
                cell: report.cell.clone(),
                passed: report.passed,
            });
            jobs.push(report);
        }
        jobs
    }

    async fn run_parallel(
        &self,
        config: &PipelineConfig,
        cells: Vec<MatrixCell>,
        sink: &EventSink,
    ) -> Vec<JobReport> {
        let config = Arc::new(config.clone());
        let mut set = JoinSet::new();

        for (index, cell) in cells.into_iter().enumerate() {
            let runner = self.runner();
            let config = config.clone();
            let sink = sink.clone();
            set.spawn(async move {
                sink(ExecutionEvent::CellStarted { cell: cell.label() });
                let report = runner.run(&config, &cell, &sink).await;
                sink(ExecutionEvent::CellFinished {
                    cell: report.cell.clone(),
                    passed: report.passed,
                });
                (index, report)
            });
        }

        let mut indexed = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(entry) => indexed.push(entry),
                Err(e) => error!("Cell task panicked: {}", e),
            }
        }
        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, report)| report).collect()
    }
}
