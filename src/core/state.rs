//! Run state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run has not started
    Pending,
    /// Run is currently executing cells
    Running,
    /// Every cell passed
    Passed,
    /// At least one cell failed
    Failed,
}

/// Outcome of one step within a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StepStatus {
    /// Step ran and exited cleanly
    Passed { duration_ms: u64 },
    /// Step failed; the job aborts here
    Failed { error: String, duration_ms: u64 },
    /// Step did not run (condition unmatched, or an earlier step failed)
    Skipped { reason: String },
}

impl StepStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, StepStatus::Failed { .. })
    }
}

/// Overall run state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// Unique run ID
    pub run_id: Uuid,

    /// Current status
    pub status: RunStatus,

    /// When the run started
    pub started_at: Option<DateTime<Utc>>,

    /// When the run finished
    pub completed_at: Option<DateTime<Utc>>,

    /// Total number of cells
    pub total_cells: usize,

    /// Number of passed cells
    pub passed_cells: usize,

    /// Number of failed cells
    pub failed_cells: usize,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            status: RunStatus::Pending,
            started_at: None,
            completed_at: None,
            total_cells: 0,
            passed_cells: 0,
            failed_cells: 0,
        }
    }

    /// Mark the run as started
    pub fn start(&mut self, total_cells: usize) {
        self.status = RunStatus::Running;
        self.started_at = Some(Utc::now());
        self.total_cells = total_cells;
    }

    /// Record a finished cell
    pub fn record_cell(&mut self, passed: bool) {
        if passed {
            self.passed_cells += 1;
        } else {
            self.failed_cells += 1;
        }
    }

    /// Mark the run as finished; failed if any cell failed
    pub fn finish(&mut self) {
        self.status = if self.failed_cells > 0 {
            RunStatus::Failed
        } else {
            RunStatus::Passed
        };
        self.completed_at = Some(Utc::now());
    }

    /// Progress across cells (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.total_cells == 0 {
            return 0.0;
        }
        (self.passed_cells + self.failed_cells) as f64 / self.total_cells as f64
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}
