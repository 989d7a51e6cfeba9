//! Execution: command seam, step plans, per-cell runner, matrix engine

pub mod cache;
pub mod command;
pub mod engine;
pub mod plan;
pub mod runner;

pub use cache::BuildCache;
pub use command::{CommandError, CommandExecutor, CommandOutput, CommandSpec, ShellExecutor};
pub use engine::{EventSink, ExecutionEvent, MatrixEngine, RunReport, SchedulingStrategy};
pub use plan::build_plan;
pub use runner::{JobReport, JobRunner, StepReport};
