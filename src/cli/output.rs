//! CLI output formatting

use crate::core::state::{RunStatus, StepStatus};
use crate::execution::ExecutionEvent;
use crate::hooks::{HookOutcome, HookResult};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a progress bar across matrix cells
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format a step status for display
pub fn format_step_status(status: &StepStatus) -> String {
    match status {
        StepStatus::Passed { duration_ms } => format!(
            "{} ({})",
            style("passed").green(),
            style(format_millis(*duration_ms)).dim()
        ),
        StepStatus::Failed { error, .. } => {
            format!("{}: {}", style("failed").red(), style(error).dim())
        }
        StepStatus::Skipped { reason } => {
            format!("{} ({})", style("skipped").dim(), style(reason).dim())
        }
    }
}

/// Format a run status for display
pub fn format_run_status(status: RunStatus) -> String {
    match status {
        RunStatus::Pending => style("PENDING").dim().to_string(),
        RunStatus::Running => style("RUNNING").yellow().to_string(),
        RunStatus::Passed => style("PASSED").green().to_string(),
        RunStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// Format an execution event for display.
///
/// Step starts are only interesting in verbose runs; the progress bar
/// carries the rest.
pub fn format_execution_event(event: &ExecutionEvent, verbose: bool) -> Option<String> {
    match event {
        ExecutionEvent::RunStarted {
            run_id,
            pipeline_name,
            total_cells,
        } => Some(format!(
            "{} Starting {} ({}, {} cells)",
            ROCKET,
            style(pipeline_name).bold(),
            style(&run_id.to_string()[..8]).dim(),
            style(total_cells).cyan()
        )),
        ExecutionEvent::CellStarted { cell } => {
            Some(format!("{} {}", SPINNER, style(cell).cyan()))
        }
        ExecutionEvent::StepStarted { step, .. } => {
            if verbose {
                Some(format!("   {} {}", SPINNER, style(step).dim()))
            } else {
                None
            }
        }
        ExecutionEvent::StepFinished { step, status, .. } => {
            if verbose || status.is_failure() {
                Some(format!("   {} {}", style(step).dim(), format_step_status(status)))
            } else {
                None
            }
        }
        ExecutionEvent::CellFinished { cell, passed } => {
            if *passed {
                Some(format!("{} {}", CHECK, style(cell).green()))
            } else {
                Some(format!("{} {}", CROSS, style(cell).red()))
            }
        }
        ExecutionEvent::RunCompleted { run_id, status } => Some(format!(
            "{} Run ({}) {}",
            INFO,
            style(&run_id.to_string()[..8]).dim(),
            format_run_status(*status)
        )),
    }
}

/// Format one hook result for display
pub fn format_hook_result(result: &HookResult) -> String {
    match &result.outcome {
        HookOutcome::Passed => format!("{} {}", CHECK, style(&result.name).green()),
        HookOutcome::Skipped { reason } => format!(
            "{} {} ({})",
            INFO,
            style(&result.name).dim(),
            style(reason).dim()
        ),
        HookOutcome::Modified { files } => format!(
            "{} {} {} ({} files fixed, re-stage and commit again)",
            CROSS,
            style(&result.name).yellow(),
            style("modified files").yellow(),
            files.len()
        ),
        HookOutcome::Failed { error } => format!(
            "{} {}: {}",
            CROSS,
            style(&result.name).red(),
            style(error).dim()
        ),
    }
}

fn format_millis(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{}m {}s", ms / 60_000, (ms % 60_000) / 1000)
    }
}
