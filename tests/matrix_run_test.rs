//! End-to-end matrix runs against a recording executor

mod helpers;

use gantry::core::{PipelineConfig, Platform};
use gantry::execution::{ExecutionEvent, MatrixEngine, SchedulingStrategy};
use gantry::{RunStatus, StepStatus};
use helpers::RecordingExecutor;
use std::sync::{Arc, Mutex};

fn engine(executor: RecordingExecutor, strategy: SchedulingStrategy) -> MatrixEngine<RecordingExecutor> {
    MatrixEngine::new(executor, strategy, ".", ".")
}

#[tokio::test]
async fn full_matrix_passes_and_runs_steps_in_order() {
    let config = PipelineConfig::from_yaml(helpers::CONTRACT_CI_YAML).unwrap();
    let cells = config.matrix.expand_for(Platform::Linux, Some("fmt"));
    assert_eq!(cells.len(), 1);

    let engine = engine(RecordingExecutor::new(), SchedulingStrategy::Sequential);
    let report = engine.execute(&config, cells).await;

    assert!(report.passed());
    assert_eq!(report.state.status, RunStatus::Passed);

    let job = &report.jobs[0];
    assert_eq!(job.cell, "linux/stable/fmt");
    assert!(job.steps.iter().all(|s| !s.status.is_failure()));

    // The fixed step sequence, in order
    let names: Vec<&str> = job.steps.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "sync sources",
            "install toolchain stable",
            "install cargo-contract",
            "report tool versions",
            "job: fmt",
        ]
    );
}

#[tokio::test]
async fn every_job_in_the_matrix_gets_a_cell() {
    let config = PipelineConfig::from_yaml(helpers::CONTRACT_CI_YAML).unwrap();
    let cells = config.matrix.expand();
    assert_eq!(cells.len(), 4);

    let engine = engine(RecordingExecutor::new(), SchedulingStrategy::Sequential);
    let report = engine.execute(&config, cells).await;

    assert!(report.passed());
    let labels: Vec<&str> = report.jobs.iter().map(|j| j.cell.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "linux/stable/fmt",
            "linux/stable/lint",
            "linux/stable/contract-build",
            "linux/stable/e2e",
        ]
    );
}

#[tokio::test]
async fn failing_job_command_fails_its_cell_only() {
    let config = PipelineConfig::from_yaml(helpers::CONTRACT_CI_YAML).unwrap();
    let cells = config.matrix.expand();

    let engine = engine(
        RecordingExecutor::failing_on(&["cargo dylint"]),
        SchedulingStrategy::Sequential,
    );
    let report = engine.execute(&config, cells).await;

    assert!(!report.passed());
    assert_eq!(report.state.failed_cells, 1);
    assert_eq!(report.state.passed_cells, 3);

    let failed = report.jobs.iter().find(|j| !j.passed).unwrap();
    assert_eq!(failed.cell, "linux/stable/lint");
    assert_eq!(failed.failed_step().unwrap().name, "job: lint");
}

#[tokio::test]
async fn tool_install_failure_aborts_the_cell_before_the_job_runs() {
    let config = PipelineConfig::from_yaml(helpers::CONTRACT_CI_YAML).unwrap();
    let cells = config.matrix.expand_for(Platform::Linux, Some("contract-build"));

    let executor = RecordingExecutor::failing_on(&["cargo install cargo-contract"]);
    let engine = MatrixEngine::new(executor, SchedulingStrategy::Sequential, ".", ".");
    let report = engine.execute(&config, cells).await;

    assert!(!report.passed());
    let job = &report.jobs[0];
    assert_eq!(job.failed_step().unwrap().name, "install cargo-contract");

    // The job command never ran; it is reported as skipped
    let job_step = job.steps.iter().find(|s| s.name.starts_with("job:")).unwrap();
    assert!(matches!(job_step.status, StepStatus::Skipped { .. }));
}

#[tokio::test]
async fn parallel_strategy_completes_every_cell() {
    let config = PipelineConfig::from_yaml(helpers::CONTRACT_CI_YAML).unwrap();
    let cells = config.matrix.expand();

    let engine = engine(RecordingExecutor::new(), SchedulingStrategy::Parallel);
    let report = engine.execute(&config, cells).await;

    assert!(report.passed());
    assert_eq!(report.jobs.len(), 4);
    assert_eq!(report.state.passed_cells, 4);
}

#[tokio::test]
async fn run_events_bracket_the_cells() {
    let config = PipelineConfig::from_yaml(helpers::CONTRACT_CI_YAML).unwrap();
    let cells = config.matrix.expand_for(Platform::Linux, Some("fmt"));

    let engine = engine(RecordingExecutor::new(), SchedulingStrategy::Sequential);
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    engine.add_event_handler(move |event| {
        sink.lock().unwrap().push(event);
    });

    engine.execute(&config, cells).await;

    let events = events.lock().unwrap();
    assert!(matches!(events.first(), Some(ExecutionEvent::RunStarted { .. })));
    assert!(matches!(
        events.last(),
        Some(ExecutionEvent::RunCompleted {
            status: RunStatus::Passed,
            ..
        })
    ));
    let cell_finishes = events
        .iter()
        .filter(|e| matches!(e, ExecutionEvent::CellFinished { .. }))
        .count();
    assert_eq!(cell_finishes, 1);
}
