//! Commit gate end-to-end: builtin fixers and entry hooks in a temp tree

use gantry::hooks::{BuiltinHook, FileType, HookDefinition, HookOutcome, HookRunner};
use gantry::ShellExecutor;
use std::path::PathBuf;
use std::sync::Arc;

fn builtin(id: &str, action: BuiltinHook) -> HookDefinition {
    HookDefinition {
        id: id.to_string(),
        name: id.to_string(),
        entry: None,
        builtin: Some(action),
        types: vec![FileType::Text],
        pass_filenames: true,
    }
}

fn entry(id: &str, command: &str) -> HookDefinition {
    HookDefinition {
        id: id.to_string(),
        name: id.to_string(),
        entry: Some(command.to_string()),
        builtin: None,
        types: vec![FileType::Rust],
        pass_filenames: false,
    }
}

#[tokio::test]
async fn clean_tree_passes_the_whole_gate() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("lib.rs"), "fn main() {}\n").unwrap();

    let hooks = vec![
        builtin("trailing-whitespace", BuiltinHook::TrailingWhitespace),
        builtin("end-of-file-fixer", BuiltinHook::EndOfFileFixer),
        entry("fmt-check", "true"),
    ];
    let runner = HookRunner::new(Arc::new(ShellExecutor::new()), dir.path());

    let report = runner.run(&hooks, &[PathBuf::from("lib.rs")]).await;
    assert!(report.passed());
}

#[tokio::test]
async fn misformatted_file_blocks_then_passes_after_the_fix() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("lib.rs");
    std::fs::write(&file, "fn main() {}   ").unwrap();

    let hooks = vec![
        builtin("trailing-whitespace", BuiltinHook::TrailingWhitespace),
        builtin("end-of-file-fixer", BuiltinHook::EndOfFileFixer),
    ];
    let runner = HookRunner::new(Arc::new(ShellExecutor::new()), dir.path());
    let files = vec![PathBuf::from("lib.rs")];

    // First run: both fixers touch the file and block the commit
    let report = runner.run(&hooks, &files).await;
    assert!(!report.passed());
    assert!(report
        .results
        .iter()
        .all(|r| matches!(r.outcome, HookOutcome::Modified { .. })));
    assert_eq!(
        std::fs::read_to_string(&file).unwrap(),
        "fn main() {}\n"
    );

    // Second run: nothing left to fix
    let report = runner.run(&hooks, &files).await;
    assert!(report.passed());
}

#[tokio::test]
async fn failing_entry_command_blocks_the_commit() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("lib.rs"), "fn main() {}\n").unwrap();

    let hooks = vec![entry("lint", "false"), entry("check", "true")];
    let runner = HookRunner::new(Arc::new(ShellExecutor::new()), dir.path());

    let report = runner.run(&hooks, &[PathBuf::from("lib.rs")]).await;
    assert!(!report.passed());
    assert!(matches!(report.results[0].outcome, HookOutcome::Failed { .. }));
    // Later hooks still ran
    assert!(matches!(report.results[1].outcome, HookOutcome::Passed));
}

#[tokio::test]
async fn hooks_with_no_matching_files_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.md"), "notes\n").unwrap();

    // A rust-only hook sees a markdown-only change set
    let hooks = vec![entry("fmt-check", "false")];
    let runner = HookRunner::new(Arc::new(ShellExecutor::new()), dir.path());

    let report = runner.run(&hooks, &[PathBuf::from("notes.md")]).await;
    assert!(report.passed());
    assert!(matches!(
        report.results[0].outcome,
        HookOutcome::Skipped { .. }
    ));
}

#[tokio::test]
async fn whole_project_hook_runs_in_the_work_tree() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("lib.rs"), "fn main() {}\n").unwrap();

    // pass_filenames: false - the hook decides its own scope; prove it
    // ran from the project root rather than on the passed files
    let hooks = vec![entry("marker", "printf ran > marker.txt")];
    let runner = HookRunner::new(Arc::new(ShellExecutor::new()), dir.path());

    let report = runner.run(&hooks, &[PathBuf::from("lib.rs")]).await;
    assert!(report.passed());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("marker.txt")).unwrap(),
        "ran"
    );
}
