//! Hook runner - the commit gate

use crate::execution::command::{CommandExecutor, CommandSpec};
use crate::hooks::config::{BuiltinHook, HookDefinition};
use crate::hooks::fixers;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of one hook
#[derive(Debug, Clone)]
pub enum HookOutcome {
    /// Hook ran and found nothing to complain about
    Passed,
    /// No candidate file matched the hook's type filter
    Skipped { reason: String },
    /// A builtin fixer changed files; re-stage and commit again
    Modified { files: Vec<PathBuf> },
    /// The entry command failed
    Failed { error: String },
}

impl HookOutcome {
    /// Whether this outcome blocks the commit
    pub fn blocks_commit(&self) -> bool {
        matches!(self, HookOutcome::Modified { .. } | HookOutcome::Failed { .. })
    }
}

/// Result of one hook run
#[derive(Debug, Clone)]
pub struct HookResult {
    pub id: String,
    pub name: String,
    pub outcome: HookOutcome,
}

/// Result of a full gate run
#[derive(Debug, Clone, Default)]
pub struct HookReport {
    pub results: Vec<HookResult>,
}

impl HookReport {
    /// Whether the commit may proceed
    pub fn passed(&self) -> bool {
        !self.results.iter().any(|r| r.outcome.blocks_commit())
    }
}

/// Runs hooks in listed order against a set of candidate files
pub struct HookRunner<E> {
    executor: Arc<E>,
    workdir: PathBuf,
}

impl<E: CommandExecutor> HookRunner<E> {
    pub fn new(executor: Arc<E>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            executor,
            workdir: workdir.into(),
        }
    }

    /// Run every hook whose filter matches at least one candidate file.
    ///
    /// Hooks are independent: a failure does not stop later hooks, it
    /// only blocks the commit at the end.
    pub async fn run(&self, hooks: &[HookDefinition], files: &[PathBuf]) -> HookReport {
        let mut report = HookReport::default();

        for hook in hooks {
            let matched = hook.matching_files(files);
            let outcome = if matched.is_empty() {
                debug!("Hook {} skipped, no matching files", hook.id);
                HookOutcome::Skipped {
                    reason: "no matching files".to_string(),
                }
            } else {
                info!("Running hook {} on {} files", hook.id, matched.len());
                self.run_hook(hook, &matched).await
            };

            report.results.push(HookResult {
                id: hook.id.clone(),
                name: hook.name.clone(),
                outcome,
            });
        }

        report
    }

    async fn run_hook(&self, hook: &HookDefinition, matched: &[&Path]) -> HookOutcome {
        if let Some(builtin) = hook.builtin {
            return self.run_builtin(builtin, matched);
        }

        let entry = match &hook.entry {
            Some(entry) => entry,
            // Unreachable for validated configs
            None => {
                return HookOutcome::Failed {
                    error: "hook has no entry command".to_string(),
                }
            }
        };

        let command = if hook.pass_filenames {
            let mut command = entry.clone();
            for file in matched {
                command.push(' ');
                command.push_str(&shell_quote(&file.to_string_lossy()));
            }
            command
        } else {
            entry.clone()
        };

        let spec = CommandSpec::new(command).cwd(&self.workdir);
        match self.executor.run(&spec).await {
            Ok(_) => HookOutcome::Passed,
            Err(e) => HookOutcome::Failed {
                error: e.to_string(),
            },
        }
    }

    fn run_builtin(&self, builtin: BuiltinHook, matched: &[&Path]) -> HookOutcome {
        let fix = match builtin {
            BuiltinHook::TrailingWhitespace => fixers::fix_trailing_whitespace,
            BuiltinHook::EndOfFileFixer => fixers::fix_end_of_file,
        };

        let mut modified = Vec::new();
        for file in matched {
            let path = self.workdir.join(file);
            if !path.is_file() {
                continue;
            }
            match fix(&path) {
                Ok(true) => modified.push(file.to_path_buf()),
                Ok(false) => {}
                Err(e) => {
                    return HookOutcome::Failed {
                        error: format!("{}: {}", file.display(), e),
                    }
                }
            }
        }

        if modified.is_empty() {
            HookOutcome::Passed
        } else {
            HookOutcome::Modified { files: modified }
        }
    }
}

/// Minimal POSIX quoting for file arguments
fn shell_quote(s: &str) -> String {
    if s.chars().all(|c| c.is_ascii_alphanumeric() || "./_-".contains(c)) {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
