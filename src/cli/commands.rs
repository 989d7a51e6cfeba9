//! CLI command definitions

use crate::core::platform::Platform;
use crate::core::trigger::TriggerEvent;
use crate::execution::SchedulingStrategy;
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Run the matrix for this host
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Platform to select cells for (defaults to the host platform)
    #[arg(long)]
    pub platform: Option<Platform>,

    /// Run only the cells of one job
    #[arg(long)]
    pub job: Option<String>,

    /// Scheduling strategy across cells
    #[arg(long, value_enum, default_value_t = SchedulingStrategyArg::Sequential)]
    pub strategy: SchedulingStrategyArg,

    /// Disable the build cache
    #[arg(long)]
    pub no_cache: bool,

    /// Working directory for the run (defaults to the current directory)
    #[arg(long)]
    pub workdir: Option<PathBuf>,
}

/// Validate the pipeline configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Output the parsed configuration as JSON
    #[arg(long)]
    pub json: bool,
}

/// Check whether an event would trigger the pipeline
#[derive(Debug, Args, Clone)]
pub struct TriggerCommand {
    /// Evaluate a push to a branch
    #[arg(long, group = "event")]
    pub branch: Option<String>,

    /// Evaluate a tag push
    #[arg(long, group = "event")]
    pub tag: Option<String>,

    /// Evaluate a pull request targeting a branch
    #[arg(long, group = "event")]
    pub pr_target: Option<String>,
}

impl TriggerCommand {
    /// The event described by the arguments, if any
    pub fn event(&self) -> Option<TriggerEvent> {
        if let Some(branch) = &self.branch {
            Some(TriggerEvent::Push {
                branch: branch.clone(),
            })
        } else if let Some(tag) = &self.tag {
            Some(TriggerEvent::Tag { tag: tag.clone() })
        } else {
            self.pr_target.as_ref().map(|target| TriggerEvent::PullRequest {
                target: target.clone(),
            })
        }
    }
}

/// Commit gate commands
#[derive(Debug, Args, Clone)]
pub struct HooksCommand {
    #[command(subcommand)]
    pub action: HooksAction,
}

#[derive(Debug, Subcommand, Clone)]
pub enum HooksAction {
    /// Run the configured hooks against staged files
    Run(HooksRunCommand),

    /// Install the pre-commit hook into .git/hooks
    Install,
}

#[derive(Debug, Args, Clone)]
pub struct HooksRunCommand {
    /// Run against every tracked file instead of the staged set
    #[arg(long)]
    pub all_files: bool,
}

/// Scheduling strategy argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SchedulingStrategyArg {
    Sequential,
    Parallel,
}

impl From<SchedulingStrategyArg> for SchedulingStrategy {
    fn from(arg: SchedulingStrategyArg) -> Self {
        match arg {
            SchedulingStrategyArg::Sequential => SchedulingStrategy::Sequential,
            SchedulingStrategyArg::Parallel => SchedulingStrategy::Parallel,
        }
    }
}
