//! Step domain model

use crate::core::config::ToolConfig;
use crate::core::platform::Platform;

/// An ordered unit of work within a job.
///
/// Steps execute strictly in sequence; a failing step aborts the
/// remaining steps of its job.
#[derive(Debug, Clone)]
pub struct Step {
    /// Display name
    pub name: String,

    /// Optional platform condition; unconditional steps run everywhere
    pub condition: Option<StepCondition>,

    /// What the step does
    pub action: StepAction,
}

/// Condition gating a step, keyed on platform
#[derive(Debug, Clone)]
pub enum StepCondition {
    Platforms(Vec<Platform>),
}

/// What a step executes
#[derive(Debug, Clone)]
pub enum StepAction {
    /// Run a shell command
    Command(String),

    /// Install an auxiliary tool (skipped when its probe binary exists)
    InstallTool(ToolConfig),

    /// Restore the build cache for this cell
    RestoreCache,

    /// Save the build cache after a successful job
    SaveCache,

    /// Download/build and launch the background test node
    LaunchNode,
}

impl Step {
    /// Unconditional shell command step
    pub fn command(name: impl Into<String>, command: impl Into<String>) -> Self {
        Step {
            name: name.into(),
            condition: None,
            action: StepAction::Command(command.into()),
        }
    }

    /// Structured action step
    pub fn action(name: impl Into<String>, action: StepAction) -> Self {
        Step {
            name: name.into(),
            condition: None,
            action,
        }
    }

    /// Restrict the step to a set of platforms
    pub fn only_on(mut self, platforms: Vec<Platform>) -> Self {
        self.condition = Some(StepCondition::Platforms(platforms));
        self
    }

    /// Whether the step runs on the given platform
    pub fn applies_to(&self, platform: Platform) -> bool {
        match &self.condition {
            None => true,
            Some(StepCondition::Platforms(platforms)) => platforms.contains(&platform),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconditional_step_applies_everywhere() {
        let step = Step::command("fmt", "cargo fmt");
        assert!(step.applies_to(Platform::Linux));
        assert!(step.applies_to(Platform::Windows));
    }

    #[test]
    fn test_platform_condition() {
        let step = Step::command("fmt", "cargo fmt").only_on(vec![Platform::Linux]);
        assert!(step.applies_to(Platform::Linux));
        assert!(!step.applies_to(Platform::Macos));
    }
}
