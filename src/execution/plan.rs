//! Plan builder - the fixed step sequence a cell executes

use crate::core::config::PipelineConfig;
use crate::core::matrix::MatrixCell;
use crate::core::step::{Step, StepAction};

/// Build the ordered step plan for one matrix cell.
///
/// The sequence is fixed: sync sources, install toolchain, restore
/// cache, install tools, launch the test node, report versions, run the
/// job, save cache. Sections without configuration are simply absent.
pub fn build_plan(config: &PipelineConfig, cell: &MatrixCell) -> Vec<Step> {
    let mut steps = Vec::new();

    steps.push(Step::command(
        "sync sources",
        "git submodule update --init --recursive",
    ));

    steps.push(Step::command(
        format!("install toolchain {}", cell.toolchain),
        toolchain_install_command(config, &cell.toolchain),
    ));

    if config.cache.is_some() {
        steps.push(Step::action("restore cache", StepAction::RestoreCache));
    }

    for tool in &config.tools {
        let mut step = Step::action(
            format!("install {}", tool.name),
            StepAction::InstallTool(tool.clone()),
        );
        if let Some(ref platforms) = tool.platforms {
            step = step.only_on(platforms.clone());
        }
        steps.push(step);
    }

    if config.node.is_some() {
        steps.push(Step::action("launch node", StepAction::LaunchNode));
    }

    if !config.diagnostics.is_empty() {
        steps.push(Step::command(
            "report tool versions",
            config.diagnostics.join(" && "),
        ));
    }

    steps.push(Step::command(
        format!("job: {}", cell.job.display_name()),
        cell.job.command.clone(),
    ));

    if config.cache.is_some() {
        steps.push(Step::action("save cache", StepAction::SaveCache));
    }

    steps
}

fn toolchain_install_command(config: &PipelineConfig, channel: &str) -> String {
    let mut command = format!("rustup toolchain install {}", channel);
    if let Some(ref profile) = config.toolchain.profile {
        command.push_str(&format!(" --profile {}", profile));
    }
    for component in &config.toolchain.components {
        command.push_str(&format!(" --component {}", component));
    }
    command
}
