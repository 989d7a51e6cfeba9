use anyhow::{Context, Result};
use gantry::cli::commands::{HooksAction, HooksRunCommand, RunCommand, TriggerCommand, ValidateCommand};
use gantry::cli::output::*;
use gantry::cli::{Cli, Command};
use gantry::core::{PipelineConfig, Platform};
use gantry::execution::{BuildCache, ExecutionEvent, MatrixEngine, ShellExecutor};
use gantry::hooks::{git, install_pre_commit_hook, HookRunner};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_matrix(cmd, &cli).await?,
        Command::Validate(cmd) => validate_config(cmd, &cli)?,
        Command::Trigger(cmd) => check_trigger(cmd, &cli)?,
        Command::Hooks(cmd) => match &cmd.action {
            HooksAction::Run(args) => run_hooks(args, &cli).await?,
            HooksAction::Install => install_hooks().await?,
        },
    }

    Ok(())
}

async fn run_matrix(cmd: &RunCommand, cli: &Cli) -> Result<()> {
    let config =
        PipelineConfig::from_file(&cli.config).context("Failed to load pipeline config")?;
    println!("{} Loaded pipeline: {}", INFO, style(&config.name).bold());

    let platform = cmd.platform.unwrap_or_else(Platform::host);
    let cells = config.matrix.expand_for(platform, cmd.job.as_deref());
    if cells.is_empty() {
        anyhow::bail!("No matrix cells match platform '{}'", platform);
    }

    let workdir = match &cmd.workdir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Could not determine working directory")?,
    };
    let work_root = dirs::cache_dir()
        .map(|d| d.join("gantry"))
        .unwrap_or_else(|| workdir.join(".gantry"));

    let engine = MatrixEngine::new(
        ShellExecutor::new(),
        cmd.strategy.into(),
        &workdir,
        &work_root,
    );
    let engine = if config.cache.is_some() && !cmd.no_cache {
        engine.with_cache(BuildCache::with_default_root()?)
    } else {
        engine
    };

    // Progress across cells, with events printed above the bar
    let progress = create_progress_bar(cells.len());
    let bar = progress.clone();
    let verbose = cli.verbose;
    engine.add_event_handler(move |event| {
        if matches!(event, ExecutionEvent::CellFinished { .. }) {
            bar.inc(1);
        }
        if let Some(line) = format_execution_event(&event, verbose) {
            bar.println(line);
        }
    });

    let report = engine.execute(&config, cells).await;
    progress.finish_and_clear();

    for job in &report.jobs {
        if let Some(step) = job.failed_step() {
            println!(
                "{} {} failed at '{}'",
                CROSS,
                style(&job.cell).red(),
                style(&step.name).bold()
            );
        }
    }

    if report.passed() {
        println!(
            "\n{} {} {} ({}/{} cells)",
            CHECK,
            style(&config.name).bold(),
            style("passed").green(),
            report.state.passed_cells,
            report.state.total_cells
        );
        Ok(())
    } else {
        println!(
            "\n{} {} {} ({} of {} cells failed)",
            CROSS,
            style(&config.name).bold(),
            style("failed").red(),
            report.state.failed_cells,
            report.state.total_cells
        );
        std::process::exit(1);
    }
}

fn validate_config(cmd: &ValidateCommand, cli: &Cli) -> Result<()> {
    println!("{} Validating pipeline...", INFO);

    match PipelineConfig::from_file(&cli.config) {
        Ok(config) => {
            println!("{} Pipeline configuration is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            println!("  Jobs: {}", style(config.matrix.jobs.len()).cyan());
            println!(
                "  Cells: {}",
                style(config.matrix.expand().len()).cyan()
            );
            println!("  Hooks: {}", style(config.hooks.len()).cyan());

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    }
}

fn check_trigger(cmd: &TriggerCommand, cli: &Cli) -> Result<()> {
    let config =
        PipelineConfig::from_file(&cli.config).context("Failed to load pipeline config")?;
    let event = cmd
        .event()
        .context("Specify one of --branch, --tag or --pr-target")?;

    if config.triggers.matches(&event) {
        println!("{} Pipeline {} for this event", CHECK, style("runs").green());
        Ok(())
    } else {
        println!(
            "{} Pipeline {} for this event",
            INFO,
            style("does not run").dim()
        );
        std::process::exit(1);
    }
}

async fn run_hooks(cmd: &HooksRunCommand, cli: &Cli) -> Result<()> {
    let config =
        PipelineConfig::from_file(&cli.config).context("Failed to load pipeline config")?;
    if config.hooks.is_empty() {
        println!("{} No hooks configured", INFO);
        return Ok(());
    }

    let root = match git::repo_root().await {
        Ok(root) => root,
        Err(_) => std::env::current_dir().context("Could not determine working directory")?,
    };
    let files = if cmd.all_files {
        git::tracked_files(&root).await?
    } else {
        git::staged_files(&root).await?
    };
    if files.is_empty() {
        println!("{} Nothing staged, nothing to check", INFO);
        return Ok(());
    }

    let runner = HookRunner::new(Arc::new(ShellExecutor::new()), &root);
    let report = runner.run(&config.hooks, &files).await;

    for result in &report.results {
        println!("{}", format_hook_result(result));
    }

    if report.passed() {
        println!("\n{} Commit gate {}", CHECK, style("passed").green());
        Ok(())
    } else {
        println!("\n{} Commit {}", CROSS, style("blocked").red());
        std::process::exit(1);
    }
}

async fn install_hooks() -> Result<()> {
    let root = git::repo_root().await?;
    let hook_path = install_pre_commit_hook(&root)?;
    println!(
        "{} Pre-commit hook installed at {}",
        CHECK,
        style(hook_path.display()).bold()
    );
    Ok(())
}
