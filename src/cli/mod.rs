//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{HooksCommand, RunCommand, TriggerCommand, ValidateCommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Matrix CI runner and commit gate
#[derive(Debug, Parser, Clone)]
#[command(name = "gantry")]
#[command(version = "0.1.0")]
#[command(about = "Matrix CI runner and commit gate for smart-contract projects", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the pipeline configuration file
    #[arg(short, long, global = true, default_value = "gantry.yaml")]
    pub config: PathBuf,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the matrix for this host
    Run(RunCommand),

    /// Validate the pipeline configuration
    Validate(ValidateCommand),

    /// Check whether an event would trigger the pipeline
    Trigger(TriggerCommand),

    /// Run or install the commit gate
    Hooks(HooksCommand),
}

impl Cli {
    /// Parse CLI arguments from the environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
