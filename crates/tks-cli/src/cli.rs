//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::add::AddArgs;
use crate::commands::aliases::AliasesArgs;
use crate::commands::start::StartArgs;
use crate::commands::status::StatusArgs;
use crate::commands::stop::StopArgs;

/// Plain-text timesheets.
///
/// Keeps a monthly text file of dated time entries that stays pleasant to
/// edit by hand.
#[derive(Debug, Parser)]
#[command(name = "tks", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show entries and hours per date.
    Status(StatusArgs),

    /// Add an entry.
    Add(AddArgs),

    /// Start an activity now.
    Start(StartArgs),

    /// Stop the activity in progress.
    Stop(StopArgs),

    /// Add empty sections for the working days up to today.
    Prefill,

    /// List the most used aliases.
    Aliases(AliasesArgs),

    /// Print the path of the current timesheet.
    EditPath,
}
