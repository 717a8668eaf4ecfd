//! Start command for opening an activity.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::NaiveDateTime;
use clap::Args;

use super::util::{current_timesheet, join_words, load_timesheets, parse_time};
use crate::Config;

#[derive(Debug, Args)]
pub struct StartArgs {
    /// Activity alias.
    pub alias: String,
    /// Free-form description.
    #[arg(required = true, trailing_var_arg = true)]
    pub description: Vec<String>,
    /// Start time (defaults to now).
    #[arg(long)]
    pub at: Option<String>,
}

pub fn run<W: Write>(
    writer: &mut W,
    args: &StartArgs,
    config: &Config,
    now: NaiveDateTime,
) -> Result<()> {
    let alias = args.alias.trim();
    if alias.is_empty() {
        bail!("alias cannot be empty");
    }
    let at = match &args.at {
        Some(at) => parse_time(at)?,
        None => now.time(),
    };
    let date = now.date();

    let mut timesheets = load_timesheets(config, date)?;
    let timesheet = current_timesheet(&mut timesheets)?;
    timesheet.start_entry(date, alias, &join_words(&args.description), at)?;
    timesheet
        .save()
        .with_context(|| format!("failed to save {}", timesheet.path().display()))?;

    writeln!(writer, "Started {alias} at {}", at.format("%H:%M"))?;
    Ok(())
}
