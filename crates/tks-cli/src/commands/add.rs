//! Add command for writing an entry to a date.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::Args;
use tks_core::{EntryLine, parse_duration};

use super::util::{current_timesheet, join_words, load_timesheets, parse_date};
use crate::Config;

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Activity alias.
    pub alias: String,
    /// Hours ("1.5") or span ("09:00-10:30", "-12:00").
    #[arg(allow_hyphen_values = true)]
    pub duration: String,
    /// Free-form description.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub description: Vec<String>,
    /// Date of the entry (defaults to today).
    #[arg(short, long)]
    pub date: Option<String>,
}

pub fn run<W: Write>(writer: &mut W, args: &AddArgs, config: &Config, today: NaiveDate) -> Result<()> {
    let alias = args.alias.trim();
    if alias.is_empty() {
        bail!("alias cannot be empty");
    }
    let duration = parse_duration(args.duration.trim())
        .with_context(|| format!("invalid duration: {}", args.duration))?;
    let date = match &args.date {
        Some(date) => parse_date(date, today)?,
        None => today,
    };

    let mut timesheets = load_timesheets(config, date)?;
    let timesheet = current_timesheet(&mut timesheets)?;
    let entry = EntryLine::new(alias, duration, join_words(&args.description));
    timesheet.entries_mut().append_entry(date, entry)?;
    timesheet
        .save()
        .with_context(|| format!("failed to save {}", timesheet.path().display()))?;

    writeln!(writer, "Added {alias} on {}", date.format("%Y-%m-%d"))?;
    Ok(())
}
