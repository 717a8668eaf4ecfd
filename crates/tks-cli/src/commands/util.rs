//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use chrono::{Days, NaiveDate, NaiveTime};
use regex::Regex;
use tks_core::{Timesheet, TimesheetCollection, extract_date};

use crate::Config;

/// Pre-compiled regex for relative date parsing.
static DAYS_AGO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+days?\s+ago$").unwrap());

/// Parse a date given on the command line.
///
/// Supports:
/// - Keywords: "today", "yesterday"
/// - Relative: "3 days ago"
/// - Timesheet notation: "16/10/2026", "16.10.26", "2026-10-16"
pub fn parse_date(s: &str, today: NaiveDate) -> Result<NaiveDate> {
    let s = s.trim();
    match s {
        "today" => return Ok(today),
        "yesterday" => {
            return today.pred_opt().context("date out of range");
        }
        _ => {}
    }

    if let Some(caps) = DAYS_AGO_RE.captures(s) {
        let n: u64 = caps[1]
            .parse()
            .context("failed to parse number in relative date")?;
        return today
            .checked_sub_days(Days::new(n))
            .with_context(|| format!("{n} days ago is out of range"));
    }

    let Some(date) = extract_date(s) else {
        bail!("Invalid date: {s}. Use DD/MM/YYYY, YYYY-MM-DD, 'yesterday' or 'N days ago'");
    };
    Ok(date)
}

/// Parse a `HH:MM` or `HHMM` time.
pub fn parse_time(s: &str) -> Result<NaiveTime> {
    tks_core::extract::parse_time(s.trim()).with_context(|| format!("Invalid time: {s}"))
}

/// Loads the timesheet `date` falls in and its predecessors, with the
/// configured direction rules applied.
pub fn load_timesheets(config: &Config, date: NaiveDate) -> Result<TimesheetCollection> {
    let mut timesheets = TimesheetCollection::load(
        &config.file,
        config.nb_previous_files,
        date,
        &config.line_format(),
    )
    .context("failed to load timesheets")?;
    timesheets.set_direction_override(config.direction_override());
    timesheets.set_fallback_direction(config.fallback_direction());
    tracing::debug!(files = timesheets.len(), %date, "loaded timesheets");
    Ok(timesheets)
}

/// The timesheet `date` falls in.
pub fn current_timesheet(timesheets: &mut TimesheetCollection) -> Result<&mut Timesheet> {
    timesheets
        .latest_mut()
        .context("no timesheet matches the configured file pattern")
}

/// Joins words given as separate arguments.
pub fn join_words(words: &[String]) -> String {
    words.join(" ")
}
