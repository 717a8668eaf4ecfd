//! Status command showing entries and hours per date.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use clap::Args;
use serde::Serialize;
use tks_core::{EntriesCollection, EntryFilter, EntryView, TimesheetCollection};

use super::util::{load_timesheets, parse_date};
use crate::Config;

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Only show this date (e.g. "yesterday", "16/10/2026").
    #[arg(short, long)]
    pub date: Option<String>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

// ========== Status Data ==========

/// One (possibly regrouped) entry for display.
#[derive(Debug, Clone, Serialize)]
pub struct StatusEntry {
    pub alias: String,
    pub description: String,
    pub hours: f64,
    pub ignored: bool,
    pub pushed: bool,
    pub in_progress: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusDate {
    pub date: NaiveDate,
    pub entries: Vec<StatusEntry>,
    /// Hours of the entries that are not ignored.
    pub total: f64,
}

#[derive(Debug, Serialize)]
pub struct StatusData {
    pub dates: Vec<StatusDate>,
    pub total: f64,
}

fn status_entry(entries: &EntriesCollection, view: &EntryView) -> StatusEntry {
    let in_progress = view
        .entries()
        .iter()
        .filter_map(|entry| entries.entry(*entry))
        .any(|line| line.duration().is_in_progress());
    StatusEntry {
        alias: view.alias(entries).to_string(),
        description: view.description(entries).to_string(),
        hours: view.hours(entries),
        ignored: view.is_ignored(entries),
        pushed: view.is_pushed(entries),
        in_progress,
    }
}

/// Collects regrouped entries of every loaded file, optionally for one date.
pub fn collect_status(timesheets: &TimesheetCollection, date: Option<NaiveDate>) -> StatusData {
    let range = date.map(|date| date..=date);
    let mut filter = EntryFilter::new().regroup(true);
    if let Some(range) = &range {
        filter = filter.dates(range);
    }

    let dates: Vec<StatusDate> = timesheets
        .entries(&filter)
        .into_iter()
        .map(|(date, views)| {
            let entries: Vec<StatusEntry> = views
                .iter()
                .map(|(collection, view)| status_entry(collection, view))
                .collect();
            let total = entries.iter().filter(|e| !e.ignored).map(|e| e.hours).sum();
            StatusDate {
                date,
                entries,
                total,
            }
        })
        .collect();
    let total = dates.iter().map(|d| d.total).sum();
    StatusData { dates, total }
}

// ========== Human-Readable Output ==========

/// Format status for human-readable output.
pub fn format_status(data: &StatusData) -> String {
    let mut output = String::new();

    if data.dates.is_empty() {
        writeln!(output, "No entries.").unwrap();
        return output;
    }

    let alias_width = data
        .dates
        .iter()
        .flat_map(|d| &d.entries)
        .map(|e| e.alias.chars().count())
        .max()
        .unwrap_or(0);

    for date in &data.dates {
        writeln!(
            output,
            "{} {}  {:.2}h",
            date.date.weekday(),
            date.date.format("%Y-%m-%d"),
            date.total
        )
        .unwrap();
        for entry in &date.entries {
            let marker = if entry.pushed {
                '='
            } else if entry.ignored && !entry.in_progress {
                '?'
            } else {
                ' '
            };
            let hours = if entry.in_progress {
                "...".to_string()
            } else {
                format!("{:.2}", entry.hours)
            };
            let line = format!(
                "  {marker} {:<alias_width$}  {hours:>6}  {}",
                entry.alias, entry.description
            );
            writeln!(output, "{}", line.trim_end()).unwrap();
        }
    }

    writeln!(output).unwrap();
    writeln!(output, "Total: {:.2}h", data.total).unwrap();
    output
}

// ========== JSON Output ==========

/// Format status as JSON.
pub fn format_status_json(data: &StatusData) -> Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

// ========== Public Interface ==========

/// Runs the status command.
pub fn run<W: Write>(
    writer: &mut W,
    args: &StatusArgs,
    config: &Config,
    today: NaiveDate,
) -> Result<()> {
    let date = args
        .date
        .as_deref()
        .map(|s| parse_date(s, today))
        .transpose()?;
    let timesheets = load_timesheets(config, date.unwrap_or(today))?;
    let data = collect_status(&timesheets, date);

    if args.json {
        writeln!(writer, "{}", format_status_json(&data)?)?;
    } else {
        write!(writer, "{}", format_status(&data))?;
    }
    Ok(())
}
