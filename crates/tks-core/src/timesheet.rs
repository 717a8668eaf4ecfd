//! A single timesheet file.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, NaiveTime, TimeDelta, Weekday};

use crate::aggregate::EntryFilter;
use crate::duration::Duration;
use crate::entries::{EntriesCollection, EntryRef};
use crate::error::TimesheetError;
use crate::line::{EntryLine, LineFormat};
use crate::push::{PushBackend, PushEntry, PushOutcome, PushReport};

/// One document and the file it is stored in.
#[derive(Debug, Clone)]
pub struct Timesheet {
    path: PathBuf,
    entries: EntriesCollection,
    existed: bool,
}

impl Timesheet {
    /// Wraps an in-memory collection; nothing is read from `path`.
    pub fn new(path: impl Into<PathBuf>, entries: EntriesCollection) -> Self {
        Self {
            path: path.into(),
            entries,
            existed: false,
        }
    }

    /// Reads and parses `path`. A missing file gives an empty timesheet.
    pub fn load(path: impl Into<PathBuf>, format: LineFormat) -> Result<Self, TimesheetError> {
        let path = path.into();
        match fs::read_to_string(&path) {
            Ok(text) => {
                let entries = EntriesCollection::load(&text, format)?;
                tracing::debug!(path = %path.display(), "loaded timesheet");
                Ok(Self {
                    path,
                    entries,
                    existed: true,
                })
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "timesheet does not exist yet");
                Ok(Self::new(path, EntriesCollection::new(format)))
            }
            Err(source) => Err(TimesheetError::Io { path, source }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file existed when the timesheet was loaded.
    pub const fn existed(&self) -> bool {
        self.existed
    }

    pub const fn entries(&self) -> &EntriesCollection {
        &self.entries
    }

    pub const fn entries_mut(&mut self) -> &mut EntriesCollection {
        &mut self.entries
    }

    /// Document text, every line terminated with the document's line ending.
    pub fn render(&self) -> String {
        let newline = self.entries.line_ending().as_str();
        let mut text = self.entries.to_text().join(newline);
        if !text.is_empty() {
            text.push_str(newline);
        }
        text
    }

    /// Writes the document, creating parent directories as needed.
    pub fn save(&self) -> Result<(), TimesheetError> {
        let io_error = |source| TimesheetError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(&self.path, self.render()).map_err(io_error)?;
        tracing::debug!(path = %self.path.display(), "saved timesheet");
        Ok(())
    }

    /// Total hours of the entries matching `filter`.
    pub fn hours(&self, filter: &EntryFilter<'_>) -> f64 {
        self.entries
            .filter(filter)
            .values()
            .flatten()
            .map(|view| view.hours(&self.entries))
            .sum()
    }

    /// Alias usage counts, in order of first use.
    pub fn alias_usage(&self) -> Vec<(String, usize)> {
        let mut usage: Vec<(String, usize)> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for (_, entry) in self.entries.iter() {
            let Some(line) = self.entries.entry(entry) else {
                continue;
            };
            match positions.get(line.alias()) {
                Some(&pos) => usage[pos].1 += 1,
                None => {
                    positions.insert(line.alias(), usage.len());
                    usage.push((line.alias().to_string(), 1));
                }
            }
        }
        usage
    }

    /// Starts an activity at `at`.
    ///
    /// When the previous entry of the date ends exactly at `at`, the new
    /// entry is chained to it.
    pub fn start_entry(
        &mut self,
        date: NaiveDate,
        alias: &str,
        description: &str,
        at: NaiveTime,
    ) -> Result<EntryRef, TimesheetError> {
        let last = self
            .entries
            .entries_for(date)
            .last()
            .and_then(|entry| self.entries.entry(*entry));
        if last.is_some_and(|line| line.duration().is_in_progress()) {
            return Err(TimesheetError::ActivityInProgress);
        }
        let start = if last.and_then(|line| line.duration().end()) == Some(at) {
            None
        } else {
            Some(at)
        };
        self.entries.append_entry(
            date,
            EntryLine::new(alias, Duration::span(start, None), description),
        )
    }

    /// Stops the activity in progress on `date` at `end_time`.
    ///
    /// The elapsed time is rounded up to a multiple of `round_to_minutes`
    /// (no rounding with 0, beyond whole minutes).
    pub fn continue_entry(
        &mut self,
        date: NaiveDate,
        end_time: NaiveTime,
        round_to_minutes: u32,
        description: Option<&str>,
    ) -> Result<EntryRef, TimesheetError> {
        let entry = *self
            .entries
            .entries_for(date)
            .last()
            .ok_or(TimesheetError::NoActivityInProgress)?;
        let duration = self
            .entries
            .entry(entry)
            .map(EntryLine::duration)
            .ok_or(TimesheetError::NoActivityInProgress)?;
        let Duration::Span { start, end: None } = duration else {
            return Err(TimesheetError::NoActivityInProgress);
        };
        let effective_start = self
            .entries
            .effective_start(entry)
            .ok_or(TimesheetError::NoActivityInProgress)?;
        if end_time < effective_start {
            return Err(TimesheetError::StopInThePast {
                start: effective_start,
                end: end_time,
            });
        }

        let elapsed = end_time.signed_duration_since(effective_start).num_seconds();
        let rounded = round_up_seconds(elapsed, round_to_minutes);
        let (mut end, wrapped) = effective_start.overflowing_add_signed(TimeDelta::seconds(rounded));
        if wrapped != 0 {
            // Spans can't cross midnight.
            end = end_time;
        }

        if let Some(description) = description {
            self.entries.set_description(entry, description)?;
        }
        self.entries.set_duration(entry, Duration::span(start, Some(end)))?;
        tracing::debug!(%date, %end, "stopped activity");
        Ok(entry)
    }

    /// Adds empty sections for every day in `weekdays` after the latest
    /// date (or from the first of `limit`'s month) up to `limit`.
    pub fn prefill(
        &mut self,
        weekdays: &[Weekday],
        limit: NaiveDate,
    ) -> Result<Vec<NaiveDate>, TimesheetError> {
        let first = match self.entries.latest_date() {
            Some(latest) => latest.succ_opt(),
            None => limit.with_day(1),
        };
        let Some(first) = first else {
            return Ok(Vec::new());
        };

        let mut added = Vec::new();
        for date in first.iter_days().take_while(|date| *date <= limit) {
            if weekdays.contains(&date.weekday()) && !self.entries.contains_date(date) {
                self.entries.add_date(date)?;
                added.push(date);
            }
        }
        tracing::debug!(count = added.len(), "prefilled dates");
        Ok(added)
    }

    /// Pushes every non-ignored, not yet pushed entry, regrouped.
    ///
    /// Successful entries are flagged pushed; failed ones keep their state
    /// and carry the error. Nothing is retried.
    pub fn push<B: PushBackend>(
        &mut self,
        backend: &mut B,
        dates: Option<&RangeInclusive<NaiveDate>>,
    ) -> PushReport {
        let mut filter = EntryFilter::new().regroup(true).ignored(false).pushed(false);
        if let Some(dates) = dates {
            filter = filter.dates(dates);
        }

        let mut report = PushReport::default();
        for (date, views) in self.entries.filter(&filter) {
            for view in views {
                let entry = PushEntry {
                    alias: view.alias(&self.entries).to_string(),
                    description: view.description(&self.entries).to_string(),
                    hours: view.hours(&self.entries),
                    start: self.entries.effective_start(view.first()),
                };
                let error = match backend.push(date, &entry) {
                    Ok(()) => {
                        view.set_pushed(&mut self.entries, true);
                        view.set_push_error(&mut self.entries, None);
                        None
                    }
                    Err(err) => {
                        let message = err.to_string();
                        view.set_push_error(&mut self.entries, Some(&message));
                        Some(message)
                    }
                };
                report.outcomes.push(PushOutcome { date, entry, error });
            }
        }
        report
    }
}

fn round_up_seconds(elapsed: i64, round_to_minutes: u32) -> i64 {
    if round_to_minutes == 0 {
        return elapsed - elapsed % 60;
    }
    let step = i64::from(round_to_minutes) * 60;
    (elapsed + step - 1) / step * step
}
