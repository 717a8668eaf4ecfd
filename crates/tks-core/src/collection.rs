//! The current timesheet file and the ones preceding it.
//!
//! Files are located by expanding a strftime pattern (`~/tks/%Y/%m.tks`)
//! for today and for as many earlier periods as requested. The period is
//! the finest date unit the pattern refers to, so a monthly pattern steps
//! back one month per previous file and a daily one steps back one day.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;
use std::path::PathBuf;

use chrono::format::{Item, StrftimeItems};
use chrono::{Days, Months, NaiveDate};

use crate::aggregate::{EntryFilter, EntryView};
use crate::entries::{Direction, EntriesCollection};
use crate::error::TimesheetError;
use crate::line::LineFormat;
use crate::timesheet::Timesheet;

/// Date unit a file pattern changes with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Granularity {
    Day,
    Week,
    Month,
    Year,
}

impl Granularity {
    /// Finest unit referenced by `pattern`, `None` for a fixed file name.
    pub fn of_pattern(pattern: &str) -> Option<Self> {
        let mut finest = None;
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            if c != '%' {
                continue;
            }
            let mut spec = chars.next();
            while let Some('-' | '_' | '0') = spec {
                spec = chars.next();
            }
            let unit = match spec {
                Some('d' | 'e' | 'j' | 'a' | 'A' | 'u' | 'w' | 'F' | 'D' | 'x') => Self::Day,
                Some('U' | 'W' | 'V') => Self::Week,
                Some('m' | 'b' | 'B' | 'h') => Self::Month,
                Some('Y' | 'y' | 'C' | 'G' | 'g') => Self::Year,
                _ => continue,
            };
            finest = Some(finest.map_or(unit, |current: Self| current.min(unit)));
        }
        finest
    }

    /// Same point one period earlier.
    pub fn previous(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Day => date.checked_sub_days(Days::new(1)),
            Self::Week => date.checked_sub_days(Days::new(7)),
            Self::Month => date.checked_sub_months(Months::new(1)),
            Self::Year => date.checked_sub_months(Months::new(12)),
        }
    }
}

/// Expands the date specifiers of `pattern` for `date`.
pub fn expand_pattern(pattern: &str, date: NaiveDate) -> Result<PathBuf, TimesheetError> {
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(TimesheetError::InvalidPattern(pattern.to_string()));
    }
    let mut path = String::new();
    // Time specifiers have nothing to format from a date.
    write!(path, "{}", date.format_with_items(items.iter()))
        .map_err(|_| TimesheetError::InvalidPattern(pattern.to_string()))?;
    Ok(PathBuf::from(path))
}

/// Paths of the current file and up to `nb_previous` earlier ones, oldest
/// first, without duplicates.
pub fn timesheet_paths(
    pattern: &str,
    nb_previous: usize,
    today: NaiveDate,
) -> Result<Vec<PathBuf>, TimesheetError> {
    let granularity = Granularity::of_pattern(pattern);
    let mut paths = vec![expand_pattern(pattern, today)?];
    let mut date = today;
    if let Some(granularity) = granularity {
        for _ in 0..nb_previous {
            let Some(previous) = granularity.previous(date) else {
                break;
            };
            date = previous;
            let path = expand_pattern(pattern, date)?;
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }
    paths.reverse();
    Ok(paths)
}

/// Chronologically related timesheets, oldest first.
#[derive(Debug, Clone, Default)]
pub struct TimesheetCollection {
    timesheets: Vec<Timesheet>,
}

impl TimesheetCollection {
    /// Loads the files `pattern` expands to for `today` and the previous
    /// `nb_previous` periods.
    pub fn load(
        pattern: &str,
        nb_previous: usize,
        today: NaiveDate,
        format: &LineFormat,
    ) -> Result<Self, TimesheetError> {
        let timesheets = timesheet_paths(pattern, nb_previous, today)?
            .into_iter()
            .map(|path| Timesheet::load(path, format.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_timesheets(timesheets))
    }

    /// Builds a collection, letting timesheets without a direction of their
    /// own use the one of their nearest existing neighbor.
    pub fn from_timesheets(mut timesheets: Vec<Timesheet>) -> Self {
        let directions: Vec<Option<Direction>> = timesheets
            .iter()
            .map(|sheet| sheet.entries().direction().filter(|_| sheet.existed()))
            .collect();

        for (i, sheet) in timesheets.iter_mut().enumerate() {
            if sheet.entries().direction().is_some() {
                continue;
            }
            let inherited = (1..directions.len()).find_map(|distance| {
                let before = i.checked_sub(distance).and_then(|j| directions[j]);
                let after = directions.get(i + distance).copied().flatten();
                before.or(after)
            });
            if let Some(direction) = inherited {
                tracing::debug!(path = %sheet.path().display(), ?direction, "inherited direction");
                sheet.entries_mut().set_default_direction(Some(direction));
            }
        }
        Self { timesheets }
    }

    /// Direction for timesheets that neither have nor inherited one.
    pub fn set_fallback_direction(&mut self, direction: Direction) {
        for sheet in &mut self.timesheets {
            let entries = sheet.entries_mut();
            if entries.default_direction().is_none() {
                entries.set_default_direction(Some(direction));
            }
        }
    }

    /// Forces the direction of new dates in every timesheet.
    pub fn set_direction_override(&mut self, direction: Option<Direction>) {
        for sheet in &mut self.timesheets {
            sheet.entries_mut().set_direction_override(direction);
        }
    }

    /// The current file.
    pub fn latest(&self) -> Option<&Timesheet> {
        self.timesheets.last()
    }

    pub fn latest_mut(&mut self) -> Option<&mut Timesheet> {
        self.timesheets.last_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Timesheet> {
        self.timesheets.iter()
    }

    pub fn len(&self) -> usize {
        self.timesheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timesheets.is_empty()
    }

    /// Filtered entries of every file, merged per date. Each view comes
    /// with the collection its references point into.
    pub fn entries(
        &self,
        filter: &EntryFilter<'_>,
    ) -> BTreeMap<NaiveDate, Vec<(&EntriesCollection, EntryView)>> {
        let mut merged: BTreeMap<NaiveDate, Vec<_>> = BTreeMap::new();
        for sheet in &self.timesheets {
            let entries = sheet.entries();
            for (date, views) in entries.filter(filter) {
                merged
                    .entry(date)
                    .or_default()
                    .extend(views.into_iter().map(|view| (entries, view)));
            }
        }
        merged
    }

    pub fn hours(&self, filter: &EntryFilter<'_>) -> f64 {
        self.timesheets.iter().map(|sheet| sheet.hours(filter)).sum()
    }

    /// Aliases by number of uses, most used first. Ties keep the order in
    /// which aliases first appear, oldest file first.
    pub fn popular_aliases(&self, limit: Option<usize>) -> Vec<(String, usize)> {
        let mut usage: Vec<(String, usize)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for sheet in &self.timesheets {
            for (alias, count) in sheet.alias_usage() {
                if let Some(&pos) = positions.get(&alias) {
                    usage[pos].1 += count;
                } else {
                    positions.insert(alias.clone(), usage.len());
                    usage.push((alias, count));
                }
            }
        }
        usage.sort_by(|a, b| b.1.cmp(&a.1));
        if let Some(limit) = limit {
            usage.truncate(limit);
        }
        usage
    }
}
