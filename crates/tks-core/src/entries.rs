//! Date-indexed entries kept in lock-step with the document lines.
//!
//! [`EntriesCollection`] owns the ordered lines of a document and an index of
//! entry references per date. Loading builds the index from lines that
//! already exist; every later mutation goes through methods that update the
//! lines and the index together.
//!
//! # Invariants
//!
//! - Every entry line belongs to the nearest preceding date line.
//! - `entries_for(date)` lists the entries of `date` in document order.
//! - The index has a key for every date line, including empty sections.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::duration::Duration;
use crate::error::TimesheetError;
use crate::line::{DateLine, EntryFlag, EntryLine, Line, LineEnding, LineFormat, TextLine};
use crate::parser;

/// Stable handle to an entry line.
///
/// Handles stay valid while other lines are inserted or removed; they are
/// only invalidated by removing the entry itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryRef(u64);

/// Chronological order of date sections in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Dates ascend; new dates go at the bottom.
    TopDown,
    /// Dates descend; new dates go at the top.
    BottomUp,
}

impl Direction {
    pub const fn is_top_down(self) -> bool {
        matches!(self, Self::TopDown)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    id: u64,
    line: Line,
}

/// Lines of one document plus a per-date index of its entries.
#[derive(Debug, Clone)]
pub struct EntriesCollection {
    lines: Vec<Slot>,
    index: BTreeMap<NaiveDate, Vec<EntryRef>>,
    next_id: u64,
    format: LineFormat,
    line_ending: LineEnding,
    default_direction: Option<Direction>,
    direction_override: Option<Direction>,
}

impl Default for EntriesCollection {
    fn default() -> Self {
        Self::new(LineFormat::default())
    }
}

impl EntriesCollection {
    /// Creates an empty document.
    pub const fn new(format: LineFormat) -> Self {
        Self {
            lines: Vec::new(),
            index: BTreeMap::new(),
            next_id: 0,
            format,
            line_ending: LineEnding::Lf,
            default_direction: None,
            direction_override: None,
        }
    }

    /// Parses `text` and indexes its entries.
    pub fn load(text: &str, format: LineFormat) -> Result<Self, TimesheetError> {
        let lines = parser::parse(text, &format)?;
        let mut collection = Self::from_lines(lines, format);
        collection.line_ending = LineEnding::detect(text);
        Ok(collection)
    }

    /// Indexes already parsed lines without touching them.
    ///
    /// The lines must come from the parser, which rejects entries outside
    /// of a date section.
    pub(crate) fn from_lines(lines: Vec<Line>, format: LineFormat) -> Self {
        let mut collection = Self::new(format);
        let mut current_date = None;
        for line in lines {
            let id = collection.allocate_id();
            match &line {
                Line::Date(date_line) => {
                    current_date = Some(date_line.date());
                    collection.index.entry(date_line.date()).or_default();
                }
                Line::Entry(_) => {
                    if let Some(date) = current_date {
                        collection.index.entry(date).or_default().push(EntryRef(id));
                    }
                }
                Line::Text(_) => {}
            }
            collection.lines.push(Slot { id, line });
        }
        tracing::debug!(
            lines = collection.lines.len(),
            dates = collection.index.len(),
            "indexed timesheet lines"
        );
        collection
    }

    pub const fn format(&self) -> &LineFormat {
        &self.format
    }

    pub const fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    pub const fn set_line_ending(&mut self, line_ending: LineEnding) {
        self.line_ending = line_ending;
    }

    /// Direction used for new dates when it can't be inferred from the document.
    pub const fn set_default_direction(&mut self, direction: Option<Direction>) {
        self.default_direction = direction;
    }

    pub const fn default_direction(&self) -> Option<Direction> {
        self.default_direction
    }

    /// Direction used for new dates regardless of the document content.
    pub const fn set_direction_override(&mut self, direction: Option<Direction>) {
        self.direction_override = direction;
    }

    // ========== Queries ==========

    /// Entries of `date`, in document order.
    pub fn entries_for(&self, date: NaiveDate) -> &[EntryRef] {
        self.index.get(&date).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn entry(&self, entry: EntryRef) -> Option<&EntryLine> {
        self.slot(entry).and_then(|slot| slot.line.as_entry())
    }

    /// Mutable access to an entry's flags and push state. Setters only
    /// dirty that line.
    pub fn entry_mut(&mut self, entry: EntryRef) -> Option<&mut EntryLine> {
        let pos = self.position(entry.0)?;
        self.lines[pos].line.as_entry_mut()
    }

    /// All dates with a section, ascending.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.index.keys().copied()
    }

    /// Most recent date with a section.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.index.keys().next_back().copied()
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.index.contains_key(&date)
    }

    /// Every `(date, entry)` pair, dates ascending.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, EntryRef)> + '_ {
        self.index
            .iter()
            .flat_map(|(date, entries)| entries.iter().map(move |entry| (*date, *entry)))
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter().map(|slot| &slot.line)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Date section an entry belongs to.
    pub fn date_of(&self, entry: EntryRef) -> Option<NaiveDate> {
        self.index
            .iter()
            .find(|(_, entries)| entries.contains(&entry))
            .map(|(date, _)| *date)
    }

    /// Start time of a span, inherited from the previous entry of the same
    /// date when the span has none.
    pub fn effective_start(&self, entry: EntryRef) -> Option<NaiveTime> {
        let line = self.entry(entry)?;
        let Duration::Span { start, .. } = line.duration() else {
            return None;
        };
        if start.is_some() {
            return start;
        }
        let date = self.date_of(entry)?;
        let entries = self.entries_for(date);
        let pos = entries.iter().position(|e| *e == entry)?;
        let previous = entries.get(pos.checked_sub(1)?)?;
        self.entry(*previous)?.duration().end()
    }

    /// Completed hours of an entry, resolving chained spans.
    pub fn hours(&self, entry: EntryRef) -> f64 {
        self.entry(entry).map_or(0.0, |line| {
            line.duration().hours(self.effective_start(entry))
        })
    }

    /// Ignored entries: flagged, `?`-marked, or worth zero hours.
    pub fn is_ignored(&self, entry: EntryRef) -> bool {
        self.entry(entry)
            .is_none_or(|line| line.is_marked_ignored() || self.hours(entry) == 0.0)
    }

    /// Direction inferred from the first two distinct dates of the document.
    pub fn direction(&self) -> Option<Direction> {
        let mut dates = self.lines.iter().filter_map(|slot| slot.line.date());
        let first = dates.next()?;
        let second = dates.find(|date| *date != first)?;
        Some(if second > first {
            Direction::TopDown
        } else {
            Direction::BottomUp
        })
    }

    /// `Some(true)` for ascending documents, `Some(false)` for descending
    /// ones, `None` with fewer than two distinct dates.
    pub fn is_top_down(&self) -> Option<bool> {
        self.direction().map(Direction::is_top_down)
    }

    /// Direction applied when a new date section is created.
    pub fn effective_direction(&self) -> Option<Direction> {
        self.direction_override
            .or_else(|| self.direction())
            .or(self.default_direction)
    }

    /// Renders every line.
    pub fn to_text(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|slot| slot.line.render(&self.format))
            .collect()
    }

    // ========== Mutations ==========

    /// Adds an entry at the end of the `date` section, creating the section
    /// if needed.
    ///
    /// Fails without touching the document when the entry would not read
    /// back from its text, or when its span ends before it starts (chained
    /// spans start at the end of the previous entry of the date).
    pub fn append_entry(
        &mut self,
        date: NaiveDate,
        entry: EntryLine,
    ) -> Result<EntryRef, TimesheetError> {
        validate_entry(&entry, &self.format)?;
        self.check_span(date, self.entries_for(date).len(), entry.duration(), false)?;

        let last_entry = self.index.get(&date).map(|entries| entries.last().copied());
        let insert_at = match last_entry {
            Some(Some(last)) => self.position(last.0).map_or(self.lines.len(), |pos| pos + 1),
            Some(None) => self.insert_after_empty_section(date),
            None => {
                let direction = self
                    .effective_direction()
                    .ok_or(TimesheetError::UnknownDirection)?;
                self.insert_date_line(date, direction) + 1
            }
        };

        let id = self.allocate_id();
        self.lines.insert(
            insert_at,
            Slot {
                id,
                line: Line::Entry(entry),
            },
        );
        let entry = EntryRef(id);
        self.index.entry(date).or_default().push(entry);
        tracing::debug!(%date, line = insert_at + 1, "appended entry");
        Ok(entry)
    }

    /// Renames an entry.
    pub fn set_alias(&mut self, entry: EntryRef, alias: &str) -> Result<(), TimesheetError> {
        self.update_entry(entry, |line| line.set_alias(alias))
    }

    pub fn set_description(
        &mut self,
        entry: EntryRef,
        description: &str,
    ) -> Result<(), TimesheetError> {
        self.update_entry(entry, |line| line.set_description(description))
    }

    /// Replaces the duration of an entry, checking it against its neighbors
    /// in the chain of its date.
    pub fn set_duration(&mut self, entry: EntryRef, duration: Duration) -> Result<(), TimesheetError> {
        let date = self.date_of(entry).ok_or(TimesheetError::EntryNotFound)?;
        let index = self
            .entries_for(date)
            .iter()
            .position(|e| *e == entry)
            .ok_or(TimesheetError::EntryNotFound)?;
        self.check_span(date, index, duration, true)?;
        self.update_entry(entry, |line| line.set_duration(duration))
    }

    /// Adds an empty date section unless the date already has one.
    pub fn add_date(&mut self, date: NaiveDate) -> Result<(), TimesheetError> {
        if self.contains_date(date) {
            return Ok(());
        }
        let direction = self
            .effective_direction()
            .ok_or(TimesheetError::UnknownDirection)?;
        self.insert_date_line(date, direction);
        self.index.insert(date, Vec::new());
        Ok(())
    }

    /// Removes an entry. Removing the last entry of a date also removes the
    /// date line and the blank lines it leaves behind.
    ///
    /// That cascade applies to sections that were empty before an entry was
    /// appended to them too, so appending to an empty section and removing
    /// the entry again drops the section instead of restoring it.
    pub fn remove_entry(&mut self, entry: EntryRef) -> Option<EntryLine> {
        let date = self.date_of(entry)?;
        let pos = self.position(entry.0)?;
        let slot = self.lines.remove(pos);

        let now_empty = self.index.get_mut(&date).is_some_and(|entries| {
            entries.retain(|e| *e != entry);
            entries.is_empty()
        });
        if now_empty {
            self.index.remove(&date);
            self.remove_date_line(date);
        }

        match slot.line {
            Line::Entry(line) => Some(line),
            _ => None,
        }
    }

    /// Removes a date section along with all of its entries.
    pub fn remove_date(&mut self, date: NaiveDate) -> Vec<EntryLine> {
        let entries = self.entries_for(date).to_vec();
        let removed = entries
            .into_iter()
            .filter_map(|entry| self.remove_entry(entry))
            .collect();
        if self.index.remove(&date).is_some() {
            self.remove_date_line(date);
        }
        removed
    }

    /// Deletes the date line(s) of `date`, leaving any entries in place.
    pub(crate) fn remove_date_line(&mut self, date: NaiveDate) {
        while let Some(pos) = self
            .lines
            .iter()
            .rposition(|slot| slot.line.date() == Some(date))
        {
            self.lines.remove(pos);
            self.collapse_blank_lines(pos);
        }
    }

    // ========== Internals ==========

    /// Applies `change` to a copy of the entry and keeps it only if the
    /// result still reads back.
    fn update_entry(
        &mut self,
        entry: EntryRef,
        change: impl FnOnce(&mut EntryLine),
    ) -> Result<(), TimesheetError> {
        let mut updated = self.entry(entry).ok_or(TimesheetError::EntryNotFound)?.clone();
        change(&mut updated);
        validate_entry(&updated, &self.format)?;
        if let Some(line) = self.entry_mut(entry) {
            *line = updated;
        }
        Ok(())
    }

    /// Checks `duration` as the entry at `index` of the `date` section.
    ///
    /// Its start, explicit or inherited from the previous entry, must not
    /// be after its end. With `replacing`, a chained entry right after it
    /// must not end before it.
    fn check_span(
        &self,
        date: NaiveDate,
        index: usize,
        duration: Duration,
        replacing: bool,
    ) -> Result<(), TimesheetError> {
        let Duration::Span { start, end } = duration else {
            return Ok(());
        };
        let entries = self.entries_for(date);
        let end_of = |pos: usize| {
            entries
                .get(pos)
                .and_then(|e| self.entry(*e))
                .and_then(|line| line.duration().end())
        };

        let start = start.or_else(|| index.checked_sub(1).and_then(end_of));
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(TimesheetError::InvalidSpan { start, end });
            }
        }

        if !replacing {
            return Ok(());
        }
        let next = entries
            .get(index + 1)
            .and_then(|e| self.entry(*e))
            .map(EntryLine::duration);
        if let (Some(end), Some(Duration::Span { start: None, end: Some(next_end) })) = (end, next) {
            if next_end < end {
                return Err(TimesheetError::InvalidSpan {
                    start: end,
                    end: next_end,
                });
            }
        }
        Ok(())
    }

    const fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.lines.iter().position(|slot| slot.id == id)
    }

    fn slot(&self, entry: EntryRef) -> Option<&Slot> {
        self.lines.iter().find(|slot| slot.id == entry.0)
    }

    fn push_line(&mut self, at: usize, line: Line) {
        let id = self.allocate_id();
        self.lines.insert(at, Slot { id, line });
    }

    /// Position right after the date line of an empty section, making sure a
    /// blank line separates the new entry from the next section.
    fn insert_after_empty_section(&mut self, date: NaiveDate) -> usize {
        let Some(date_pos) = self
            .lines
            .iter()
            .rposition(|slot| slot.line.date() == Some(date))
        else {
            return self.lines.len();
        };
        let next = date_pos + 1;
        if self.lines.get(next).is_some_and(|slot| !slot.line.is_blank()) {
            self.push_line(next, Line::Text(TextLine::blank()));
        }
        next
    }

    /// Inserts a date line at the top or bottom of the document and returns
    /// its position.
    fn insert_date_line(&mut self, date: NaiveDate, direction: Direction) -> usize {
        let line = Line::Date(DateLine::new(date));
        match direction {
            Direction::TopDown => {
                if self.lines.last().is_some_and(|slot| !slot.line.is_blank()) {
                    let end = self.lines.len();
                    self.push_line(end, Line::Text(TextLine::blank()));
                }
                let pos = self.lines.len();
                self.push_line(pos, line);
                pos
            }
            Direction::BottomUp => {
                if !self.lines.is_empty() {
                    self.push_line(0, Line::Text(TextLine::blank()));
                }
                self.push_line(0, line);
                0
            }
        }
    }

    /// Drops blank lines at `pos` that follow another blank line or start the
    /// document, and trailing blank lines when `pos` is the end.
    fn collapse_blank_lines(&mut self, pos: usize) {
        while self.lines.get(pos).is_some_and(|slot| slot.line.is_blank())
            && (pos == 0 || self.lines[pos - 1].line.is_blank())
        {
            self.lines.remove(pos);
        }
        if pos >= self.lines.len() {
            while self.lines.last().is_some_and(|slot| slot.line.is_blank()) {
                self.lines.pop();
            }
        }
    }
}

/// Rejects entries whose rendered text would not parse back into the same
/// entry, flagged or not.
fn validate_entry(entry: &EntryLine, format: &LineFormat) -> Result<(), TimesheetError> {
    let alias = entry.alias();
    let description = entry.description();
    let problem = if alias.is_empty() {
        Some("alias cannot be empty".to_string())
    } else if alias.contains(char::is_whitespace) {
        Some(format!("alias {alias:?} cannot contain whitespace"))
    } else if alias.starts_with(format.ignored_flag) || alias.ends_with(format.ignored_flag) {
        Some(format!(
            "alias {alias:?} cannot start or end with {:?}",
            format.ignored_flag
        ))
    } else if alias.chars().all(|c| format.is_flag(c)) {
        Some(format!("alias {alias:?} cannot consist of flags only"))
    } else if description.trim().is_empty() {
        Some("description cannot be empty".to_string())
    } else if description.contains(['\n', '\r']) {
        Some("description must fit on one line".to_string())
    } else if description.trim() != description {
        Some("description cannot start or end with whitespace".to_string())
    } else {
        None
    };
    if let Some(problem) = problem {
        return Err(TimesheetError::InvalidEntry(problem));
    }

    let mut bare = entry.clone();
    bare.remove_flag(EntryFlag::Pushed);
    bare.remove_flag(EntryFlag::Ignored);
    for candidate in [entry, &bare] {
        let text = candidate.generate(format);
        let read_back = parser::parse_entry_text(&text, format).map_err(|err| {
            TimesheetError::InvalidEntry(format!("{text:?} does not read back: {}", err.message))
        })?;
        if !read_back.same_content(candidate) {
            return Err(TimesheetError::InvalidEntry(format!(
                "{text:?} reads back as a different entry"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn load(text: &str) -> EntriesCollection {
        EntriesCollection::load(text, LineFormat::default()).unwrap()
    }

    fn fixed(alias: &str, hours: f64) -> EntryLine {
        EntryLine::new(alias, Duration::Fixed(hours), "desc")
    }

    #[test]
    fn render_of_parse_is_identity() {
        let text = "# timesheet\n10/10/2012\nfoo   0900-1000  baz\n?bar -1100 bar\n\n  # lunch\n11.10.2012\n= foo 2 ?";
        let collection = load(text);
        assert_eq!(collection.to_text(), text.lines().collect::<Vec<_>>());
    }

    #[test]
    fn chained_entries_resolve_start() {
        let collection = load("10.10.2012\nfoo 0900-1000 baz\nbar -1100 bar\nfoo -1200 bar");
        let entries = collection.entries_for(date(2012, 10, 10));
        let spans: Vec<_> = entries
            .iter()
            .map(|e| {
                let end = collection.entry(*e).unwrap().duration().end();
                (collection.effective_start(*e), end)
            })
            .collect();
        assert_eq!(
            spans,
            vec![
                (Some(time(9, 0)), Some(time(10, 0))),
                (Some(time(10, 0)), Some(time(11, 0))),
                (Some(time(11, 0)), Some(time(12, 0))),
            ]
        );
        assert!((collection.hours(entries[2]) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unresolvable_chain_is_ignored() {
        let collection = load("10.10.2012\nfoo 2 baz\nbar -1100 bar");
        let entries = collection.entries_for(date(2012, 10, 10));
        assert_eq!(collection.effective_start(entries[1]), None);
        assert!(collection.is_ignored(entries[1]));
        assert!(!collection.is_ignored(entries[0]));
    }

    #[test]
    fn index_follows_line_order_with_interleaved_dates() {
        let collection = load("10.10.2012\na 1 x\n11.10.2012\nb 1 x\n10.10.2012\nc 1 x");
        let aliases: Vec<_> = collection
            .entries_for(date(2012, 10, 10))
            .iter()
            .map(|e| collection.entry(*e).unwrap().alias().to_string())
            .collect();
        assert_eq!(aliases, ["a", "c"]);
    }

    #[test]
    fn empty_sections_are_indexed() {
        let collection = load("10.10.2012\n\n11.10.2012");
        assert_eq!(
            collection.dates().collect::<Vec<_>>(),
            [date(2012, 10, 10), date(2012, 10, 11)]
        );
        assert!(collection.entries_for(date(2012, 10, 10)).is_empty());
    }

    #[test]
    fn direction_inference() {
        assert_eq!(load("10.10.2012\nfoo 1 bar").is_top_down(), None);
        assert_eq!(load("10.10.2012\n10.10.2012").is_top_down(), None);
        assert_eq!(
            load("10.10.2012\na 1 x\nb 1 x\nc 1 x\n\n11.10.2012\nd 1 x").is_top_down(),
            Some(true)
        );
        assert_eq!(
            load("11.10.2012\na 1 x\n\n10.10.2012\nb 1 x").is_top_down(),
            Some(false)
        );
        assert_eq!(
            load("10.10.2012\na 1 x\n10.10.2012\nb 1 x\n09.10.2012").is_top_down(),
            Some(false)
        );
    }

    #[test]
    fn append_to_existing_date_goes_after_last_entry() {
        let mut collection = load("10.10.2012\na 1 x\n11.10.2012\nb 1 x\n10.10.2012\nc 1 x\n\n# end");
        collection.append_entry(date(2012, 10, 11), fixed("new", 1.0)).unwrap();
        assert_eq!(
            collection.to_text(),
            [
                "10.10.2012",
                "a 1 x",
                "11.10.2012",
                "b 1 x",
                "new 1 desc",
                "10.10.2012",
                "c 1 x",
                "",
                "# end"
            ]
        );
    }

    #[test]
    fn append_to_empty_section_adds_spacing() {
        let mut collection = load("10.10.2012\n11.10.2012\nb 1 x");
        collection.append_entry(date(2012, 10, 10), fixed("new", 1.0)).unwrap();
        assert_eq!(
            collection.to_text(),
            ["10.10.2012", "new 1 desc", "", "11.10.2012", "b 1 x"]
        );

        let mut collection = load("10.10.2012\n\n11.10.2012");
        collection.append_entry(date(2012, 10, 10), fixed("new", 1.0)).unwrap();
        assert_eq!(
            collection.to_text(),
            ["10.10.2012", "new 1 desc", "", "11.10.2012"]
        );
    }

    #[test]
    fn append_new_date_follows_direction() {
        let mut collection = load("10.10.2012\na 1 x\n\n11.10.2012\nb 1 x");
        collection.append_entry(date(2012, 10, 12), fixed("c", 1.0)).unwrap();
        assert_eq!(
            collection.to_text(),
            ["10.10.2012", "a 1 x", "", "11.10.2012", "b 1 x", "", "12/10/2012", "c 1 desc"]
        );

        let mut collection = load("11.10.2012\nb 1 x\n\n10.10.2012\na 1 x");
        collection.append_entry(date(2012, 10, 12), fixed("c", 1.0)).unwrap();
        assert_eq!(
            collection.to_text(),
            ["12/10/2012", "c 1 desc", "", "11.10.2012", "b 1 x", "", "10.10.2012", "a 1 x"]
        );
    }

    #[test]
    fn append_new_date_without_direction_fails() {
        let mut collection = load("10.10.2012\na 1 x");
        let err = collection
            .append_entry(date(2012, 10, 11), fixed("b", 1.0))
            .unwrap_err();
        assert!(matches!(err, TimesheetError::UnknownDirection));
        assert_eq!(collection.to_text(), ["10.10.2012", "a 1 x"]);
    }

    #[test]
    fn default_direction_applies_to_empty_document() {
        for (direction, expected) in [
            (
                Direction::BottomUp,
                vec!["11/10/2012", "b 1 desc", "", "10/10/2012", "a 1 desc"],
            ),
            (
                Direction::TopDown,
                vec!["10/10/2012", "a 1 desc", "", "11/10/2012", "b 1 desc"],
            ),
        ] {
            let mut collection = EntriesCollection::default();
            collection.set_default_direction(Some(direction));
            collection.append_entry(date(2012, 10, 10), fixed("a", 1.0)).unwrap();
            collection.append_entry(date(2012, 10, 11), fixed("b", 1.0)).unwrap();
            assert_eq!(collection.to_text(), expected);
            assert_eq!(collection.direction(), Some(direction));
        }
    }

    #[test]
    fn override_beats_inferred_direction() {
        let mut collection = load("10.10.2012\na 1 x\n\n11.10.2012\nb 1 x");
        collection.set_direction_override(Some(Direction::BottomUp));
        collection.append_entry(date(2012, 10, 12), fixed("c", 1.0)).unwrap();
        assert_eq!(collection.to_text()[0], "12/10/2012");
    }

    #[test]
    fn append_then_remove_restores_lines() {
        let texts = [
            "10.10.2012\na 1 x\n\n11.10.2012\nb 1 x",
            "11.10.2012\nb 1 x\n\n10.10.2012\na 1 x",
            "10.10.2012\na 1 x\n\n12.10.2012\nb 1 x\n\n11.10.2012\nc 1 x",
        ];
        for text in texts {
            for target in [date(2012, 10, 10), date(2012, 10, 13)] {
                let mut collection = load(text);
                collection.set_default_direction(Some(Direction::TopDown));
                let before = collection.to_text();
                let entry = collection.append_entry(target, fixed("new", 1.0)).unwrap();
                assert_ne!(collection.to_text(), before);
                collection.remove_entry(entry).unwrap();
                assert_eq!(collection.to_text(), before, "{text:?} / {target}");
            }
        }
    }

    #[test]
    fn removing_last_entry_removes_date_and_spacing() {
        let mut collection = load("10.10.2012\na 1 x\n\n11.10.2012\nb 1 x\n\n12.10.2012\nc 1 x");
        let entry = collection.entries_for(date(2012, 10, 11))[0];
        let removed = collection.remove_entry(entry).unwrap();
        assert_eq!(removed.alias(), "b");
        assert!(!collection.contains_date(date(2012, 10, 11)));
        assert_eq!(
            collection.to_text(),
            ["10.10.2012", "a 1 x", "", "12.10.2012", "c 1 x"]
        );
        assert_eq!(collection.remove_entry(entry), None);
    }

    #[test]
    fn removing_one_of_many_keeps_date() {
        let mut collection = load("10.10.2012\na 1 x\nb 1 x");
        let entry = collection.entries_for(date(2012, 10, 10))[0];
        collection.remove_entry(entry);
        assert_eq!(collection.to_text(), ["10.10.2012", "b 1 x"]);
        assert_eq!(collection.entries_for(date(2012, 10, 10)).len(), 1);
    }

    #[test]
    fn remove_date_drops_section() {
        let mut collection = load("10.10.2012\na 1 x\nb 1 x\n\n11.10.2012\n\n12.10.2012\nc 1 x");
        assert_eq!(collection.remove_date(date(2012, 10, 10)).len(), 2);
        assert!(collection.remove_date(date(2012, 10, 11)).is_empty());
        assert_eq!(collection.to_text(), ["12.10.2012", "c 1 x"]);
        assert_eq!(collection.dates().collect::<Vec<_>>(), [date(2012, 10, 12)]);
    }

    #[test]
    fn mutation_only_regenerates_touched_line() {
        let mut collection = load("10.10.2012\nfoo   1   first\nbar 0900-1000   second");
        let entries = collection.entries_for(date(2012, 10, 10)).to_vec();
        collection.entry_mut(entries[1]).unwrap().set_pushed(true);
        assert_eq!(
            collection.to_text(),
            ["10.10.2012", "foo   1   first", "= bar 0900-1000   second"]
        );
    }

    #[test]
    fn invalid_span_is_rejected_on_append() {
        let mut collection = load("10.10.2012\na 1 x");
        let entry = EntryLine::new("b", Duration::span(Some(time(10, 0)), Some(time(9, 0))), "x");
        assert!(matches!(
            collection.append_entry(date(2012, 10, 10), entry),
            Err(TimesheetError::InvalidSpan { .. })
        ));
    }

    fn contents(collection: &EntriesCollection) -> Vec<(NaiveDate, String, Duration, String, bool, bool)> {
        collection
            .iter()
            .map(|(date, entry)| {
                let line = collection.entry(entry).unwrap();
                (
                    date,
                    line.alias().to_string(),
                    line.duration(),
                    line.description().to_string(),
                    line.is_pushed(),
                    line.has_flag(EntryFlag::Ignored),
                )
            })
            .collect()
    }

    fn assert_reads_back(collection: &EntriesCollection) {
        let reloaded = load(&collection.to_text().join("\n"));
        assert_eq!(contents(&reloaded), contents(collection));
    }

    #[test]
    fn mutated_document_reads_back() {
        let day = date(2012, 10, 10);
        let mut collection = load("10.10.2012\na 0900-1000 x");
        let entry = collection
            .append_entry(day, EntryLine::new("b", Duration::span(None, Some(time(11, 0))), "review"))
            .unwrap();
        assert_reads_back(&collection);
        collection.set_alias(entry, "c").unwrap();
        assert_reads_back(&collection);
        collection.set_description(entry, "code review").unwrap();
        assert_reads_back(&collection);
        collection
            .set_duration(entry, Duration::span(None, Some(time(11, 30))))
            .unwrap();
        assert_reads_back(&collection);
        collection.entry_mut(entry).unwrap().set_ignored(true);
        assert_reads_back(&collection);
        collection.add_date(day).unwrap();
        assert_reads_back(&collection);

        assert_eq!(
            collection.to_text(),
            ["10.10.2012", "a 0900-1000 x", "? c -11:30 code review"]
        );
    }

    #[test]
    fn entries_that_would_not_read_back_are_rejected() {
        let day = date(2012, 10, 10);
        let mut collection = load("10.10.2012\na 1 x");
        let cases = [
            ("foo bar", Duration::Fixed(1.0), "x"),
            ("", Duration::Fixed(1.0), "x"),
            ("?foo", Duration::Fixed(1.0), "x"),
            ("foo?", Duration::Fixed(1.0), "x"),
            ("=", Duration::Fixed(1.0), "x"),
            ("=?", Duration::Fixed(1.0), "x"),
            ("#foo", Duration::Fixed(1.0), "x"),
            ("12", Duration::Fixed(1.0), "15 minutes"),
            ("baz", Duration::Fixed(-1.0), "x"),
            ("baz", Duration::Fixed(1.0), ""),
            ("baz", Duration::Fixed(1.0), "   "),
            ("baz", Duration::Fixed(1.0), "two\nlines"),
            ("baz", Duration::Fixed(1.0), " padded"),
        ];
        for (alias, duration, description) in cases {
            let err = collection
                .append_entry(day, EntryLine::new(alias, duration, description))
                .unwrap_err();
            assert!(
                matches!(err, TimesheetError::InvalidEntry(_)),
                "{alias:?} {description:?}: {err}"
            );
        }
        assert_eq!(collection.to_text(), ["10.10.2012", "a 1 x"]);

        let entry = collection.entries_for(day)[0];
        assert!(matches!(
            collection.set_alias(entry, "foo bar"),
            Err(TimesheetError::InvalidEntry(_))
        ));
        assert!(matches!(
            collection.set_description(entry, ""),
            Err(TimesheetError::InvalidEntry(_))
        ));
        assert!(collection.entry(entry).unwrap().is_clean());
        assert_eq!(collection.to_text(), ["10.10.2012", "a 1 x"]);
    }

    #[test]
    fn chained_span_is_checked_against_previous_end() {
        let day = date(2012, 10, 10);
        let mut collection = load("10.10.2012\na 0900-1000 x");
        let chained = |end| EntryLine::new("b", Duration::span(None, Some(end)), "x");

        let err = collection.append_entry(day, chained(time(9, 30))).unwrap_err();
        assert!(matches!(
            err,
            TimesheetError::InvalidSpan { start, end } if start == time(10, 0) && end == time(9, 30)
        ));
        assert_eq!(collection.entries_for(day).len(), 1);

        let entry = collection.append_entry(day, chained(time(11, 0))).unwrap();
        assert!(matches!(
            collection.set_duration(entry, Duration::span(None, Some(time(9, 45)))),
            Err(TimesheetError::InvalidSpan { .. })
        ));
        let first = collection.entries_for(day)[0];
        assert!(matches!(
            collection.set_duration(first, Duration::span(Some(time(9, 0)), Some(time(11, 30)))),
            Err(TimesheetError::InvalidSpan { .. })
        ));

        collection
            .set_duration(first, Duration::span(Some(time(8, 0)), Some(time(9, 0))))
            .unwrap();
        assert_eq!(collection.to_text(), ["10.10.2012", "a 08:00-09:00 x", "b -11:00 x"]);
        assert!((collection.hours(entry) - 2.0).abs() < f64::EPSILON);
        assert_reads_back(&collection);
    }

    #[test]
    fn crlf_line_ending_is_detected() {
        let collection = load("10.10.2012\r\na 1 x\r\n");
        assert_eq!(collection.line_ending(), LineEnding::CrLf);
        assert_eq!(collection.to_text(), ["10.10.2012", "a 1 x"]);
        assert_eq!(load("10.10.2012\na 1 x").line_ending(), LineEnding::Lf);
    }

    #[test]
    fn add_date_creates_empty_section() {
        let mut collection = load("10.10.2012\na 1 x\n\n11.10.2012\nb 1 x");
        collection.add_date(date(2012, 10, 12)).unwrap();
        collection.add_date(date(2012, 10, 12)).unwrap();
        assert_eq!(
            collection.to_text(),
            ["10.10.2012", "a 1 x", "", "11.10.2012", "b 1 x", "", "12/10/2012"]
        );
        assert!(collection.entries_for(date(2012, 10, 12)).is_empty());
    }
}
