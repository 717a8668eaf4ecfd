//! Typed document lines and their text generation.
//!
//! Every line keeps the raw text it was parsed from. As long as none of its
//! fields change, rendering gives that text back verbatim; any mutation drops
//! the cached text of that line (and only that line) so it is regenerated
//! from its fields.

use std::collections::BTreeSet;
use std::fmt::Write;

use chrono::NaiveDate;

use crate::duration::Duration;

/// Rendering rules for regenerated lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFormat {
    /// strftime format of generated date lines.
    pub date_format: String,
    /// strftime format of times in generated spans.
    pub time_format: String,
    /// Flag marking entries already pushed.
    pub pushed_flag: char,
    /// Flag marking ignored entries.
    pub ignored_flag: char,
}

impl Default for LineFormat {
    fn default() -> Self {
        Self {
            date_format: "%d/%m/%Y".to_string(),
            time_format: "%H:%M".to_string(),
            pushed_flag: '=',
            ignored_flag: '?',
        }
    }
}

impl LineFormat {
    pub(crate) fn is_flag(&self, c: char) -> bool {
        c == self.pushed_flag || c == self.ignored_flag
    }

    fn format_date(&self, date: NaiveDate) -> String {
        let mut out = String::new();
        if write!(out, "{}", date.format(&self.date_format)).is_err() {
            return date.format("%d/%m/%Y").to_string();
        }
        out
    }
}

/// Line terminator of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    /// Terminator of the first line of `text`, `Lf` when there is none.
    pub fn detect(text: &str) -> Self {
        match text.find('\n') {
            Some(pos) if text[..pos].ends_with('\r') => Self::CrLf,
            _ => Self::Lf,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// Blank or comment line, kept as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    raw: String,
}

impl TextLine {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn blank() -> Self {
        Self::new("")
    }

    pub fn text(&self) -> &str {
        &self.raw
    }

    pub fn is_blank(&self) -> bool {
        self.raw.trim().is_empty()
    }

    pub fn is_comment(&self) -> bool {
        self.raw.trim_start().starts_with('#')
    }
}

/// Start of a date section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateLine {
    date: NaiveDate,
    raw: Option<String>,
}

impl DateLine {
    pub const fn new(date: NaiveDate) -> Self {
        Self { date, raw: None }
    }

    pub(crate) const fn parsed(date: NaiveDate, raw: String) -> Self {
        Self {
            date,
            raw: Some(raw),
        }
    }

    pub const fn date(&self) -> NaiveDate {
        self.date
    }
}

/// State flags carried by an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryFlag {
    Pushed,
    Ignored,
}

/// Whitespace surrounding the duration token, as written.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Separators {
    before_duration: String,
    before_description: String,
}

impl Default for Separators {
    fn default() -> Self {
        Self {
            before_duration: " ".to_string(),
            before_description: " ".to_string(),
        }
    }
}

/// One time entry: `[flags ]ALIAS DURATION DESCRIPTION`.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryLine {
    alias: String,
    duration: Duration,
    description: String,
    flags: BTreeSet<EntryFlag>,
    push_error: Option<String>,
    raw: Option<String>,
    raw_duration: Option<String>,
    separators: Separators,
}

impl EntryLine {
    pub fn new(alias: impl Into<String>, duration: Duration, description: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            duration,
            description: description.into(),
            flags: BTreeSet::new(),
            push_error: None,
            raw: None,
            raw_duration: None,
            separators: Separators::default(),
        }
    }

    /// Builds an entry read from text, remembering its original layout.
    pub(crate) fn parsed(
        alias: String,
        duration: Duration,
        description: String,
        flags: BTreeSet<EntryFlag>,
        layout: ParsedLayout,
    ) -> Self {
        Self {
            alias,
            duration,
            description,
            flags,
            push_error: None,
            raw: Some(layout.raw),
            raw_duration: Some(layout.duration),
            separators: Separators {
                before_duration: layout.before_duration,
                before_description: layout.before_description,
            },
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub const fn duration(&self) -> Duration {
        self.duration
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    // Alias, duration and description only change through the owning
    // collection, which checks the new line reads back.
    pub(crate) fn set_alias(&mut self, alias: impl Into<String>) {
        let alias = alias.into();
        if alias != self.alias {
            self.alias = alias;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_duration(&mut self, duration: Duration) {
        if duration != self.duration {
            self.duration = duration;
            self.raw_duration = None;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_description(&mut self, description: impl Into<String>) {
        let description = description.into();
        if description != self.description {
            self.description = description;
            self.mark_dirty();
        }
    }

    pub fn has_flag(&self, flag: EntryFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn add_flag(&mut self, flag: EntryFlag) {
        if self.flags.insert(flag) {
            self.mark_dirty();
        }
    }

    pub fn remove_flag(&mut self, flag: EntryFlag) {
        if self.flags.remove(&flag) {
            self.mark_dirty();
        }
    }

    pub fn is_pushed(&self) -> bool {
        self.has_flag(EntryFlag::Pushed)
    }

    pub fn set_pushed(&mut self, pushed: bool) {
        if pushed {
            self.add_flag(EntryFlag::Pushed);
        } else {
            self.remove_flag(EntryFlag::Pushed);
        }
    }

    /// Explicitly ignored, through a flag or a `?` description.
    ///
    /// Zero-hour entries are also ignored but that needs the surrounding
    /// date to resolve chained spans, see
    /// [`EntriesCollection::is_ignored`](crate::EntriesCollection::is_ignored).
    pub fn is_marked_ignored(&self) -> bool {
        self.has_flag(EntryFlag::Ignored) || self.description == "?"
    }

    pub fn set_ignored(&mut self, ignored: bool) {
        if ignored {
            self.add_flag(EntryFlag::Ignored);
        } else {
            self.remove_flag(EntryFlag::Ignored);
        }
    }

    /// Error reported by the last failed push. Never rendered.
    pub fn push_error(&self) -> Option<&str> {
        self.push_error.as_deref()
    }

    pub fn set_push_error(&mut self, error: Option<String>) {
        self.push_error = error;
    }

    /// True when rendering will reuse the original text.
    pub const fn is_clean(&self) -> bool {
        self.raw.is_some()
    }

    fn mark_dirty(&mut self) {
        self.raw = None;
    }

    /// Same alias, duration, description and flags, whatever the layout.
    pub(crate) fn same_content(&self, other: &Self) -> bool {
        self.alias == other.alias
            && self.duration == other.duration
            && self.description == other.description
            && self.flags == other.flags
    }

    pub(crate) fn generate(&self, format: &LineFormat) -> String {
        let mut text = String::new();
        if !self.flags.is_empty() {
            for flag in &self.flags {
                text.push(match flag {
                    EntryFlag::Pushed => format.pushed_flag,
                    EntryFlag::Ignored => format.ignored_flag,
                });
            }
            text.push(' ');
        }
        text.push_str(&self.alias);
        text.push_str(&self.separators.before_duration);
        match &self.raw_duration {
            Some(duration) => text.push_str(duration),
            None => text.push_str(&self.duration.render(&format.time_format)),
        }
        if !self.description.is_empty() {
            text.push_str(&self.separators.before_description);
            text.push_str(&self.description);
        }
        text
    }
}

/// Original text pieces of a parsed entry line.
#[derive(Debug)]
pub(crate) struct ParsedLayout {
    pub raw: String,
    pub duration: String,
    pub before_duration: String,
    pub before_description: String,
}

/// One physical line of a timesheet document.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Text(TextLine),
    Date(DateLine),
    Entry(EntryLine),
}

impl Line {
    /// Renders the line: cached raw text when untouched, regenerated otherwise.
    pub fn render(&self, format: &LineFormat) -> String {
        match self {
            Self::Text(line) => line.raw.clone(),
            Self::Date(line) => line
                .raw
                .clone()
                .unwrap_or_else(|| format.format_date(line.date)),
            Self::Entry(line) => line.raw.clone().unwrap_or_else(|| line.generate(format)),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(line) if line.is_blank())
    }

    pub const fn as_entry(&self) -> Option<&EntryLine> {
        match self {
            Self::Entry(entry) => Some(entry),
            _ => None,
        }
    }

    pub const fn as_entry_mut(&mut self) -> Option<&mut EntryLine> {
        match self {
            Self::Entry(entry) => Some(entry),
            _ => None,
        }
    }

    pub const fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(line) => Some(line.date),
            _ => None,
        }
    }
}
