//! Error types for timesheet parsing and mutation.

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveTime;
use thiserror::Error;

/// A malformed document or token.
///
/// Parse errors abort the whole parse; no partially parsed document is ever
/// returned alongside one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Human-readable description of the problem.
    pub message: String,
    /// 1-based line number, when the error comes from a document.
    pub line_number: Option<usize>,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line_number: None,
        }
    }

    /// Attaches a line number, keeping an existing one.
    #[must_use]
    pub fn at_line(mut self, line_number: usize) -> Self {
        self.line_number.get_or_insert(line_number);
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line_number {
            Some(line) => write!(f, "line {line}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ParseError {}

/// Errors returned by timesheet operations.
#[derive(Debug, Error)]
pub enum TimesheetError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The last entry of the date is not an open span.
    #[error("no activity in progress")]
    NoActivityInProgress,

    /// An activity of the date is already running.
    #[error("an activity is already in progress")]
    ActivityInProgress,

    /// The requested stop time precedes the start of the running activity.
    #[error("cannot stop the activity at {end}: it started at {start}")]
    StopInThePast { start: NaiveTime, end: NaiveTime },

    /// A new date section is needed but the insertion direction is unknown.
    #[error("cannot add a new date: the direction of the timesheet is unknown")]
    UnknownDirection,

    /// A span whose end precedes its start.
    #[error("end time {end} is before start time {start}")]
    InvalidSpan { start: NaiveTime, end: NaiveTime },

    /// An entry whose text would not read back as the same entry.
    #[error("invalid entry: {0}")]
    InvalidEntry(String),

    /// The entry reference no longer points to an entry line.
    #[error("entry not found")]
    EntryNotFound,

    /// The file name pattern contains an invalid strftime specifier.
    #[error("invalid file pattern: {0}")]
    InvalidPattern(String),

    #[error("failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
