//! Format-preserving timesheet documents.
//!
//! A timesheet is a plain-text file of date sections holding time entries:
//!
//! ```text
//! # october
//! 16/10/2026
//! review  09:00-10:30  code review
//! docs    -12:00       chained to the previous entry
//! ? lunch 1            not billed
//! ```
//!
//! This crate contains:
//! - Extraction: dates and durations found in tokens
//! - Parsing: document text to typed lines, keeping their original text
//! - Entries: a date index kept in lock-step with the lines on every mutation
//! - Aggregation: filtered and regrouped views for reports and pushes
//! - Timesheets: single files and sets of consecutive files

pub mod aggregate;
pub mod collection;
mod duration;
pub mod entries;
mod error;
pub mod extract;
pub mod line;
pub mod parser;
pub mod push;
mod timesheet;

pub use aggregate::{AggregatedEntry, AliasLookup, EntryFilter, EntryView};
pub use collection::{Granularity, TimesheetCollection, expand_pattern, timesheet_paths};
pub use duration::Duration;
pub use entries::{Direction, EntriesCollection, EntryRef};
pub use error::{ParseError, TimesheetError};
pub use extract::{extract_date, parse_duration};
pub use line::{DateLine, EntryFlag, EntryLine, Line, LineEnding, LineFormat, TextLine};
pub use push::{PushBackend, PushEntry, PushOutcome, PushReport};
pub use timesheet::Timesheet;
