//! Interface to the backend entries are pushed to.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

/// What a backend receives for one (possibly aggregated) entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushEntry {
    pub alias: String,
    pub description: String,
    pub hours: f64,
    /// Resolved start of the first member, when it is a span.
    pub start: Option<NaiveTime>,
}

/// Remote service receiving timesheet entries.
pub trait PushBackend {
    type Error: std::fmt::Display;

    fn push(&mut self, date: NaiveDate, entry: &PushEntry) -> Result<(), Self::Error>;
}

/// Outcome of pushing one entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PushOutcome {
    pub date: NaiveDate,
    pub entry: PushEntry,
    pub error: Option<String>,
}

/// Per-entry results of a push run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushReport {
    pub outcomes: Vec<PushOutcome>,
}

impl PushReport {
    pub fn pushed(&self) -> impl Iterator<Item = &PushOutcome> {
        self.outcomes.iter().filter(|o| o.error.is_none())
    }

    pub fn failed(&self) -> impl Iterator<Item = &PushOutcome> {
        self.outcomes.iter().filter(|o| o.error.is_some())
    }
}
