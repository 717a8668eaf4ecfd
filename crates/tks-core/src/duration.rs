//! Entry durations: a fixed number of hours or a time-of-day span.

use std::fmt::Write;

use chrono::NaiveTime;

/// How long an entry lasted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Duration {
    /// A plain number of hours, e.g. `1.75`.
    Fixed(f64),
    /// A time-of-day interval.
    ///
    /// A missing `start` inherits the end of the previous entry of the same
    /// date. A missing `end` means the activity is still in progress.
    Span {
        start: Option<NaiveTime>,
        end: Option<NaiveTime>,
    },
}

impl Duration {
    pub const fn span(start: Option<NaiveTime>, end: Option<NaiveTime>) -> Self {
        Self::Span { start, end }
    }

    pub const fn is_span(&self) -> bool {
        matches!(self, Self::Span { .. })
    }

    /// True for a span without an end time.
    pub const fn is_in_progress(&self) -> bool {
        matches!(self, Self::Span { end: None, .. })
    }

    pub const fn start(&self) -> Option<NaiveTime> {
        match self {
            Self::Span { start, .. } => *start,
            Self::Fixed(_) => None,
        }
    }

    pub const fn end(&self) -> Option<NaiveTime> {
        match self {
            Self::Span { end, .. } => *end,
            Self::Fixed(_) => None,
        }
    }

    /// Number of completed hours.
    ///
    /// `effective_start` replaces a missing span start (chained entries).
    /// In-progress and unresolvable spans count as zero.
    #[allow(clippy::cast_precision_loss)]
    pub fn hours(&self, effective_start: Option<NaiveTime>) -> f64 {
        match *self {
            Self::Fixed(hours) => hours,
            Self::Span { start, end } => {
                let (Some(start), Some(end)) = (start.or(effective_start), end) else {
                    return 0.0;
                };
                // Both times share the same implicit day, spans never wrap.
                let seconds = end.signed_duration_since(start).num_seconds().max(0);
                seconds as f64 / 3600.0
            }
        }
    }

    /// Renders the duration in document notation.
    pub fn render(&self, time_format: &str) -> String {
        match self {
            Self::Fixed(hours) => format!("{hours}"),
            Self::Span { start, end } => {
                let start = start.map(|t| format_time(t, time_format));
                let end = end.map_or_else(|| "?".to_string(), |t| format_time(t, time_format));
                format!("{}-{end}", start.unwrap_or_default())
            }
        }
    }
}

/// Formats a time, falling back to `HH:MM` when the format is invalid.
pub(crate) fn format_time(time: NaiveTime, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", time.format(format)).is_err() {
        return time.format("%H:%M").to_string();
    }
    out
}
