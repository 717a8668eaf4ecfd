//! Recognition of dates, times and durations embedded in text tokens.

use std::sync::LazyLock;

use chrono::{Datelike, Local, NaiveDate, NaiveTime};
use regex::{Captures, Regex};

use crate::duration::Duration;
use crate::error::ParseError;

/// `D?D<sep>D?D<sep>YYYY|YY`, day first.
static DAY_FIRST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{1,2})[^0-9]([0-9]{1,2})[^0-9]([0-9]{4}|[0-9]{2})").unwrap()
});

/// `YYYY<sep>D?D<sep>D?D`, year first.
static YEAR_FIRST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})[^0-9]([0-9]{1,2})[^0-9]([0-9]{1,2})").unwrap());

/// `(HH[:]MM)?-(HH[:]MM|?)`.
static SPAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:([0-9]{1,2}):?([0-9]{2}))?-(?:([0-9]{1,2}):?([0-9]{2})|\?)$").unwrap()
});

/// `HH[:]MM`.
static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{1,2}):?([0-9]{2})$").unwrap());

/// Year, month and day as written, before calendar validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateParts {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl DateParts {
    pub fn to_date(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

/// Matches a date pattern at the start of `token`, resolving two-digit years
/// against `current_year`.
pub fn match_date_parts(token: &str, current_year: i32) -> Option<DateParts> {
    if let Some(caps) = DAY_FIRST_RE.captures(token) {
        let year_digits = &caps[3];
        let mut year: i32 = year_digits.parse().ok()?;
        if year_digits.len() == 2 {
            year += current_year - current_year % 1000;
        }
        return Some(DateParts {
            year,
            month: caps[2].parse().ok()?,
            day: caps[1].parse().ok()?,
        });
    }

    let caps = YEAR_FIRST_RE.captures(token)?;
    Some(DateParts {
        year: caps[1].parse().ok()?,
        month: caps[2].parse().ok()?,
        day: caps[3].parse().ok()?,
    })
}

/// Extracts a date from the start of `token`.
///
/// Two-digit years resolve to the current millennium. Returns `None` when no
/// pattern matches or the date does not exist.
pub fn extract_date(token: &str) -> Option<NaiveDate> {
    extract_date_in(token, Local::now().year())
}

/// Like [`extract_date`], with an explicit reference year.
pub fn extract_date_in(token: &str, current_year: i32) -> Option<NaiveDate> {
    match_date_parts(token, current_year)?.to_date()
}

fn time_from_captures(caps: &Captures<'_>, hours: usize, minutes: usize) -> Result<Option<NaiveTime>, ParseError> {
    let (Some(h), Some(m)) = (caps.get(hours), caps.get(minutes)) else {
        return Ok(None);
    };
    let h: u32 = h.as_str().parse().map_err(|_| ParseError::new("invalid hour"))?;
    let m: u32 = m.as_str().parse().map_err(|_| ParseError::new("invalid minute"))?;
    NaiveTime::from_hms_opt(h, m, 0)
        .map(Some)
        .ok_or_else(|| ParseError::new(format!("invalid time {h:02}:{m:02}")))
}

/// Parses a `HH:MM` or `HHMM` time of day.
pub fn parse_time(token: &str) -> Result<NaiveTime, ParseError> {
    let caps = TIME_RE
        .captures(token.trim())
        .ok_or_else(|| ParseError::new(format!("invalid time {token:?}, expected HH:MM")))?;
    time_from_captures(&caps, 1, 2)?.ok_or_else(|| ParseError::new("invalid time"))
}

/// Parses a duration token.
///
/// Accepts `HH[:]MM-HH[:]MM`, `HH[:]MM-?`, `-HH[:]MM` and decimal hours.
pub fn parse_duration(token: &str) -> Result<Duration, ParseError> {
    if let Some(caps) = SPAN_RE.captures(token) {
        let start = time_from_captures(&caps, 1, 2)?;
        let end = time_from_captures(&caps, 3, 4)?;
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(ParseError::new(format!(
                    "end time {} is before start time {}",
                    end.format("%H:%M"),
                    start.format("%H:%M")
                )));
            }
        }
        return Ok(Duration::span(start, end));
    }

    match token.parse::<f64>() {
        Ok(hours) if hours.is_finite() && hours >= 0.0 => Ok(Duration::Fixed(hours)),
        _ => Err(ParseError::new(
            "duration must be a decimal number or HH:MM notation",
        )),
    }
}
