//! Turns document text into a sequence of typed lines.

use std::collections::{BTreeSet, HashMap};

use chrono::{Datelike, Local, NaiveDate, NaiveTime};

use crate::duration::Duration;
use crate::error::ParseError;
use crate::extract::{match_date_parts, parse_duration};
use crate::line::{DateLine, EntryFlag, EntryLine, Line, LineFormat, ParsedLayout, TextLine};

/// Line-by-line parser tracking the current date section.
struct LineParser<'a> {
    format: &'a LineFormat,
    current_year: i32,
    current_date: Option<NaiveDate>,
    /// End time of the last entry seen for each date, used to check chains.
    last_end: HashMap<NaiveDate, Option<NaiveTime>>,
}

impl<'a> LineParser<'a> {
    fn new(format: &'a LineFormat, current_year: i32) -> Self {
        Self {
            format,
            current_year,
            current_date: None,
            last_end: HashMap::new(),
        }
    }

    fn parse_line(&mut self, raw: &str) -> Result<Line, ParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(Line::Text(TextLine::new(raw)));
        }

        if let Some(parts) = match_date_parts(trimmed, self.current_year) {
            let date = parts.to_date().ok_or_else(|| {
                ParseError::new(format!(
                    "invalid date {:02}/{:02}/{}",
                    parts.day, parts.month, parts.year
                ))
            })?;
            self.current_date = Some(date);
            return Ok(Line::Date(DateLine::parsed(date, raw.to_string())));
        }

        let Some(date) = self.current_date else {
            return Err(ParseError::new(
                "entries must be defined inside a date section",
            ));
        };

        let entry = self.parse_entry(raw, trimmed)?;
        self.check_chain(date, entry.duration())?;
        Ok(Line::Entry(entry))
    }

    fn parse_entry(&self, raw: &str, trimmed: &str) -> Result<EntryLine, ParseError> {
        let mut flags = BTreeSet::new();
        let mut rest = trimmed;

        if let Some((token, _, remainder)) = split_token(rest) {
            if token.chars().all(|c| self.format.is_flag(c)) {
                for c in token.chars() {
                    flags.insert(if c == self.format.pushed_flag {
                        EntryFlag::Pushed
                    } else {
                        EntryFlag::Ignored
                    });
                }
                rest = remainder;
            }
        }

        let invalid = || ParseError::new("entry must have the form ALIAS DURATION DESCRIPTION");
        let (alias, before_duration, rest) = split_token(rest).ok_or_else(invalid)?;
        let (duration_token, before_description, description) =
            split_token(rest).ok_or_else(invalid)?;

        let marker = self.format.ignored_flag;
        let mut alias = alias;
        if alias.starts_with(marker) || alias.ends_with(marker) {
            flags.insert(EntryFlag::Ignored);
            alias = alias.trim_matches(marker);
        }
        if alias.is_empty() {
            return Err(ParseError::new("entry alias cannot be empty"));
        }

        let duration = parse_duration(duration_token)?;

        Ok(EntryLine::parsed(
            alias.to_string(),
            duration,
            description.to_string(),
            flags,
            ParsedLayout {
                raw: raw.to_string(),
                duration: duration_token.to_string(),
                before_duration: before_duration.to_string(),
                before_description: before_description.to_string(),
            },
        ))
    }

    /// Rejects chained spans ending before the end of the previous entry.
    fn check_chain(&mut self, date: NaiveDate, duration: Duration) -> Result<(), ParseError> {
        let previous_end = self.last_end.get(&date).copied().flatten();
        if let Duration::Span {
            start: None,
            end: Some(end),
        } = duration
        {
            if let Some(start) = previous_end.filter(|start| end < *start) {
                return Err(ParseError::new(format!(
                    "end time {} is before start time {}",
                    end.format("%H:%M"),
                    start.format("%H:%M")
                )));
            }
        }
        self.last_end.insert(date, duration.end());
        Ok(())
    }
}

/// Splits `text` into its first whitespace-delimited token, the whitespace
/// run after it and the remainder.
///
/// Returns `None` when there is no non-empty remainder.
fn split_token(text: &str) -> Option<(&str, &str, &str)> {
    let token_end = text.find(char::is_whitespace)?;
    let (token, after) = text.split_at(token_end);
    let rest = after.trim_start();
    if rest.is_empty() {
        return None;
    }
    let separator = &after[..after.len() - rest.len()];
    Some((token, separator, rest))
}

/// Reads `text` back as a single entry line of some date section.
pub(crate) fn parse_entry_text(text: &str, format: &LineFormat) -> Result<EntryLine, ParseError> {
    let parser = LineParser::new(format, Local::now().year());
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Err(ParseError::new("line would be read as a comment"));
    }
    if match_date_parts(trimmed, parser.current_year).is_some() {
        return Err(ParseError::new("line would be read as a date"));
    }
    parser.parse_entry(text, trimmed)
}

/// Parses a whole document.
///
/// Leading and trailing blank lines are dropped. Any error aborts the parse
/// and carries the 1-based line number.
pub fn parse(text: &str, format: &LineFormat) -> Result<Vec<Line>, ParseError> {
    parse_in(text, format, Local::now().year())
}

/// Like [`parse`], with an explicit reference year for two-digit years.
pub fn parse_in(text: &str, format: &LineFormat, current_year: i32) -> Result<Vec<Line>, ParseError> {
    let mut parser = LineParser::new(format, current_year);
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, raw)| parser.parse_line(raw).map_err(|e| e.at_line(i + 1)))
        .collect::<Result<Vec<_>, _>>()?;

    let leading = lines.iter().take_while(|line| line.is_blank()).count();
    lines.drain(..leading);
    while lines.last().is_some_and(Line::is_blank) {
        lines.pop();
    }

    Ok(lines)
}
