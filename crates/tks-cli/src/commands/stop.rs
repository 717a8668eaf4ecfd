//! Stop command for closing the activity in progress.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::Args;

use super::util::{current_timesheet, join_words, load_timesheets, parse_time};
use crate::Config;

#[derive(Debug, Args)]
pub struct StopArgs {
    /// Replaces the description of the activity.
    #[arg(trailing_var_arg = true)]
    pub description: Vec<String>,
    /// Stop time (defaults to now).
    #[arg(long)]
    pub at: Option<String>,
}

pub fn run<W: Write>(
    writer: &mut W,
    args: &StopArgs,
    config: &Config,
    now: NaiveDateTime,
) -> Result<()> {
    let at = match &args.at {
        Some(at) => parse_time(at)?,
        None => now.time(),
    };
    let date = now.date();
    let description = (!args.description.is_empty()).then(|| join_words(&args.description));

    let mut timesheets = load_timesheets(config, date)?;
    let timesheet = current_timesheet(&mut timesheets)?;
    let entry = timesheet.continue_entry(date, at, config.round_entries, description.as_deref())?;
    timesheet
        .save()
        .with_context(|| format!("failed to save {}", timesheet.path().display()))?;

    let entries = timesheet.entries();
    let alias = entries.entry(entry).map_or("", |line| line.alias());
    match entries.entry(entry).and_then(|line| line.duration().end()) {
        Some(end) => writeln!(
            writer,
            "Stopped {alias} at {} ({:.2}h)",
            end.format("%H:%M"),
            entries.hours(entry)
        )?,
        None => writeln!(writer, "Stopped {alias}")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use tks_core::TimesheetError;

    fn config_in(dir: &std::path::Path) -> Config {
        Config {
            file: dir.join("%Y-%m.tks").to_string_lossy().into_owned(),
            ..Config::default()
        }
    }

    fn now(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn stop_rounds_to_configured_minutes() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());
        let path = temp.path().join("2026-10.tks");
        std::fs::write(&path, "16/10/2026\nmeeting   09:00-10:00   standup\ndev   -?   pairing\n").unwrap();

        let args = StopArgs {
            description: vec!["code".to_string(), "review".to_string()],
            at: None,
        };
        let mut output = Vec::new();
        run(&mut output, &args, &config, now(10, 1)).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "Stopped dev at 10:15 (0.25h)\n");
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "16/10/2026\nmeeting   09:00-10:00   standup\ndev   -10:15   code review\n"
        );
    }

    #[test]
    fn stop_without_activity_fails() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            round_entries: 0,
            ..config_in(temp.path())
        };

        let args = StopArgs {
            description: Vec::new(),
            at: Some("12:00".to_string()),
        };
        let mut output = Vec::new();
        let err = run(&mut output, &args, &config, now(12, 0)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TimesheetError>(),
            Some(TimesheetError::NoActivityInProgress)
        ));
        assert!(!temp.path().join("2026-10.tks").exists());
    }
}
