//! Prefill command for adding the working days of the month.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use super::util::{current_timesheet, load_timesheets};
use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config, today: NaiveDate) -> Result<()> {
    let mut timesheets = load_timesheets(config, today)?;
    let timesheet = current_timesheet(&mut timesheets)?;
    let added = timesheet.prefill(&config.prefill_weekdays, today)?;

    if added.is_empty() {
        writeln!(writer, "Nothing to prefill.")?;
        return Ok(());
    }

    timesheet
        .save()
        .with_context(|| format!("failed to save {}", timesheet.path().display()))?;
    let dates: Vec<String> = added.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect();
    writeln!(writer, "Added {} date(s): {}", added.len(), dates.join(", "))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Weekday;
    use insta::assert_snapshot;

    #[test]
    fn prefill_adds_configured_weekdays_up_to_today() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            file: temp.path().join("%Y-%m.tks").to_string_lossy().into_owned(),
            prefill_weekdays: vec![Weekday::Mon, Weekday::Wed],
            ..Config::default()
        };
        let path = temp.path().join("2026-10.tks");
        std::fs::write(&path, "02/10/2026\nops 1 on call\n").unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();

        let mut output = Vec::new();
        run(&mut output, &config, today).unwrap();
        run(&mut output, &config, today).unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Added 4 date(s): 2026-10-05, 2026-10-07, 2026-10-12, 2026-10-14
        Nothing to prefill.
        ");
        assert_snapshot!(std::fs::read_to_string(&path).unwrap(), @r"
        02/10/2026
        ops 1 on call

        05/10/2026

        07/10/2026

        12/10/2026

        14/10/2026
        ");
    }
}
