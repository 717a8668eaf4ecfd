//! Edit-path command printing the current timesheet location.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tks_core::expand_pattern;

use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config, today: NaiveDate) -> Result<()> {
    let path = expand_pattern(&config.file, today).context("failed to expand file pattern")?;
    writeln!(writer, "{}", path.display())?;
    Ok(())
}
