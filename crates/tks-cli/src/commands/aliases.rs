//! Aliases command listing the most used aliases.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;

use super::util::load_timesheets;
use crate::Config;

#[derive(Debug, Args)]
pub struct AliasesArgs {
    /// Maximum number of aliases to show.
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,
}

pub fn run<W: Write>(
    writer: &mut W,
    args: &AliasesArgs,
    config: &Config,
    today: NaiveDate,
) -> Result<()> {
    let timesheets = load_timesheets(config, today)?;
    let aliases = timesheets.popular_aliases(Some(args.limit));

    if aliases.is_empty() {
        writeln!(writer, "No aliases used yet.")?;
        return Ok(());
    }

    let width = aliases
        .iter()
        .map(|(alias, _)| alias.chars().count())
        .max()
        .unwrap_or(0);
    for (alias, count) in aliases {
        writeln!(writer, "{alias:<width$}  {count}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    #[test]
    fn aliases_are_ranked_across_files() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            file: temp.path().join("%Y-%m.tks").to_string_lossy().into_owned(),
            ..Config::default()
        };
        std::fs::write(
            temp.path().join("2026-09.tks"),
            "29/09/2026\nsupport 1 x\nreview 1 x\n",
        )
        .unwrap();
        std::fs::write(
            temp.path().join("2026-10.tks"),
            "01/10/2026\nreview 1 x\ndocs 1 x\nreview 1 x\n",
        )
        .unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();

        let mut output = Vec::new();
        run(&mut output, &AliasesArgs { limit: 2 }, &config, today).unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        review   3
        support  1
        ");
    }
}
