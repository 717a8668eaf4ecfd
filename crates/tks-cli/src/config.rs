//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Weekday;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tks_core::{Direction, LineFormat};

/// Where new date sections are inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewDates {
    /// Follow the order of the existing dates.
    #[default]
    Auto,
    /// Newest dates first.
    Top,
    /// Newest dates last.
    Bottom,
}

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Timesheet path, with strftime date specifiers.
    pub file: String,
    /// Number of earlier timesheet files loaded alongside the current one.
    pub nb_previous_files: usize,
    pub date_format: String,
    pub time_format: String,
    pub pushed_flag: char,
    pub ignored_flag: char,
    pub new_dates: NewDates,
    /// Minutes stopped activities are rounded up to.
    pub round_entries: u32,
    pub prefill_weekdays: Vec<Weekday>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("file", &self.file)
            .field("nb_previous_files", &self.nb_previous_files)
            .field("new_dates", &self.new_dates)
            .field("round_entries", &self.round_entries)
            .finish_non_exhaustive()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        let format = LineFormat::default();
        Self {
            file: data_dir.join("%Y").join("%m.tks").to_string_lossy().into_owned(),
            nb_previous_files: 1,
            date_format: format.date_format,
            time_format: format.time_format,
            pushed_flag: format.pushed_flag,
            ignored_flag: format.ignored_flag,
            new_dates: NewDates::Auto,
            round_entries: 15,
            prefill_weekdays: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // TKS_FILE, TKS_ROUND_ENTRIES, ...
        figment = figment.merge(Env::prefixed("TKS_"));

        figment.extract()
    }

    /// Rendering rules for lines the CLI writes.
    pub fn line_format(&self) -> LineFormat {
        LineFormat {
            date_format: self.date_format.clone(),
            time_format: self.time_format.clone(),
            pushed_flag: self.pushed_flag,
            ignored_flag: self.ignored_flag,
        }
    }

    /// Direction forced on every timesheet, if any.
    pub const fn direction_override(&self) -> Option<Direction> {
        match self.new_dates {
            NewDates::Auto => None,
            NewDates::Top => Some(Direction::BottomUp),
            NewDates::Bottom => Some(Direction::TopDown),
        }
    }

    /// Direction of timesheets whose order can't be inferred.
    pub const fn fallback_direction(&self) -> Direction {
        match self.new_dates {
            NewDates::Top => Direction::BottomUp,
            NewDates::Auto | NewDates::Bottom => Direction::TopDown,
        }
    }
}

/// Returns the platform-specific config directory for tks.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tks"))
}

/// Returns the platform-specific data directory for tks.
///
/// On Linux: `~/.local/share/tks`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("tks"))
}
