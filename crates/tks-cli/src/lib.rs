//! Timesheet CLI library.
//!
//! This crate provides the CLI interface for plain-text timesheets.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::{Config, NewDates};
