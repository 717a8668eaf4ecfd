use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime, Timelike};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tks_cli::commands::{add, aliases, edit_path, prefill, start, status, stop};
use tks_cli::{Cli, Commands, Config};

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

/// Local time truncated to the minute, the resolution of timesheet spans.
fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_second(0)
        .and_then(|now| now.with_nanosecond(0))
        .unwrap_or(now)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // try_init: tracing may already be initialized in tests
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = load_config(cli.config.as_deref())?;
    let now = now();
    let today = now.date();
    let mut stdout = std::io::stdout().lock();

    match command {
        Commands::Status(args) => status::run(&mut stdout, args, &config, today)?,
        Commands::Add(args) => add::run(&mut stdout, args, &config, today)?,
        Commands::Start(args) => start::run(&mut stdout, args, &config, now)?,
        Commands::Stop(args) => stop::run(&mut stdout, args, &config, now)?,
        Commands::Prefill => prefill::run(&mut stdout, &config, today)?,
        Commands::Aliases(args) => aliases::run(&mut stdout, args, &config, today)?,
        Commands::EditPath => edit_path::run(&mut stdout, &config, today)?,
    }

    stdout.flush()?;
    Ok(())
}
