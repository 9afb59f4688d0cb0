// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod cli;
mod commands;
mod config;
mod runtime;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command, ConfigCommand};
use config::Config;
use log::{LevelFilter, info};
use mrr_db::Store;
use mrr_testkit::RevenueFaker;
use runtime::DbRuntime;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use time::{Date, OffsetDateTime};

const DEMO_SEED: u64 = 42;
const DEMO_MONTHS: u32 = 6;
const DEMO_ENTRIES_PER_MONTH: usize = 5;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };

    let command = cli.command.unwrap_or(Command::Tui);
    if let Command::Config(config_command) = &command {
        return print_config(config_command, &config_path);
    }

    let config = Config::load(&config_path).with_context(|| {
        format!(
            "load config {}; run `mrr config example` to generate a v1 template",
            config_path.display()
        )
    })?;
    if let Err(error) = init_logger(&config) {
        eprintln!("warning: logging disabled: {error:#}");
    }

    let db_path = resolve_db_path(cli.db.as_deref(), cli.demo, &config)?;
    let store = Store::open(&db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, pass --db, set [storage].db_path, or set MRR_DB_PATH",
            db_path.display()
        )
    })?;
    store.bootstrap()?;

    let today = local_today();
    if cli.demo {
        let mut faker = RevenueFaker::new(DEMO_SEED);
        let seeded =
            store.seed_demo_data(&faker.history(today, DEMO_MONTHS, DEMO_ENTRIES_PER_MONTH))?;
        info!("seeded {seeded} demo entries");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match command {
        Command::Tui => {
            drop(out);
            let mut runtime = DbRuntime::new(&store);
            mrr_tui::run_app(&mut runtime)
        }
        Command::Add(args) => commands::add(&store, &args, today, &mut out),
        Command::List(args) => commands::list(&store, &args, &mut out),
        Command::Edit(args) => commands::edit(&store, &args, &mut out),
        Command::Delete(args) => {
            commands::delete(&store, &args, &mut io::stdin().lock(), &mut out)
        }
        Command::Report(args) => {
            commands::report(&store, &args, config.multiplier(), today, &mut out)
        }
        Command::Forecast(args) => commands::forecast(&store, args.json, today, &mut out),
        Command::Export(args) => commands::export(&store, &args, &mut out),
        Command::Config(config_command) => print_config(&config_command, &config_path),
    }
}

fn print_config(command: &ConfigCommand, config_path: &Path) -> Result<()> {
    match command {
        ConfigCommand::Path => println!("{}", config_path.display()),
        ConfigCommand::Example => print!("{}", Config::example_config(config_path)),
    }
    Ok(())
}

/// `--demo` wins, then `--db`, then the config file and its fallbacks.
fn resolve_db_path(flag: Option<&Path>, demo: bool, config: &Config) -> Result<PathBuf> {
    if demo {
        return Ok(PathBuf::from(":memory:"));
    }
    if let Some(path) = flag {
        mrr_db::validate_db_path(&path.to_string_lossy())?;
        return Ok(path.to_path_buf());
    }
    config.db_path()
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_logger(config: &Config) -> Result<()> {
    let level = config.log_level();
    if level == LevelFilter::Off {
        return Ok(());
    }

    let path = config.log_path()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    WriteLogger::init(level, log_config, file).context("install logger")?;
    info!("mrr starting, logging to {}", path.display());
    Ok(())
}

fn local_today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

#[cfg(test)]
mod tests {
    use super::{Config, resolve_db_path};
    use anyhow::Result;
    use std::path::{Path, PathBuf};

    fn config_with_db(db_path: &str) -> Config {
        let mut config = Config::default();
        config.storage.db_path = Some(db_path.to_owned());
        config
    }

    #[test]
    fn demo_uses_in_memory_database() -> Result<()> {
        let config = config_with_db("/from/config.db");
        let path = resolve_db_path(Some(Path::new("/from/flag.db")), true, &config)?;
        assert_eq!(path, PathBuf::from(":memory:"));
        Ok(())
    }

    #[test]
    fn db_flag_beats_config() -> Result<()> {
        let config = config_with_db("/from/config.db");
        let path = resolve_db_path(Some(Path::new("/from/flag.db")), false, &config)?;
        assert_eq!(path, PathBuf::from("/from/flag.db"));

        let path = resolve_db_path(None, false, &config)?;
        assert_eq!(path, PathBuf::from("/from/config.db"));
        Ok(())
    }

    #[test]
    fn db_flag_is_validated() {
        let error = resolve_db_path(Some(Path::new("file:mrr.db")), false, &Config::default())
            .expect_err("URI flag should fail");
        assert!(error.to_string().contains("file: URI"));
    }
}
