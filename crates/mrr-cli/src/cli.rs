// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use clap::{Args, Parser, Subcommand};
use mrr_app::{EntryId, EntryKind, Month, Source, parse_amount};
use std::path::PathBuf;
use time::Date;

#[derive(Debug, Parser)]
#[command(name = "mrr", version, about = "Track monthly recurring revenue from the terminal")]
pub struct Cli {
    /// Use a specific config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Use a specific database file, overriding config and MRR_DB_PATH
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Run against an in-memory database seeded with demo data
    #[arg(long, global = true)]
    pub demo: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open the interactive entry list (default)
    Tui,
    /// Record a revenue entry
    Add(AddArgs),
    /// List entries, newest first
    List(ListArgs),
    /// Change fields of an existing entry
    Edit(EditArgs),
    /// Remove an entry
    Delete(DeleteArgs),
    /// Summarize one month: MRR, ARR, growth and valuation
    Report(ReportArgs),
    /// Project MRR forward from the latest month-over-month growth
    Forecast(ForecastArgs),
    /// Write entries as CSV or JSON
    Export(ExportArgs),
    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Amount in dollars, for example 49.99
    #[arg(value_parser = amount_arg, allow_hyphen_values = true)]
    pub amount: i64,

    #[arg(short, long, value_parser = source_arg, default_value = "manual")]
    pub source: Source,

    #[arg(short = 't', long = "type", value_parser = kind_arg, default_value = "recurring")]
    pub kind: EntryKind,

    #[arg(short, long, default_value = "")]
    pub note: String,

    /// Date of the payment as YYYY-MM-DD (defaults to today)
    #[arg(short, long, value_parser = date_arg)]
    pub date: Option<Date>,
}

#[derive(Debug, Default, Args)]
pub struct ListArgs {
    /// Only entries in this month (YYYY-MM)
    #[arg(short, long, value_parser = month_arg)]
    pub month: Option<Month>,

    #[arg(short, long, value_parser = source_arg)]
    pub source: Option<Source>,

    #[arg(short = 't', long = "type", value_parser = kind_arg)]
    pub kind: Option<EntryKind>,

    #[arg(short, long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    #[arg(value_parser = id_arg)]
    pub id: EntryId,

    #[arg(short, long, value_parser = amount_arg, allow_hyphen_values = true)]
    pub amount: Option<i64>,

    #[arg(short, long, value_parser = source_arg)]
    pub source: Option<Source>,

    /// New note; pass "" to clear it
    #[arg(short, long)]
    pub note: Option<String>,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    #[arg(value_parser = id_arg)]
    pub id: EntryId,

    /// Skip confirmation
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Debug, Default, Args)]
pub struct ReportArgs {
    /// Month to report (YYYY-MM, defaults to the current month)
    #[arg(short, long, value_parser = month_arg)]
    pub month: Option<Month>,

    /// ARR multiple for valuation (defaults to [report].multiplier)
    #[arg(long)]
    pub multiplier: Option<f64>,

    #[arg(short, long)]
    pub json: bool,

    /// Print only the MRR number
    #[arg(short, long, conflicts_with = "json")]
    pub quiet: bool,
}

#[derive(Debug, Default, Args)]
pub struct ForecastArgs {
    #[arg(short, long)]
    pub json: bool,
}

#[derive(Debug, Default, Args)]
pub struct ExportArgs {
    /// Only entries in this month (YYYY-MM)
    #[arg(short, long, value_parser = month_arg)]
    pub month: Option<Month>,

    /// Write to this file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Emit a JSON array instead of CSV
    #[arg(short, long)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the resolved config file path
    Path,
    /// Print a config template
    Example,
}

fn amount_arg(raw: &str) -> Result<i64, String> {
    parse_amount(raw).map_err(|error| format!("invalid amount {raw:?}: {error}"))
}

fn source_arg(raw: &str) -> Result<Source, String> {
    Source::parse(raw)
        .ok_or_else(|| format!("invalid source {raw:?} (valid: {})", Source::valid_values()))
}

fn kind_arg(raw: &str) -> Result<EntryKind, String> {
    EntryKind::parse(raw)
        .ok_or_else(|| format!("invalid type {raw:?} (valid: {})", EntryKind::valid_values()))
}

fn month_arg(raw: &str) -> Result<Month, String> {
    Month::parse(raw).map_err(|error| error.to_string())
}

fn date_arg(raw: &str) -> Result<Date, String> {
    Date::parse(raw, &time::macros::format_description!("[year]-[month]-[day]"))
        .map_err(|_| format!("invalid date format: {raw} (use YYYY-MM-DD)"))
}

fn id_arg(raw: &str) -> Result<EntryId, String> {
    raw.parse::<i64>()
        .map(EntryId::new)
        .map_err(|_| format!("invalid ID: {raw}"))
}
