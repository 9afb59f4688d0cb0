// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use log::debug;
use mrr_app::{
    Entry, EntryKind, EntryUpdate, Forecast, Month, MonthlyReport, NewEntry, Source, format_cents,
    sum_cents,
};
use mrr_db::{EntryFilter, Store, format_date};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, Write};
use time::Date;
use time::format_description::well_known::Rfc3339;

use crate::cli::{AddArgs, DeleteArgs, EditArgs, ExportArgs, ListArgs, ReportArgs};

const LIST_NOTE_WIDTH: usize = 30;

pub fn add(store: &Store, args: &AddArgs, today: Date, out: &mut impl Write) -> Result<()> {
    let entry = NewEntry {
        amount_cents: args.amount,
        source: args.source,
        kind: args.kind,
        note: args.note.clone(),
        occurred_on: args.date.unwrap_or(today),
    };
    let id = store.add_entry(&entry)?;
    writeln!(
        out,
        "✓ Added entry #{id}: {} from {} ({})",
        format_cents(entry.amount_cents),
        entry.source,
        entry.kind
    )?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct ListedEntry {
    id: i64,
    date: String,
    amount_cents: i64,
    amount: String,
    source: Source,
    #[serde(rename = "type")]
    kind: EntryKind,
    #[serde(skip_serializing_if = "String::is_empty")]
    note: String,
    created_at: String,
}

impl ListedEntry {
    fn from_entry(entry: &Entry) -> Self {
        Self {
            id: entry.id.get(),
            date: format_date(entry.occurred_on),
            amount_cents: entry.amount_cents,
            amount: format_cents(entry.amount_cents),
            source: entry.source,
            kind: entry.kind,
            note: entry.note.clone(),
            created_at: entry.recorded_at.format(&Rfc3339).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ListOutput {
    entries: Vec<ListedEntry>,
    total_cents: i64,
    count: usize,
}

pub fn list(store: &Store, args: &ListArgs, out: &mut impl Write) -> Result<()> {
    let filter = EntryFilter {
        month: args.month,
        source: args.source,
        kind: args.kind,
    };
    let entries = store.list_entries(&filter)?;
    let total_cents = sum_cents(entries.iter().map(|entry| entry.amount_cents));

    if args.json {
        let output = ListOutput {
            entries: entries.iter().map(ListedEntry::from_entry).collect(),
            total_cents,
            count: entries.len(),
        };
        return write_json(out, &output);
    }

    if entries.is_empty() {
        writeln!(out, "⚠ No entries found.")?;
        return Ok(());
    }

    writeln!(
        out,
        "{:<6}  {:<10}  {:>12}  {:<8}  {:<9}  NOTE",
        "ID", "DATE", "AMOUNT", "SOURCE", "TYPE"
    )?;
    for entry in &entries {
        let line = format!(
            "{:<6}  {:<10}  {:>12}  {:<8}  {:<9}  {}",
            entry.id.get(),
            format_date(entry.occurred_on),
            format_cents(entry.amount_cents),
            entry.source.as_str(),
            entry.kind.as_str(),
            mrr_tui::truncate_note(&entry.note, LIST_NOTE_WIDTH),
        );
        writeln!(out, "{}", line.trim_end())?;
    }
    writeln!(
        out,
        "\n{} entries, total: {}",
        entries.len(),
        format_cents(total_cents)
    )?;
    Ok(())
}

pub fn edit(store: &Store, args: &EditArgs, out: &mut impl Write) -> Result<()> {
    let update = EntryUpdate {
        amount_cents: args.amount,
        source: args.source,
        note: args.note.clone(),
    };
    if update.is_empty() {
        bail!("no fields to update (use --amount, --source, or --note)");
    }
    store.update_entry(args.id, &update)?;
    writeln!(out, "✓ Updated entry #{}", args.id)?;
    Ok(())
}

/// Asks for confirmation on `input` unless `--force` was given.
pub fn delete(
    store: &Store,
    args: &DeleteArgs,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    let entry = store.get_entry(args.id)?;

    if !args.force {
        write!(
            out,
            "⚠ Delete entry #{}: {} from {} on {}? [y/N] ",
            entry.id,
            format_cents(entry.amount_cents),
            entry.source,
            format_date(entry.occurred_on)
        )?;
        out.flush()?;

        let mut answer = String::new();
        input
            .read_line(&mut answer)
            .context("read delete confirmation")?;
        let answer = answer.trim().to_lowercase();
        if answer != "y" && answer != "yes" {
            debug!("delete of entry {} cancelled", entry.id);
            writeln!(out, "Cancelled.")?;
            return Ok(());
        }
    }

    store.delete_entry(entry.id)?;
    writeln!(out, "✓ Deleted entry #{}", entry.id)?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct ReportOutput {
    month: Month,
    mrr_cents: i64,
    arr_cents: i64,
    one_time_cents: i64,
    total_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    growth_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prev_mrr_cents: Option<i64>,
    valuation_cents: i64,
    multiplier: f64,
    by_source: BTreeMap<Source, i64>,
    by_source_percent: BTreeMap<Source, f64>,
    entry_count: usize,
}

pub fn report(
    store: &Store,
    args: &ReportArgs,
    default_multiplier: f64,
    today: Date,
    out: &mut impl Write,
) -> Result<()> {
    let multiplier = args.multiplier.unwrap_or(default_multiplier);
    if !multiplier.is_finite() || multiplier <= 0.0 {
        bail!("--multiplier must be positive, got {multiplier}");
    }

    let month = args.month.unwrap_or_else(|| Month::of(today));
    let report = store.monthly_report(month)?;

    if args.quiet {
        writeln!(out, "{}", plain_amount(report.mrr_cents()))?;
        return Ok(());
    }

    let previous_mrr = store.recurring_total_for_month(month.previous())?;
    let growth_rate = report.growth_rate(previous_mrr);

    if args.json {
        let output = ReportOutput {
            month,
            mrr_cents: report.mrr_cents(),
            arr_cents: report.arr_cents(),
            one_time_cents: report.one_time_cents,
            total_cents: report.total_cents,
            growth_rate,
            prev_mrr_cents: growth_rate.map(|_| previous_mrr),
            valuation_cents: report.valuation_cents(multiplier),
            multiplier,
            by_source: report.by_source.clone(),
            by_source_percent: report
                .by_source
                .keys()
                .map(|source| (*source, report.source_share(*source)))
                .collect(),
            entry_count: report.entry_count,
        };
        return write_json(out, &output);
    }

    let latest = store.latest_month()?;
    write_report(out, &report, growth_rate, multiplier, latest)
}

fn write_report(
    out: &mut impl Write,
    report: &MonthlyReport,
    growth_rate: Option<f64>,
    multiplier: f64,
    latest: Option<Month>,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "  Monthly Report: {}", report.month.long_label())?;
    writeln!(out, "  {}", "─".repeat(35))?;
    writeln!(out)?;

    if report.entry_count == 0 {
        writeln!(out, "  ⚠ No entries for this month.")?;
        if let Some(latest) = latest.filter(|latest| *latest != report.month) {
            writeln!(
                out,
                "  Latest data is in {latest}; run `mrr report --month {latest}`."
            )?;
        }
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "  MRR:        {}", format_cents(report.mrr_cents()))?;
    writeln!(out, "  ARR:        {}", format_cents(report.arr_cents()))?;
    if let Some(rate) = growth_rate {
        writeln!(out, "  Growth:     {rate:+.1}% vs last month")?;
    }
    writeln!(
        out,
        "  Valuation:  {} (at {multiplier}x ARR)",
        format_cents(report.valuation_cents(multiplier))
    )?;
    writeln!(out)?;

    if report.one_time_cents != 0 {
        writeln!(out, "  One-time:   {}", format_cents(report.one_time_cents))?;
        writeln!(out)?;
    }

    if !report.by_source.is_empty() {
        writeln!(out, "  By Source:")?;
        for (source, amount) in report.sources_by_amount() {
            let label = format!("{source}:");
            writeln!(
                out,
                "    {label:<9} {:>12}  ({:.1}%)",
                format_cents(amount),
                report.source_share(source)
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Projects from the current calendar month and the one before it.
pub fn forecast(store: &Store, json: bool, today: Date, out: &mut impl Write) -> Result<()> {
    let month = Month::of(today);
    let current = store.recurring_total_for_month(month)?;
    let previous = store.recurring_total_for_month(month.previous())?;
    let forecast = Forecast::project(month, current, previous);

    if json {
        return write_json(out, &forecast);
    }
    write_forecast(out, &forecast)
}

fn write_forecast(out: &mut impl Write, forecast: &Forecast) -> Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "  MRR Forecast (based on {:.1}% monthly growth)",
        forecast.growth_rate
    )?;
    writeln!(out, "  {}", "─".repeat(44))?;
    writeln!(out)?;
    writeln!(
        out,
        "  Current:      {}",
        format_cents(forecast.current_mrr_cents)
    )?;

    if !forecast.has_growth() {
        writeln!(out)?;
        writeln!(out, "  ⚠ No growth data available for projections.")?;
        writeln!(out, "  Add entries across multiple months to see forecasts.")?;
        writeln!(out)?;
        return Ok(());
    }

    for projection in &forecast.projections {
        let label = format!("In {} months:", projection.months);
        writeln!(out, "  {label:<13} {}", format_cents(projection.mrr_cents))?;
    }
    writeln!(out)?;

    if !forecast.milestones.is_empty() {
        writeln!(out, "  Milestones:")?;
        for milestone in &forecast.milestones {
            writeln!(
                out,
                "    {} MRR: ~{} months ({})",
                format_cents(milestone.target_cents),
                milestone.months_away,
                milestone.estimated.short_label()
            )?;
        }
    } else if forecast.all_milestones_reached() {
        writeln!(out, "  ✓ All milestones reached!")?;
    } else {
        writeln!(
            out,
            "  ⚠ Add data across multiple months to see milestone projections."
        )?;
    }
    writeln!(out)?;
    Ok(())
}

const EXPORT_HEADER: [&str; 5] = ["date", "amount", "source", "type", "note"];

#[derive(Debug, Serialize)]
struct ExportRecord {
    date: String,
    amount: String,
    source: Source,
    #[serde(rename = "type")]
    kind: EntryKind,
    note: String,
}

impl ExportRecord {
    fn from_entry(entry: &Entry) -> Self {
        Self {
            date: format_date(entry.occurred_on),
            amount: plain_amount(entry.amount_cents),
            source: entry.source,
            kind: entry.kind,
            note: entry.note.clone(),
        }
    }
}

/// Writes to `--output` when given, otherwise to `out`.
pub fn export(store: &Store, args: &ExportArgs, out: &mut impl Write) -> Result<()> {
    let entries = store.list_entries(&EntryFilter {
        month: args.month,
        ..EntryFilter::default()
    })?;
    let records = entries.iter().map(ExportRecord::from_entry).collect::<Vec<_>>();

    let Some(path) = &args.output else {
        return write_export(out, &records, args.json);
    };
    let mut file =
        File::create(path).with_context(|| format!("create export file {}", path.display()))?;
    write_export(&mut file, &records, args.json)?;
    debug!("exported {} entries to {}", records.len(), path.display());
    writeln!(
        out,
        "✓ Exported {} entries to {}",
        records.len(),
        path.display()
    )?;
    Ok(())
}

fn write_export(sink: &mut impl Write, records: &[ExportRecord], json: bool) -> Result<()> {
    if json {
        return write_json(sink, &records);
    }
    // The header is written by hand so an empty export still has one.
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(sink);
    writer.write_record(EXPORT_HEADER)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush().context("flush CSV output")?;
    Ok(())
}

fn write_json(out: &mut impl Write, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("encode JSON output")?;
    writeln!(out)?;
    Ok(())
}

/// `1234.50`, no currency symbol or grouping.
fn plain_amount(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let absolute = cents.unsigned_abs();
    format!("{sign}{}.{:02}", absolute / 100, absolute % 100)
}
