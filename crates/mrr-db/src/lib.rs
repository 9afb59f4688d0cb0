// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use log::debug;
use mrr_app::{
    Entry, EntryId, EntryKind, EntryUpdate, Month, MonthlyReport, NewEntry, Source,
};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

pub const APP_NAME: &str = "mrr";
pub const DB_PATH_ENV: &str = "MRR_DB_PATH";

const ENTRY_COLUMNS: &str = "id, amount, source, type, note, date, created_at";

const ENTRIES_TABLE: &str = "entries";
const REQUIRED_COLUMNS: [&str; 7] = ["id", "amount", "source", "type", "note", "date", "created_at"];
const INDEX_SQL: &str = "
    CREATE INDEX IF NOT EXISTS idx_entries_date ON entries (date);
    CREATE INDEX IF NOT EXISTS idx_entries_source ON entries (source);
";

/// Narrows `list_entries`. Empty filter lists everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub month: Option<Month>,
    pub source: Option<Source>,
    pub kind: Option<EntryKind>,
}

impl EntryFilter {
    pub fn month(month: Month) -> Self {
        Self {
            month: Some(month),
            ..Self::default()
        }
    }
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        let tables = user_tables(&self.conn)?;
        if tables.is_empty() {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
            debug!("created entries schema");
        } else if tables.contains(ENTRIES_TABLE) {
            validate_entry_columns(&self.conn)?;
        } else {
            bail!(
                "database is missing required table `{ENTRIES_TABLE}`; point --db at an mrr database or start a new file"
            );
        }

        self.conn
            .execute_batch(INDEX_SQL)
            .context("create entry indexes")
    }

    /// Inserts `entries` in one transaction when the store is empty.
    /// Returns how many rows were written.
    pub fn seed_demo_data(&self, entries: &[NewEntry]) -> Result<usize> {
        let existing: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))
            .context("count entries before seeding")?;
        if existing > 0 {
            debug!("skip demo seed: store already has {existing} entries");
            return Ok(0);
        }

        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin demo seed transaction")?;
        let now = now_rfc3339()?;
        for entry in entries {
            insert_entry(&tx, entry, &now)?;
        }
        tx.commit().context("commit demo seed")?;
        debug!("seeded {} demo entries", entries.len());
        Ok(entries.len())
    }

    pub fn add_entry(&self, entry: &NewEntry) -> Result<EntryId> {
        let now = now_rfc3339()?;
        let id = insert_entry(&self.conn, entry, &now)?;
        debug!(
            "added entry {id}: {} cents, {}, {}, {}",
            entry.amount_cents,
            entry.source,
            entry.kind,
            format_date(entry.occurred_on)
        );
        Ok(id)
    }

    pub fn get_entry(&self, entry_id: EntryId) -> Result<Entry> {
        self.conn
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?"),
                params![entry_id.get()],
                entry_from_row,
            )
            .optional()
            .with_context(|| format!("load entry {entry_id}"))?
            .ok_or_else(|| {
                anyhow!("entry {entry_id} not found -- run `mrr list` to see valid ids")
            })
    }

    pub fn list_all_entries(&self) -> Result<Vec<Entry>> {
        self.list_entries(&EntryFilter::default())
    }

    /// Newest first: `date DESC, id DESC`.
    pub fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<Entry>> {
        let mut sql = format!("SELECT {ENTRY_COLUMNS} FROM entries");
        let mut clauses = Vec::new();
        let mut values = Vec::new();
        if let Some(month) = filter.month {
            let (start, end) = month_bounds(month)?;
            clauses.push("date >= ? AND date < ?");
            values.push(start);
            values.push(end);
        }
        if let Some(source) = filter.source {
            clauses.push("source = ?");
            values.push(source.as_str().to_owned());
        }
        if let Some(kind) = filter.kind {
            clauses.push("type = ?");
            values.push(kind.as_str().to_owned());
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY date DESC, id DESC");

        let mut stmt = self.conn.prepare(&sql).context("prepare entries query")?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), entry_from_row)
            .context("query entries")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect entries")
    }

    pub fn update_entry(&self, entry_id: EntryId, update: &EntryUpdate) -> Result<()> {
        if update.is_empty() {
            bail!("no fields to update for entry {entry_id} -- pass an amount, source, or note");
        }

        let mut assignments = Vec::new();
        let mut values = Vec::new();
        if let Some(amount_cents) = update.amount_cents {
            assignments.push("amount = ?");
            values.push(Value::Integer(amount_cents));
        }
        if let Some(source) = update.source {
            assignments.push("source = ?");
            values.push(Value::Text(source.as_str().to_owned()));
        }
        if let Some(note) = &update.note {
            assignments.push("note = ?");
            values.push(Value::Text(note.clone()));
        }
        values.push(Value::Integer(entry_id.get()));

        let sql = format!("UPDATE entries SET {} WHERE id = ?", assignments.join(", "));
        let rows_affected = self
            .conn
            .execute(&sql, params_from_iter(values.iter()))
            .with_context(|| format!("update entry {entry_id}"))?;
        if rows_affected == 0 {
            bail!("entry {entry_id} not found -- choose an existing entry and retry");
        }
        debug!("updated entry {entry_id}: {update:?}");
        Ok(())
    }

    pub fn delete_entry(&self, entry_id: EntryId) -> Result<()> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM entries WHERE id = ?", params![entry_id.get()])
            .with_context(|| format!("delete entry {entry_id}"))?;
        if rows_affected == 0 {
            bail!("entry {entry_id} not found -- choose an existing entry and retry");
        }
        debug!("deleted entry {entry_id}");
        Ok(())
    }

    pub fn monthly_report(&self, month: Month) -> Result<MonthlyReport> {
        let entries = self.list_entries(&EntryFilter::month(month))?;
        Ok(MonthlyReport::from_entries(month, &entries))
    }

    /// Summed in Rust so oversized rows clamp instead of failing the query.
    pub fn recurring_total_for_month(&self, month: Month) -> Result<i64> {
        Ok(self.monthly_report(month)?.mrr_cents())
    }

    /// Most recent month holding any entry, if the store is not empty.
    pub fn latest_month(&self) -> Result<Option<Month>> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT MAX(date) FROM entries", [], |row| row.get(0))
            .context("find latest entry date")?;
        raw.as_deref()
            .map(|value| parse_date(value).map(Month::of))
            .transpose()
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os(DB_PATH_ENV) {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set {DB_PATH_ENV} to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("mrr.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

pub fn parse_date(raw: &str) -> Result<Date> {
    if let Ok(value) = Date::parse(raw, &format_description!("[year]-[month]-[day]")) {
        return Ok(value);
    }

    // Older databases stored dates as full timestamps.
    let date_time = parse_datetime(raw)?;
    Ok(date_time.date())
}

pub fn format_date(value: Date) -> String {
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| "1970-01-01".to_owned())
}

fn insert_entry(conn: &Connection, entry: &NewEntry, now: &str) -> Result<EntryId> {
    let note = (!entry.note.is_empty()).then_some(entry.note.as_str());
    conn.execute(
        "
        INSERT INTO entries (amount, source, type, note, date, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ",
        params![
            entry.amount_cents,
            entry.source.as_str(),
            entry.kind.as_str(),
            note,
            format_date(entry.occurred_on),
            now,
        ],
    )
    .context("insert entry")?;
    Ok(EntryId::new(conn.last_insert_rowid()))
}

fn entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Entry> {
    let source_raw: String = row.get(2)?;
    let source = Source::parse(&source_raw)
        .ok_or_else(|| invalid_column(2, format!("unknown source {source_raw}")))?;
    let kind_raw: String = row.get(3)?;
    let kind = EntryKind::parse(&kind_raw)
        .ok_or_else(|| invalid_column(3, format!("unknown entry type {kind_raw}")))?;
    let note: Option<String> = row.get(4)?;
    let date_raw: String = row.get(5)?;
    let created_at_raw: String = row.get(6)?;

    Ok(Entry {
        id: EntryId::new(row.get(0)?),
        amount_cents: row.get(1)?,
        source,
        kind,
        note: note.unwrap_or_default(),
        occurred_on: parse_date(&date_raw).map_err(to_sql_error)?,
        recorded_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
    })
}

fn invalid_column(index: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        index,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
    )
}

fn month_bounds(month: Month) -> Result<(String, String)> {
    let start = Date::from_calendar_date(month.year(), month.month(), 1)
        .with_context(|| format!("first day of {month}"))?;
    let next = month.add_months(1);
    let end = Date::from_calendar_date(next.year(), next.month(), 1)
        .with_context(|| format!("first day of {next}"))?;
    Ok((format_date(start), format_date(end)))
}

fn user_tables(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'")
        .context("prepare table listing")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("list tables")?;
    names
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .context("read table names")
}

fn validate_entry_columns(conn: &Connection) -> Result<()> {
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info(?1)")
        .context("prepare column listing")?;
    let present = stmt
        .query_map([ENTRIES_TABLE], |row| row.get::<_, String>(0))
        .context("list entry columns")?
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .context("read entry columns")?;

    let missing = REQUIRED_COLUMNS
        .into_iter()
        .filter(|column| !present.contains(*column))
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        bail!(
            "table `{ENTRIES_TABLE}` is missing required columns: {}; migrate the database or start a new file",
            missing.join(", ")
        );
    }
    Ok(())
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format current timestamp")
}

fn parse_datetime(raw: &str) -> Result<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(value);
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    ) {
        return Ok(value.assume_utc());
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    bail!("unsupported datetime format {raw:?}")
}

fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    invalid_column(0, error.to_string())
}

#[cfg(test)]
mod tests {
    use super::{month_bounds, parse_date, parse_datetime};
    use anyhow::Result;
    use mrr_app::Month;
    use time::Month as CalendarMonth;

    #[test]
    fn month_bounds_cross_year_boundary() -> Result<()> {
        let (start, end) = month_bounds(Month::parse("2025-12")?)?;
        assert_eq!(start, "2025-12-01");
        assert_eq!(end, "2026-01-01");
        Ok(())
    }

    #[test]
    fn parse_date_accepts_timestamps() -> Result<()> {
        assert_eq!(parse_date("2026-02-19")?.month(), CalendarMonth::February);
        assert_eq!(parse_date("2026-02-19T00:00:00Z")?.day(), 19);
        assert_eq!(parse_date("2026-02-19 08:30:00")?.day(), 19);
        assert!(parse_date("19/02/2026").is_err());
        Ok(())
    }

    #[test]
    fn parse_datetime_accepts_sqlite_current_timestamp() -> Result<()> {
        let value = parse_datetime("2026-02-19 12:34:56")?;
        assert_eq!(value.hour(), 12);
        assert_eq!(value.offset().whole_hours(), 0);
        Ok(())
    }
}
