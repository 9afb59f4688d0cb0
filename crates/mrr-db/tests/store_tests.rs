// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use mrr_app::{EntryId, EntryKind, EntryUpdate, Month, NewEntry, Source};
use mrr_db::{EntryFilter, Store, validate_db_path};
use mrr_testkit::{RevenueFaker, calendar_date, temp_db_path};
use time::Month as CalendarMonth;

fn open_store() -> Result<Store> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    Ok(store)
}

fn entry(cents: i64, source: Source, kind: EntryKind, year: i32, month: u8, day: u8) -> NewEntry {
    let month = CalendarMonth::try_from(month).unwrap_or(CalendarMonth::January);
    NewEntry {
        amount_cents: cents,
        source,
        kind,
        note: String::new(),
        occurred_on: calendar_date(year, month, day),
    }
}

#[test]
fn validate_db_path_rejects_uri_forms() {
    assert!(validate_db_path("file:test.db").is_err());
    assert!(validate_db_path("https://example.com/db.sqlite").is_err());
    assert!(validate_db_path("db.sqlite?mode=ro").is_err());
    assert!(validate_db_path("").is_err());
    assert!(validate_db_path(":memory:").is_ok());
    assert!(validate_db_path("/tmp/mrr.db").is_ok());
}

#[test]
fn bootstrap_is_idempotent_on_disk() -> Result<()> {
    let (_dir, path) = temp_db_path()?;
    {
        let store = Store::open(&path)?;
        store.bootstrap()?;
        store.add_entry(&NewEntry::with_defaults(4_999, calendar_date(2026, CalendarMonth::January, 5)))?;
    }

    let reopened = Store::open(&path)?;
    reopened.bootstrap()?;
    assert_eq!(reopened.list_all_entries()?.len(), 1);
    Ok(())
}

#[test]
fn bootstrap_creates_lookup_indexes() -> Result<()> {
    let store = open_store()?;
    let mut stmt = store.raw_connection().prepare(
        "SELECT name FROM sqlite_master WHERE type = 'index' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    assert_eq!(names, vec!["idx_entries_date", "idx_entries_source"]);
    Ok(())
}

#[test]
fn bootstrap_rejects_schema_missing_required_column() -> Result<()> {
    let store = Store::open_memory()?;
    store.raw_connection().execute_batch(
        "
        CREATE TABLE entries (
          id INTEGER PRIMARY KEY,
          amount INTEGER NOT NULL,
          date TEXT NOT NULL
        );
        ",
    )?;

    let error = store
        .bootstrap()
        .expect_err("bootstrap should reject incompatible schema");
    let message = error.to_string();
    assert!(message.contains("missing required columns"), "{message}");
    assert!(message.contains("source"), "{message}");
    Ok(())
}

#[test]
fn bootstrap_rejects_foreign_database() -> Result<()> {
    let store = Store::open_memory()?;
    store
        .raw_connection()
        .execute_batch("CREATE TABLE projects (id INTEGER PRIMARY KEY);")?;

    let error = store.bootstrap().expect_err("missing entries table");
    assert!(error.to_string().contains("missing required table `entries`"));
    Ok(())
}

#[test]
fn add_and_get_round_trip_fields() -> Result<()> {
    let store = open_store()?;
    let mut new_entry = entry(12_345, Source::Stripe, EntryKind::OneTime, 2026, 3, 14);
    new_entry.note = "Acme - Pro plan".to_owned();

    let id = store.add_entry(&new_entry)?;
    let loaded = store.get_entry(id)?;
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.amount_cents, 12_345);
    assert_eq!(loaded.source, Source::Stripe);
    assert_eq!(loaded.kind, EntryKind::OneTime);
    assert_eq!(loaded.note, "Acme - Pro plan");
    assert_eq!(loaded.occurred_on, new_entry.occurred_on);
    Ok(())
}

#[test]
fn quick_add_defaults_to_manual_recurring_with_empty_note() -> Result<()> {
    let store = open_store()?;
    let id = store.add_entry(&NewEntry::with_defaults(
        4_999,
        calendar_date(2026, CalendarMonth::February, 1),
    ))?;
    let loaded = store.get_entry(id)?;
    assert_eq!(loaded.source, Source::Manual);
    assert_eq!(loaded.kind, EntryKind::Recurring);
    assert!(loaded.note.is_empty());
    Ok(())
}

#[test]
fn list_orders_by_date_then_id_descending() -> Result<()> {
    let store = open_store()?;
    let older = store.add_entry(&entry(100, Source::Manual, EntryKind::Recurring, 2026, 1, 1))?;
    let first_same_day =
        store.add_entry(&entry(200, Source::Manual, EntryKind::Recurring, 2026, 2, 1))?;
    let second_same_day =
        store.add_entry(&entry(300, Source::Manual, EntryKind::Recurring, 2026, 2, 1))?;

    let ids = store
        .list_all_entries()?
        .into_iter()
        .map(|entry| entry.id)
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![second_same_day, first_same_day, older]);
    Ok(())
}

#[test]
fn list_filters_by_month_source_and_kind() -> Result<()> {
    let store = open_store()?;
    store.add_entry(&entry(100, Source::Stripe, EntryKind::Recurring, 2026, 1, 31))?;
    store.add_entry(&entry(200, Source::Stripe, EntryKind::OneTime, 2026, 2, 1))?;
    store.add_entry(&entry(300, Source::Paddle, EntryKind::Recurring, 2026, 2, 28))?;
    store.add_entry(&entry(400, Source::Stripe, EntryKind::Recurring, 2026, 3, 1))?;

    let february = Month::parse("2026-02")?;
    assert_eq!(store.list_entries(&EntryFilter::month(february))?.len(), 2);

    let stripe_recurring = store.list_entries(&EntryFilter {
        source: Some(Source::Stripe),
        kind: Some(EntryKind::Recurring),
        ..EntryFilter::default()
    })?;
    assert_eq!(
        stripe_recurring
            .iter()
            .map(|entry| entry.amount_cents)
            .collect::<Vec<_>>(),
        vec![400, 100]
    );

    let none = store.list_entries(&EntryFilter {
        month: Some(february),
        source: Some(Source::Gumroad),
        kind: None,
    })?;
    assert!(none.is_empty());
    Ok(())
}

#[test]
fn update_changes_only_given_fields() -> Result<()> {
    let store = open_store()?;
    let mut new_entry = entry(1_000, Source::Gumroad, EntryKind::OneTime, 2026, 2, 2);
    new_entry.note = "keep me".to_owned();
    let id = store.add_entry(&new_entry)?;

    store.update_entry(id, &EntryUpdate::amount(2_500))?;
    let loaded = store.get_entry(id)?;
    assert_eq!(loaded.amount_cents, 2_500);
    assert_eq!(loaded.source, Source::Gumroad);
    assert_eq!(loaded.kind, EntryKind::OneTime);
    assert_eq!(loaded.note, "keep me");

    store.update_entry(
        id,
        &EntryUpdate {
            source: Some(Source::Paddle),
            note: Some(String::new()),
            ..EntryUpdate::default()
        },
    )?;
    let loaded = store.get_entry(id)?;
    assert_eq!(loaded.amount_cents, 2_500);
    assert_eq!(loaded.source, Source::Paddle);
    assert!(loaded.note.is_empty());
    Ok(())
}

#[test]
fn update_rejects_unknown_id_and_empty_update() -> Result<()> {
    let store = open_store()?;
    let missing = store
        .update_entry(EntryId::new(99), &EntryUpdate::amount(1))
        .expect_err("unknown id");
    assert!(missing.to_string().contains("entry 99 not found"));

    let id = store.add_entry(&entry(100, Source::Manual, EntryKind::Recurring, 2026, 1, 1))?;
    let empty = store
        .update_entry(id, &EntryUpdate::default())
        .expect_err("empty update");
    assert!(empty.to_string().contains("no fields to update"));
    Ok(())
}

#[test]
fn delete_removes_row_and_ids_are_not_reused() -> Result<()> {
    let store = open_store()?;
    let first = store.add_entry(&entry(100, Source::Manual, EntryKind::Recurring, 2026, 1, 1))?;
    let second = store.add_entry(&entry(200, Source::Manual, EntryKind::Recurring, 2026, 1, 2))?;

    store.delete_entry(second)?;
    assert!(store.get_entry(second).is_err());
    let error = store.delete_entry(second).expect_err("already deleted");
    assert!(error.to_string().contains("not found"));

    let third = store.add_entry(&entry(300, Source::Manual, EntryKind::Recurring, 2026, 1, 3))?;
    assert!(third.get() > second.get());
    assert_eq!(store.list_all_entries()?.len(), 2);
    assert!(store.get_entry(first).is_ok());
    Ok(())
}

#[test]
fn monthly_report_and_recurring_total_agree() -> Result<()> {
    let store = open_store()?;
    store.add_entry(&entry(10_000, Source::Stripe, EntryKind::Recurring, 2026, 2, 3))?;
    store.add_entry(&entry(2_500, Source::Paddle, EntryKind::Recurring, 2026, 2, 10))?;
    store.add_entry(&entry(7_000, Source::Gumroad, EntryKind::OneTime, 2026, 2, 12))?;
    store.add_entry(&entry(9_999, Source::Stripe, EntryKind::Recurring, 2026, 1, 12))?;

    let february = Month::parse("2026-02")?;
    let report = store.monthly_report(february)?;
    assert_eq!(report.entry_count, 3);
    assert_eq!(report.mrr_cents(), 12_500);
    assert_eq!(report.one_time_cents, 7_000);
    assert_eq!(store.recurring_total_for_month(february)?, 12_500);
    assert_eq!(store.recurring_total_for_month(february.previous())?, 9_999);
    assert_eq!(store.recurring_total_for_month(Month::parse("2025-02")?)?, 0);
    assert_eq!(store.latest_month()?, Some(february));
    Ok(())
}

#[test]
fn recurring_total_clamps_oversized_rows() -> Result<()> {
    let store = open_store()?;
    store.add_entry(&entry(i64::MAX, Source::Stripe, EntryKind::Recurring, 2026, 2, 3))?;
    store.add_entry(&entry(i64::MAX, Source::Stripe, EntryKind::Recurring, 2026, 2, 4))?;

    let february = Month::parse("2026-02")?;
    assert_eq!(store.recurring_total_for_month(february)?, i64::MAX);
    assert_eq!(store.monthly_report(february)?.total_cents, i64::MAX);
    Ok(())
}

#[test]
fn seed_demo_data_only_fills_empty_store() -> Result<()> {
    let store = open_store()?;
    assert_eq!(store.latest_month()?, None);

    let mut faker = RevenueFaker::new(11);
    let entries = faker.history(calendar_date(2026, CalendarMonth::March, 1), 3, 4);
    assert_eq!(store.seed_demo_data(&entries)?, 12);
    assert_eq!(store.list_all_entries()?.len(), 12);

    assert_eq!(store.seed_demo_data(&entries)?, 0);
    assert_eq!(store.list_all_entries()?.len(), 12);
    Ok(())
}
