// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use mrr_app::{Entry, EntryId, EntryUpdate, NewEntry};
use mrr_db::Store;

/// Backs the interactive list with the SQLite store.
pub struct DbRuntime<'a> {
    store: &'a Store,
}

impl<'a> DbRuntime<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }
}

impl mrr_tui::RecordStore for DbRuntime<'_> {
    fn list_all(&mut self) -> Result<Vec<Entry>> {
        self.store.list_all_entries()
    }

    fn insert(&mut self, entry: &NewEntry) -> Result<EntryId> {
        self.store.add_entry(entry)
    }

    fn update(&mut self, id: EntryId, update: &EntryUpdate) -> Result<()> {
        self.store.update_entry(id, update)
    }

    fn delete(&mut self, id: EntryId) -> Result<()> {
        self.store.delete_entry(id)
    }
}
