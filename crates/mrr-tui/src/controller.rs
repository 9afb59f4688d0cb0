// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::{debug, warn};
use mrr_app::{Entry, EntryUpdate, Mode, NewEntry, StatusTone, parse_amount, sum_cents};
use time::{Date, OffsetDateTime};

use crate::RecordStore;

/// Title, spacer, column header, separator, spacer, footer, status bar.
pub const FIXED_ROWS: u16 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub tone: StatusTone,
}

/// All mutable state of the interactive list.
pub struct Controller {
    entries: Vec<Entry>,
    selected: usize,
    offset: usize,
    mode: Mode,
    input: String,
    status: Option<StatusLine>,
    width: u16,
    height: u16,
    today: fn() -> Date,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    pub fn new() -> Self {
        Self::with_clock(local_today)
    }

    pub fn with_clock(today: fn() -> Date) -> Self {
        Self {
            entries: Vec::new(),
            selected: 0,
            offset: 0,
            mode: Mode::Normal,
            input: String::new(),
            status: None,
            width: 80,
            height: 24,
            today,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// `None` while there is nothing to select.
    pub fn selected(&self) -> Option<usize> {
        (!self.entries.is_empty()).then_some(self.selected)
    }

    pub fn selected_entry(&self) -> Option<&Entry> {
        self.entries.get(self.selected)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn status(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn visible_rows(&self) -> usize {
        usize::from(self.height.saturating_sub(FIXED_ROWS)).max(1)
    }

    /// Sum over every loaded recurring entry, not just the visible window.
    pub fn recurring_total(&self) -> i64 {
        sum_cents(
            self.entries
                .iter()
                .filter(|entry| entry.is_recurring())
                .map(|entry| entry.amount_cents),
        )
    }

    /// Replaces the snapshot. On failure the previous entries stay put.
    pub fn refresh<S: RecordStore>(&mut self, store: &mut S) -> bool {
        match store.list_all() {
            Ok(entries) => {
                self.entries = entries;
                if self.entries.is_empty() {
                    self.selected = 0;
                    self.offset = 0;
                } else if self.selected >= self.entries.len() {
                    self.selected = self.entries.len() - 1;
                }
                self.scroll_to_selection();
                true
            }
            Err(error) => {
                warn!("reload entries failed: {error:#}");
                self.set_status(
                    StatusTone::Error,
                    format!("Error loading entries: {error:#}"),
                );
                false
            }
        }
    }

    pub fn handle_resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.scroll_to_selection();
    }

    pub fn handle_key<S: RecordStore>(&mut self, store: &mut S, key: KeyEvent) -> LoopControl {
        if key.kind == KeyEventKind::Release {
            return LoopControl::Continue;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return LoopControl::Quit;
        }
        if self.mode.is_input() {
            self.handle_input_key(store, key);
            return LoopControl::Continue;
        }
        self.handle_normal_key(store, key)
    }

    fn handle_normal_key<S: RecordStore>(&mut self, store: &mut S, key: KeyEvent) -> LoopControl {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return LoopControl::Quit,
            KeyCode::Char('j') | KeyCode::Down => self.move_down(),
            KeyCode::Char('k') | KeyCode::Up => self.move_up(),
            KeyCode::Char('g') => {
                self.selected = 0;
                self.offset = 0;
            }
            KeyCode::Char('G') => {
                if !self.entries.is_empty() {
                    self.selected = self.entries.len() - 1;
                    self.scroll_to_selection();
                }
            }
            KeyCode::Char('a') => self.enter_mode(Mode::AddInput),
            KeyCode::Char('e') if !self.entries.is_empty() => self.enter_mode(Mode::EditInput),
            KeyCode::Char('d') if !self.entries.is_empty() => {
                self.enter_mode(Mode::DeleteConfirm)
            }
            KeyCode::Char('r') => {
                if self.refresh(store) {
                    self.set_status(StatusTone::Success, "Refreshed");
                }
            }
            _ => {}
        }
        LoopControl::Continue
    }

    fn handle_input_key<S: RecordStore>(&mut self, store: &mut S, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                debug!("cancel {:?}", self.mode);
                self.leave_input_mode();
                self.status = None;
            }
            KeyCode::Enter => self.submit(store),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.input.push(ch);
            }
            _ => {}
        }
    }

    fn enter_mode(&mut self, mode: Mode) {
        debug!("enter {mode:?}");
        self.mode = mode;
        self.input.clear();
        self.status = None;
    }

    fn leave_input_mode(&mut self) -> (Mode, String) {
        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        (mode, std::mem::take(&mut self.input))
    }

    /// Always lands back in `Normal`, whatever the outcome.
    fn submit<S: RecordStore>(&mut self, store: &mut S) {
        let (mode, input) = self.leave_input_mode();
        debug!("submit {mode:?} with {input:?}");
        match mode {
            Mode::AddInput => self.submit_add(store, &input),
            Mode::EditInput => self.submit_edit(store, &input),
            Mode::DeleteConfirm => self.submit_delete(store, &input),
            Mode::Normal => {}
        }
    }

    // The list is left as is after an add; the new row shows up on the
    // next refresh.
    fn submit_add<S: RecordStore>(&mut self, store: &mut S, input: &str) {
        let amount_cents = match parse_amount(input) {
            Ok(amount_cents) => amount_cents,
            Err(error) => {
                self.set_status(StatusTone::Error, format!("Invalid amount: {error}"));
                return;
            }
        };

        let entry = NewEntry::with_defaults(amount_cents, (self.today)());
        match store.insert(&entry) {
            Ok(id) => {
                debug!("inserted entry {id}");
                self.set_status(StatusTone::Success, "Entry added!");
            }
            Err(error) => self.report_store_error("add", &error),
        }
    }

    fn submit_edit<S: RecordStore>(&mut self, store: &mut S, input: &str) {
        let Some(id) = self.selected_entry().map(|entry| entry.id) else {
            return;
        };
        let amount_cents = match parse_amount(input) {
            Ok(amount_cents) => amount_cents,
            Err(error) => {
                self.set_status(StatusTone::Error, format!("Invalid amount: {error}"));
                return;
            }
        };

        match store.update(id, &EntryUpdate::amount(amount_cents)) {
            Ok(()) => {
                self.set_status(StatusTone::Success, "Entry updated!");
                self.refresh(store);
            }
            Err(error) => self.report_store_error("update", &error),
        }
    }

    fn submit_delete<S: RecordStore>(&mut self, store: &mut S, input: &str) {
        let confirmed = input.to_lowercase() == "y";
        let target = self.selected_entry().map(|entry| entry.id);
        let (true, Some(id)) = (confirmed, target) else {
            self.status = None;
            return;
        };

        match store.delete(id) {
            Ok(()) => {
                self.set_status(StatusTone::Success, "Entry deleted!");
                self.selected = self.selected.saturating_sub(1);
                self.refresh(store);
            }
            Err(error) => self.report_store_error("delete", &error),
        }
    }

    fn report_store_error(&mut self, action: &str, error: &anyhow::Error) {
        warn!("{action} failed: {error:#}");
        self.set_status(StatusTone::Error, format!("Error: {error:#}"));
    }

    fn set_status(&mut self, tone: StatusTone, text: impl Into<String>) {
        self.status = Some(StatusLine {
            text: text.into(),
            tone,
        });
    }

    fn move_down(&mut self) {
        if self.selected + 1 < self.entries.len() {
            self.selected += 1;
            self.scroll_to_selection();
        }
    }

    fn move_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_to_selection();
        }
    }

    fn scroll_to_selection(&mut self) {
        let visible = self.visible_rows();
        if self.selected < self.offset {
            self.offset = self.selected;
        }
        if self.selected >= self.offset + visible {
            self.offset = self.selected + 1 - visible;
        }
    }
}

fn local_today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}
