// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::ids::EntryId;

pub const DEFAULT_SOURCE: Source = Source::Manual;
pub const DEFAULT_KIND: EntryKind = EntryKind::Recurring;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    Stripe,
    Gumroad,
    Paddle,
    Manual,
}

impl Source {
    pub const ALL: [Self; 4] = [Self::Stripe, Self::Gumroad, Self::Paddle, Self::Manual];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::Gumroad => "gumroad",
            Self::Paddle => "paddle",
            Self::Manual => "manual",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "stripe" => Some(Self::Stripe),
            "gumroad" => Some(Self::Gumroad),
            "paddle" => Some(Self::Paddle),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }

    pub fn valid_values() -> String {
        Self::ALL.map(Self::as_str).join(", ")
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
    Recurring,
    OneTime,
}

impl EntryKind {
    pub const ALL: [Self; 2] = [Self::Recurring, Self::OneTime];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Recurring => "recurring",
            Self::OneTime => "one-time",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "recurring" => Some(Self::Recurring),
            "one-time" => Some(Self::OneTime),
            _ => None,
        }
    }

    pub fn valid_values() -> String {
        Self::ALL.map(Self::as_str).join(", ")
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One revenue record as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub amount_cents: i64,
    pub source: Source,
    pub kind: EntryKind,
    /// Empty when the entry has no note.
    pub note: String,
    pub occurred_on: Date,
    pub recorded_at: OffsetDateTime,
}

impl Entry {
    pub fn is_recurring(&self) -> bool {
        self.kind == EntryKind::Recurring
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub amount_cents: i64,
    pub source: Source,
    pub kind: EntryKind,
    pub note: String,
    pub occurred_on: Date,
}

impl NewEntry {
    /// Quick-add shape: default source and kind, no note.
    pub fn with_defaults(amount_cents: i64, occurred_on: Date) -> Self {
        Self {
            amount_cents,
            source: DEFAULT_SOURCE,
            kind: DEFAULT_KIND,
            note: String::new(),
            occurred_on,
        }
    }
}

/// Partial update. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntryUpdate {
    pub amount_cents: Option<i64>,
    pub source: Option<Source>,
    pub note: Option<String>,
}

impl EntryUpdate {
    pub fn amount(amount_cents: i64) -> Self {
        Self {
            amount_cents: Some(amount_cents),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.amount_cents.is_none() && self.source.is_none() && self.note.is_none()
    }
}

/// Input mode of the interactive list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    AddInput,
    EditInput,
    DeleteConfirm,
}

impl Mode {
    pub const fn is_input(self) -> bool {
        !matches!(self, Self::Normal)
    }

    pub const fn prompt(self) -> &'static str {
        match self {
            Self::Normal => "",
            Self::AddInput => "Add entry (amount): ",
            Self::EditInput => "Edit amount: ",
            Self::DeleteConfirm => "Delete this entry? (y/n): ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Info,
    Success,
    Error,
}
