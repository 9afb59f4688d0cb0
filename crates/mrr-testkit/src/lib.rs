// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use mrr_app::{EntryKind, NewEntry, Source};
use std::path::PathBuf;
use time::{Date, Duration, Month};

const NOTE_PRODUCTS: [&str; 10] = [
    "Pro plan",
    "Team plan",
    "Starter plan",
    "Annual upgrade",
    "Course bundle",
    "Template pack",
    "Consulting call",
    "Sponsorship",
    "Lifetime deal",
    "Add-on seats",
];

const NOTE_CUSTOMERS: [&str; 12] = [
    "Acme", "Globex", "Initech", "Umbrella", "Hooli", "Vandelay", "Wonka", "Stark", "Wayne",
    "Tyrell", "Soylent", "Cyberdyne",
];

const REFERENCE_YEAR: i32 = 2026;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator of plausible revenue entries.
#[derive(Debug, Clone)]
pub struct RevenueFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl RevenueFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn source(&mut self) -> Source {
        Source::ALL[self.rng.int_n(Source::ALL.len())]
    }

    /// Mostly recurring, roughly one in four one-time.
    pub fn kind(&mut self) -> EntryKind {
        if self.rng.int_n(4) == 0 {
            EntryKind::OneTime
        } else {
            EntryKind::Recurring
        }
    }

    /// Whole dollars between $5 and $500, sometimes with cents.
    pub fn amount_cents(&mut self) -> i64 {
        let dollars = self.int_range_i64(5, 500);
        let cents = if self.rng.bool() {
            self.int_range_i64(0, 99)
        } else {
            0
        };
        dollars * 100 + cents
    }

    pub fn note(&mut self) -> String {
        if self.rng.int_n(3) == 0 {
            return String::new();
        }
        format!(
            "{} - {}",
            NOTE_CUSTOMERS[self.rng.int_n(NOTE_CUSTOMERS.len())],
            NOTE_PRODUCTS[self.rng.int_n(NOTE_PRODUCTS.len())],
        )
    }

    pub fn date_in_month(&mut self, year: i32, month: Month) -> Date {
        let first = calendar_date(year, month, 1);
        let days = i64::from(month.length(year));
        first + Duration::days(self.int_range_i64(0, days - 1))
    }

    pub fn entry(&mut self) -> NewEntry {
        let month = Month::try_from((self.rng.int_n(12) + 1) as u8).unwrap_or(Month::January);
        self.entry_in_month(REFERENCE_YEAR, month)
    }

    pub fn entry_in_month(&mut self, year: i32, month: Month) -> NewEntry {
        NewEntry {
            amount_cents: self.amount_cents(),
            source: self.source(),
            kind: self.kind(),
            note: self.note(),
            occurred_on: self.date_in_month(year, month),
        }
    }

    /// `count` entries per month for `months` consecutive months ending at
    /// `end`, with the recurring base growing month over month.
    pub fn history(&mut self, end: Date, months: u32, count: usize) -> Vec<NewEntry> {
        let mut entries = Vec::with_capacity(months as usize * count);
        let mut year = end.year();
        let mut month = end.month();
        for _ in 1..months {
            if month == Month::January {
                year -= 1;
            }
            month = month.previous();
        }
        for step in 0..months {
            for _ in 0..count {
                let mut entry = self.entry_in_month(year, month);
                entry.amount_cents += i64::from(step) * 1_000;
                entries.push(entry);
            }
            if month == Month::December {
                year += 1;
            }
            month = month.next();
        }
        entries
    }

    fn int_range_i64(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("mrr.db");
    Ok((dir, db_path))
}

pub fn fixture_date() -> Date {
    calendar_date(REFERENCE_YEAR, Month::February, 19)
}

pub fn calendar_date(year: i32, month: Month, day: u8) -> Date {
    Date::from_calendar_date(year, month, day).unwrap_or(Date::MIN)
}

#[cfg(test)]
mod tests {
    use super::{RevenueFaker, fixture_date};
    use mrr_app::EntryKind;
    use std::collections::BTreeSet;
    use time::Month;

    #[test]
    fn new_deterministic_seed() {
        let mut left = RevenueFaker::new(42);
        let mut right = RevenueFaker::new(42);
        assert_eq!(left.entry(), right.entry());
        assert_eq!(left.entry(), right.entry());
    }

    #[test]
    fn zero_seed_is_normalized() {
        assert_eq!(RevenueFaker::new(0).seed(), 1);
    }

    #[test]
    fn amounts_stay_in_range() {
        let mut faker = RevenueFaker::new(7);
        for _ in 0..200 {
            let cents = faker.amount_cents();
            assert!((500..=50_099).contains(&cents), "got {cents}");
        }
    }

    #[test]
    fn dates_stay_inside_the_month() {
        let mut faker = RevenueFaker::new(3);
        for _ in 0..100 {
            let date = faker.date_in_month(2024, Month::February);
            assert_eq!(date.month(), Month::February);
            assert_eq!(date.year(), 2024);
        }
    }

    #[test]
    fn history_spans_consecutive_months() {
        let mut faker = RevenueFaker::new(9);
        let end = fixture_date();
        let entries = faker.history(end, 4, 2);
        assert_eq!(entries.len(), 8);

        let months = entries
            .iter()
            .map(|entry| (entry.occurred_on.year(), entry.occurred_on.month() as u8))
            .collect::<BTreeSet<_>>();
        assert_eq!(
            months.into_iter().collect::<Vec<_>>(),
            vec![(2025, 11), (2025, 12), (2026, 1), (2026, 2)]
        );
    }

    #[test]
    fn variety_across_seeds() {
        let mut kinds = BTreeSet::new();
        let mut amounts = BTreeSet::new();
        for seed in 0_u64..40_u64 {
            let mut faker = RevenueFaker::new(seed);
            let entry = faker.entry();
            kinds.insert(entry.kind == EntryKind::Recurring);
            amounts.insert(entry.amount_cents);
        }
        assert_eq!(kinds.len(), 2);
        assert!(amounts.len() >= 20, "got {}", amounts.len());
    }

    #[test]
    fn int_n() {
        let mut faker = RevenueFaker::new(42);
        for _ in 0..100 {
            assert!(faker.int_n(5) < 5);
        }
    }
}
