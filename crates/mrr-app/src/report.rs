// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::collections::BTreeMap;
use time::Date;

use crate::model::{Entry, EntryKind, Source};

pub const DEFAULT_VALUATION_MULTIPLIER: f64 = 3.0;

const PROJECTION_HORIZONS: [u32; 3] = [3, 6, 12];
const PROJECTION_CAP_CENTS: i64 = 100_000_000_000;
const MILESTONE_TARGETS_CENTS: [i64; 5] = [
    100_000,
    500_000,
    1_000_000,
    5_000_000,
    10_000_000,
];
const MILESTONE_HORIZON_MONTHS: u32 = 120;

/// A calendar month, formatted `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: time::Month,
}

impl Month {
    pub fn new(year: i32, month: time::Month) -> Self {
        Self { year, month }
    }

    pub fn of(date: Date) -> Self {
        Self::new(date.year(), date.month())
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let Some((year_raw, month_raw)) = raw.trim().split_once('-') else {
            bail!("invalid month {raw:?}; use YYYY-MM (for example 2026-01)");
        };
        if year_raw.len() != 4 || month_raw.len() != 2 {
            bail!("invalid month {raw:?}; use YYYY-MM (for example 2026-01)");
        }
        let year: i32 = year_raw
            .parse()
            .with_context(|| format!("invalid year in month {raw:?}"))?;
        let number: u8 = month_raw
            .parse()
            .with_context(|| format!("invalid month number in {raw:?}"))?;
        let month = time::Month::try_from(number)
            .with_context(|| format!("month {raw:?} must be between 01 and 12"))?;
        Ok(Self::new(year, month))
    }

    pub const fn year(self) -> i32 {
        self.year
    }

    pub const fn month(self) -> time::Month {
        self.month
    }

    pub fn previous(self) -> Self {
        self.add_months(-1)
    }

    pub fn add_months(self, months: i32) -> Self {
        let zero_based = self.year * 12 + i32::from(self.month as u8) - 1 + months;
        let year = zero_based.div_euclid(12);
        let number = (zero_based.rem_euclid(12) + 1) as u8;
        // rem_euclid(12) + 1 is always a valid month number
        let month = time::Month::try_from(number).unwrap_or(time::Month::January);
        Self::new(year, month)
    }

    pub fn contains(self, date: Date) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// `January 2026`
    pub fn long_label(self) -> String {
        format!("{} {}", self.month, self.year)
    }

    /// `Jan 2026`
    pub fn short_label(self) -> String {
        let name = self.month.to_string();
        format!("{} {}", &name[..3], self.year)
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month as u8)
    }
}

impl Serialize for Month {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyReport {
    pub month: Month,
    pub total_cents: i64,
    pub recurring_cents: i64,
    pub one_time_cents: i64,
    pub by_source: BTreeMap<Source, i64>,
    pub entry_count: usize,
}

impl MonthlyReport {
    /// Aggregates the entries that fall inside `month`; others are ignored.
    pub fn from_entries<'a>(month: Month, entries: impl IntoIterator<Item = &'a Entry>) -> Self {
        let mut report = Self {
            month,
            total_cents: 0,
            recurring_cents: 0,
            one_time_cents: 0,
            by_source: BTreeMap::new(),
            entry_count: 0,
        };
        for entry in entries {
            if !month.contains(entry.occurred_on) {
                continue;
            }
            let amount = entry.amount_cents;
            report.entry_count += 1;
            report.total_cents = report.total_cents.saturating_add(amount);
            let bucket = match entry.kind {
                EntryKind::Recurring => &mut report.recurring_cents,
                EntryKind::OneTime => &mut report.one_time_cents,
            };
            *bucket = bucket.saturating_add(amount);
            let by_source = report.by_source.entry(entry.source).or_insert(0);
            *by_source = by_source.saturating_add(amount);
        }
        report
    }

    pub fn mrr_cents(&self) -> i64 {
        self.recurring_cents
    }

    pub fn arr_cents(&self) -> i64 {
        self.recurring_cents.saturating_mul(12)
    }

    pub fn valuation_cents(&self, multiplier: f64) -> i64 {
        (self.arr_cents() as f64 * multiplier).round() as i64
    }

    /// Month-over-month MRR growth in percent; `None` without a positive baseline.
    pub fn growth_rate(&self, previous_mrr_cents: i64) -> Option<f64> {
        if previous_mrr_cents <= 0 {
            return None;
        }
        Some(percent_change(self.recurring_cents, previous_mrr_cents))
    }

    pub fn source_share(&self, source: Source) -> f64 {
        if self.total_cents <= 0 {
            return 0.0;
        }
        let amount = self.by_source.get(&source).copied().unwrap_or(0);
        amount as f64 / self.total_cents as f64 * 100.0
    }

    /// Sources ordered by amount, largest first.
    pub fn sources_by_amount(&self) -> Vec<(Source, i64)> {
        let mut sources = self
            .by_source
            .iter()
            .map(|(source, amount)| (*source, *amount))
            .collect::<Vec<_>>();
        sources.sort_by(|left, right| right.1.cmp(&left.1).then(left.0.cmp(&right.0)));
        sources
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub months: u32,
    pub mrr_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Milestone {
    pub target_cents: i64,
    pub months_away: u32,
    pub estimated: Month,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub based_on: Month,
    pub current_mrr_cents: i64,
    pub growth_rate: f64,
    pub projections: Vec<Projection>,
    pub milestones: Vec<Milestone>,
}

impl Forecast {
    /// Compounds the latest month-over-month growth forward.
    pub fn project(based_on: Month, current_mrr_cents: i64, previous_mrr_cents: i64) -> Self {
        let growth_rate = if previous_mrr_cents > 0 {
            percent_change(current_mrr_cents, previous_mrr_cents)
        } else {
            0.0
        };
        let factor = 1.0 + growth_rate / 100.0;

        let projections = PROJECTION_HORIZONS
            .iter()
            .map(|months| Projection {
                months: *months,
                mrr_cents: cap_projection(current_mrr_cents as f64 * factor.powi(*months as i32)),
            })
            .collect();

        let mut milestones = Vec::new();
        if growth_rate > 0.0 && current_mrr_cents > 0 {
            for target in MILESTONE_TARGETS_CENTS {
                if current_mrr_cents >= target {
                    continue;
                }
                let months = ((target as f64 / current_mrr_cents as f64).ln() / factor.ln()).ceil();
                if !months.is_finite() || months < 0.0 || months > f64::from(MILESTONE_HORIZON_MONTHS)
                {
                    continue;
                }
                let months_away = months as u32;
                milestones.push(Milestone {
                    target_cents: target,
                    months_away,
                    estimated: based_on.add_months(months_away as i32),
                });
            }
        }

        Self {
            based_on,
            current_mrr_cents,
            growth_rate,
            projections,
            milestones,
        }
    }

    pub fn has_growth(&self) -> bool {
        self.growth_rate != 0.0
    }

    /// Current MRR is at or past the largest milestone target.
    pub fn all_milestones_reached(&self) -> bool {
        MILESTONE_TARGETS_CENTS
            .iter()
            .all(|target| self.current_mrr_cents >= *target)
    }
}

// Differences are taken in f64 so extreme amounts cannot overflow.
fn percent_change(current: i64, previous: i64) -> f64 {
    (current as f64 - previous as f64) / previous as f64 * 100.0
}

fn cap_projection(cents: f64) -> i64 {
    if !cents.is_finite() || cents > PROJECTION_CAP_CENTS as f64 {
        return PROJECTION_CAP_CENTS;
    }
    cents.round() as i64
}
