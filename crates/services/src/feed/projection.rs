//! Derived views over the loaded feed window.
//!
//! Every function here sees only the records currently held in memory. A
//! recipient with hundreds of unread notifications and a 20-record page gets
//! `today`, `urgent` and the rest computed over those 20 until more pages
//! are loaded. Nothing in this module talks to the gateway.

use chrono::{DateTime, Duration, TimeZone, Utc};
use clinicflow_models::{Category, NotificationRecord};
use serde::Serialize;

use super::state::Period;

pub fn unread(records: &[NotificationRecord]) -> Vec<&NotificationRecord> {
    records.iter().filter(|r| !r.is_read).collect()
}

/// Urgent records; `unread_only` additionally drops ones already read.
pub fn urgent(records: &[NotificationRecord], unread_only: bool) -> Vec<&NotificationRecord> {
    records
        .iter()
        .filter(|r| r.is_urgent() && (!unread_only || !r.is_read))
        .collect()
}

/// Records created on the calendar date of `now`, in `now`'s time zone.
pub fn today<'a, Tz: TimeZone>(
    records: &'a [NotificationRecord],
    now: &DateTime<Tz>,
) -> Vec<&'a NotificationRecord> {
    let date = now.date_naive();
    let tz = now.timezone();
    records
        .iter()
        .filter(|r| r.created_at.with_timezone(&tz).date_naive() == date)
        .collect()
}

pub fn by_category(records: &[NotificationRecord], category: Category) -> Vec<&NotificationRecord> {
    records
        .iter()
        .filter(|r| r.kind.category() == category)
        .collect()
}

pub fn within_period<'a, Tz: TimeZone>(
    records: &'a [NotificationRecord],
    period: Period,
    now: &DateTime<Tz>,
) -> Vec<&'a NotificationRecord> {
    let cutoff = match period {
        Period::All => return records.iter().collect(),
        Period::Today => return today(records, now),
        Period::Week => now.with_timezone(&Utc) - Duration::days(7),
        Period::Month => now.with_timezone(&Utc) - Duration::days(30),
    };
    records.iter().filter(|r| r.created_at >= cutoff).collect()
}

/// Counts of every projection, for badges and tab labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectionSummary {
    pub unread: usize,
    pub urgent: usize,
    pub urgent_unread: usize,
    pub today: usize,
    pub by_category: Vec<(Category, usize)>,
}

impl ProjectionSummary {
    pub fn compute<Tz: TimeZone>(records: &[NotificationRecord], now: &DateTime<Tz>) -> Self {
        Self {
            unread: unread(records).len(),
            urgent: urgent(records, false).len(),
            urgent_unread: urgent(records, true).len(),
            today: today(records, now).len(),
            by_category: Category::ALL
                .into_iter()
                .map(|category| (category, by_category(records, category).len()))
                .collect(),
        }
    }

    pub fn category_count(&self, category: Category) -> usize {
        self.by_category
            .iter()
            .find(|(c, _)| *c == category)
            .map_or(0, |(_, n)| *n)
    }
}
