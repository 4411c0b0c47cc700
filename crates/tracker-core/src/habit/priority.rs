//! Display ordering of habits by urgency.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use super::day::{is_completed_today, weekday_index};
use super::HabitRecord;

/// Urgency tier, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitTier {
    /// Scheduled today and not yet done.
    Due,
    /// Scheduled today and already done.
    Done,
    /// Not scheduled today.
    NotToday,
}

impl HabitTier {
    pub fn of(habit: &HabitRecord, now: DateTime<Utc>, tz: FixedOffset) -> Self {
        if !habit.active_days.is_active(weekday_index(now, tz)) {
            HabitTier::NotToday
        } else if is_completed_today(habit.last_completed_at, now, tz) {
            HabitTier::Done
        } else {
            HabitTier::Due
        }
    }
}

fn by_name(a: &HabitRecord, b: &HabitRecord) -> Ordering {
    a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id))
}

/// Habits ordered by tier, then name, then id. The input is left untouched.
pub fn sort_habits(habits: &[HabitRecord], now: DateTime<Utc>, tz: FixedOffset) -> Vec<HabitRecord> {
    let mut keyed: Vec<(HabitTier, &HabitRecord)> = habits
        .iter()
        .map(|h| (HabitTier::of(h, now, tz), h))
        .collect();
    keyed.sort_by(|(ta, a), (tb, b)| ta.cmp(tb).then_with(|| by_name(a, b)));
    keyed.into_iter().map(|(_, h)| h.clone()).collect()
}

/// Habits split by tier, each group ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitBuckets {
    pub due: Vec<HabitRecord>,
    pub done: Vec<HabitRecord>,
    pub not_today: Vec<HabitRecord>,
}

impl HabitBuckets {
    pub fn is_empty(&self) -> bool {
        self.due.is_empty() && self.done.is_empty() && self.not_today.is_empty()
    }

    pub fn len(&self) -> usize {
        self.due.len() + self.done.len() + self.not_today.len()
    }

    /// All habits in display order.
    pub fn into_sorted(self) -> Vec<HabitRecord> {
        let mut all = self.due;
        all.extend(self.done);
        all.extend(self.not_today);
        all
    }
}

pub fn categorize(habits: &[HabitRecord], now: DateTime<Utc>, tz: FixedOffset) -> HabitBuckets {
    let mut buckets = HabitBuckets::default();
    for habit in sort_habits(habits, now, tz) {
        match HabitTier::of(&habit, now, tz) {
            HabitTier::Due => buckets.due.push(habit),
            HabitTier::Done => buckets.done.push(habit),
            HabitTier::NotToday => buckets.not_today.push(habit),
        }
    }
    buckets
}
