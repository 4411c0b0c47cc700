//! Streak reconciliation.
//!
//! Decides whether a habit's streak must be reset because an active day went
//! by without a completion, and records completions. Decisions are pure; the
//! only side effect is one conditional write through the injected
//! [`HabitStore`], whose outcome is reported as a [`HabitUpdateResult`].
//!
//! ## Usage
//! ```rust,ignore
//! use tracker_core::habit::StreakEngine;
//!
//! let engine = StreakEngine::from_config(&config.engine);
//! for habit in store.list(user)? {
//!     let (habit, outcome) = engine.check_missed_days(&store, user, habit, clock.now());
//!     // show `habit`, retry on `Failure` if desired
//! }
//! ```

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};

use super::day::{self, date_weekday_index, days_between_exclusive, local_date};
use super::{HabitRecord, HabitUpdateResult};
use crate::error::StoreError;
use crate::storage::{EngineConfig, HabitStore};

/// Absences longer than this many whole days always break a streak.
pub const LONG_ABSENCE_DAYS: i64 = 7;

/// Why a streak was reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResetReason {
    /// More than [`LONG_ABSENCE_DAYS`] whole days since the last completion.
    LongAbsence { days: i64 },
    /// An active day between the last completion and today was skipped.
    MissedDay { date: NaiveDate },
}

/// Result of reconciling every habit of one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    /// Habits after reconciliation, in store order.
    pub habits: Vec<HabitRecord>,
    /// Number of streaks reset and persisted.
    pub reset_count: usize,
    /// Ids whose reset could not be persisted.
    pub failed: Vec<String>,
    pub reconciled_at: DateTime<Utc>,
}

impl ReconciliationSummary {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Streak decisions in one fixed time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakEngine {
    tz: FixedOffset,
}

impl Default for StreakEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StreakEngine {
    /// Engine that draws day boundaries in UTC.
    pub fn new() -> Self {
        Self { tz: Utc.fix() }
    }

    pub fn with_time_zone(tz: FixedOffset) -> Self {
        Self { tz }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_time_zone(config.time_zone())
    }

    pub fn time_zone(&self) -> FixedOffset {
        self.tz
    }

    pub fn weekday_index(&self, ts: DateTime<Utc>) -> usize {
        day::weekday_index(ts, self.tz)
    }

    pub fn is_completed_today(&self, habit: &HabitRecord, now: DateTime<Utc>) -> bool {
        day::is_completed_today(habit.last_completed_at, now, self.tz)
    }

    pub fn is_active_today(&self, habit: &HabitRecord, now: DateTime<Utc>) -> bool {
        habit.active_days.is_active(self.weekday_index(now))
    }

    /// Why the streak must be reset at `now`, if it must.
    ///
    /// Today itself is never a miss, and neither is the day of the last
    /// completion; only days strictly in between are scanned.
    pub fn reset_reason(&self, habit: &HabitRecord, now: DateTime<Utc>) -> Option<ResetReason> {
        let elapsed_days = now.signed_duration_since(habit.last_completed_at).num_days();
        if elapsed_days > LONG_ABSENCE_DAYS {
            return Some(ResetReason::LongAbsence { days: elapsed_days });
        }

        let last_day = local_date(habit.last_completed_at, self.tz);
        let today = local_date(now, self.tz);
        days_between_exclusive(last_day, today)
            .find(|date| habit.active_days.is_active(date_weekday_index(*date)) && *date != today)
            .map(|date| ResetReason::MissedDay { date })
    }

    pub fn needs_reset(&self, habit: &HabitRecord, now: DateTime<Utc>) -> bool {
        self.reset_reason(habit, now).is_some()
    }

    /// Reset the streak if an active day was missed.
    ///
    /// The returned record always reflects the decision, even when the
    /// write failed: on `Failure` it carries `streak == 0` while the store
    /// may still hold the old value.
    pub fn check_missed_days<S: HabitStore + ?Sized>(
        &self,
        store: &S,
        user_id: &str,
        habit: HabitRecord,
        now: DateTime<Utc>,
    ) -> (HabitRecord, HabitUpdateResult) {
        match self.reset_reason(&habit, now) {
            Some(reason) => {
                tracing::debug!(habit_id = %habit.id, ?reason, "streak reset required");
                self.reset_streak(store, user_id, habit)
            }
            None => (habit, HabitUpdateResult::NoUpdateNeeded),
        }
    }

    /// Set the streak to 0 and persist, keeping the last completion time.
    ///
    /// Always writes, even when the streak is already 0.
    pub fn reset_streak<S: HabitStore + ?Sized>(
        &self,
        store: &S,
        user_id: &str,
        habit: HabitRecord,
    ) -> (HabitRecord, HabitUpdateResult) {
        let mut updated = HabitRecord { streak: 0, ..habit };

        match store.put(user_id, &updated) {
            Ok(revision) => {
                updated.revision = revision;
                tracing::info!(habit_id = %updated.id, name = %updated.name, "streak reset");
                (updated, HabitUpdateResult::Success)
            }
            Err(StoreError::NotFound { .. }) => {
                tracing::warn!(habit_id = %updated.id, "streak reset on a deleted habit");
                (updated, HabitUpdateResult::NotFound)
            }
            Err(e) => {
                tracing::warn!(habit_id = %updated.id, error = %e, "failed to persist streak reset");
                (updated, HabitUpdateResult::Failure)
            }
        }
    }

    /// Record a completion for today.
    ///
    /// Re-reads the habit and writes conditionally on the revision read, so
    /// a concurrent completion makes this call fail instead of counting twice.
    /// Repeated calls on the same day return `NoUpdateNeeded`.
    pub fn mark_as_done<S: HabitStore + ?Sized>(
        &self,
        store: &S,
        user_id: &str,
        habit_id: &str,
        now: DateTime<Utc>,
    ) -> HabitUpdateResult {
        let habit = match store.get(user_id, habit_id) {
            Ok(habit) => habit,
            Err(StoreError::NotFound { .. }) => return HabitUpdateResult::NotFound,
            Err(e) => {
                tracing::warn!(habit_id, error = %e, "error getting habit");
                return HabitUpdateResult::Failure;
            }
        };

        if self.is_completed_today(&habit, now) {
            return HabitUpdateResult::NoUpdateNeeded;
        }

        let updated = HabitRecord {
            streak: habit.streak.saturating_add(1),
            last_completed_at: now,
            ..habit
        };

        match store.put(user_id, &updated) {
            Ok(_) => {
                tracing::info!(habit_id, streak = updated.streak, "habit marked as done");
                HabitUpdateResult::Success
            }
            Err(StoreError::NotFound { .. }) => HabitUpdateResult::NotFound,
            Err(e) => {
                tracing::warn!(habit_id, error = %e, "error updating habit");
                HabitUpdateResult::Failure
            }
        }
    }

    /// Load every habit of `user_id` and reconcile each one.
    ///
    /// # Errors
    /// Returns the store error if the habits cannot be listed.
    pub fn reconcile_all<S: HabitStore + ?Sized>(
        &self,
        store: &S,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ReconciliationSummary, StoreError> {
        let loaded = store.list(user_id)?;
        let mut habits = Vec::with_capacity(loaded.len());
        let mut reset_count = 0;
        let mut failed = Vec::new();

        for habit in loaded {
            let (habit, outcome) = self.check_missed_days(store, user_id, habit, now);
            match outcome {
                HabitUpdateResult::Success => reset_count += 1,
                HabitUpdateResult::Failure => failed.push(habit.id.clone()),
                HabitUpdateResult::NoUpdateNeeded | HabitUpdateResult::NotFound => {}
            }
            // Deleted while we were scanning.
            if outcome != HabitUpdateResult::NotFound {
                habits.push(habit);
            }
        }

        Ok(ReconciliationSummary {
            habits,
            reset_count,
            failed,
            reconciled_at: now,
        })
    }
}
