//! # Habit Tracker Core Library
//!
//! This library provides the business logic of the habit tracker. Every
//! operation is available through the standalone CLI binary, which is a thin
//! caller over this crate.
//!
//! ## Architecture
//!
//! - **Habit model**: [`HabitRecord`] with a weekly [`ActiveDays`] schedule,
//!   a streak counter and the last completion time
//! - **Streak engine**: [`StreakEngine`] resets streaks after missed active
//!   days and records completions, one conditional store write at a time
//! - **Prioritisation**: urgency tiers and deterministic display order
//! - **Reminders**: which habits to remind about and when
//! - **Storage**: the [`HabitStore`] trait with in-memory and SQLite
//!   implementations, plus TOML-based configuration
//!
//! All calendar-day decisions use one fixed UTC offset, configured through
//! [`storage::EngineConfig`] and UTC by default.

pub mod clock;
pub mod error;
pub mod habit;
pub mod reminder;
pub mod storage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, StoreError, ValidationError};
pub use habit::reconciliation::{ReconciliationSummary, ResetReason};
pub use habit::{
    categorize, sort_habits, ActiveDays, HabitBuckets, HabitDraft, HabitRecord, HabitTier,
    HabitUpdateResult, StreakEngine, NEVER_COMPLETED,
};
pub use reminder::{plan_reminder, ReminderNotification, ReminderPlan};
pub use storage::{Config, HabitDb, HabitStore, MemoryHabitStore};
