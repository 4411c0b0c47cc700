//! Habit records and their weekly schedules.
//!
//! A [`HabitRecord`] is the only persistent entity. Everything that decides
//! what happens to a record over time (missed-day resets, completions,
//! display order) lives in the submodules and never touches a record
//! outside of an explicit return value.

pub mod day;
pub mod priority;
pub mod reconciliation;
pub mod timed;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub use day::{is_completed_today, is_same_day, weekday_index};
pub use priority::{categorize, sort_habits, HabitBuckets, HabitTier};
pub use reconciliation::{StreakEngine, LONG_ABSENCE_DAYS};

/// Sentinel for "never completed".
pub const NEVER_COMPLETED: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

const DAY_NAMES: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];
const FULL_DAY_NAMES: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Which weekdays a habit is scheduled for. Index 0 is Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActiveDays([bool; 7]);

impl ActiveDays {
    pub const fn new(days: [bool; 7]) -> Self {
        Self(days)
    }

    /// Every day of the week.
    pub const fn daily() -> Self {
        Self([true; 7])
    }

    /// No day selected. Only valid as an intermediate editing state.
    pub const fn none() -> Self {
        Self([false; 7])
    }

    /// Monday through Friday.
    pub const fn weekdays() -> Self {
        Self([true, true, true, true, true, false, false])
    }

    /// Saturday and Sunday.
    pub const fn weekends() -> Self {
        Self([false, false, false, false, false, true, true])
    }

    /// Whether the weekday at `index` is scheduled. Out of range is never active.
    pub fn is_active(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    pub fn set(&mut self, index: usize, active: bool) {
        if let Some(day) = self.0.get_mut(index) {
            *day = active;
        }
    }

    pub fn toggle(&mut self, index: usize) {
        if let Some(day) = self.0.get_mut(index) {
            *day = !*day;
        }
    }

    pub fn count(&self) -> usize {
        self.0.iter().filter(|d| **d).count()
    }

    pub fn any(&self) -> bool {
        self.0.iter().any(|d| *d)
    }

    pub fn as_array(&self) -> [bool; 7] {
        self.0
    }
}

impl From<[bool; 7]> for ActiveDays {
    fn from(days: [bool; 7]) -> Self {
        Self(days)
    }
}

impl fmt::Display for ActiveDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = DAY_NAMES
            .iter()
            .zip(self.0.iter())
            .filter(|(_, active)| **active)
            .map(|(name, _)| *name)
            .collect();
        f.write_str(&names.join(","))
    }
}

impl FromStr for ActiveDays {
    type Err = ValidationError;

    /// Parses `mon,wed,fri`, full day names, or one of `daily`, `weekdays`, `weekends`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "all" => return Ok(Self::daily()),
            "weekdays" => return Ok(Self::weekdays()),
            "weekends" => return Ok(Self::weekends()),
            _ => {}
        }

        let mut days = Self::none();
        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let lower = token.to_ascii_lowercase();
            let index = DAY_NAMES
                .iter()
                .zip(FULL_DAY_NAMES.iter())
                .position(|(short, full)| lower == *short || lower == *full)
                .ok_or_else(|| ValidationError::UnknownDay(token.to_string()))?;
            days.set(index, true);
        }
        Ok(days)
    }
}

/// Outcome of an engine operation that may write to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HabitUpdateResult {
    /// The change was computed and persisted.
    Success,
    /// The store read or write failed; memory and store may disagree.
    Failure,
    /// Nothing to change.
    NoUpdateNeeded,
    /// The habit does not exist (anymore) for this user.
    NotFound,
}

impl HabitUpdateResult {
    pub fn is_success(self) -> bool {
        self == HabitUpdateResult::Success
    }
}

impl fmt::Display for HabitUpdateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HabitUpdateResult::Success => "SUCCESS",
            HabitUpdateResult::Failure => "FAILURE",
            HabitUpdateResult::NoUpdateNeeded => "NO_UPDATE_NEEDED",
            HabitUpdateResult::NotFound => "NOT_FOUND",
        };
        f.write_str(s)
    }
}

/// User-editable part of a habit, validated before it becomes a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub active_days: ActiveDays,
}

impl HabitDraft {
    pub fn new(name: impl Into<String>, active_days: ActiveDays) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            active_days,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// # Errors
    /// Returns an error if the name is blank or no day is active.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !self.active_days.any() {
            return Err(ValidationError::NoActiveDays);
        }
        Ok(())
    }
}

/// A tracked habit as stored per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub streak: u32,
    #[serde(default = "never_completed")]
    pub last_completed_at: DateTime<Utc>,
    pub active_days: ActiveDays,
    /// Store-managed write counter; 0 until first persisted.
    #[serde(default)]
    pub revision: u64,
}

fn never_completed() -> DateTime<Utc> {
    NEVER_COMPLETED
}

impl HabitRecord {
    /// Create a fresh, never-completed habit from a validated draft.
    ///
    /// # Errors
    /// Returns the draft's validation error.
    pub fn from_draft(draft: HabitDraft) -> Result<Self, ValidationError> {
        draft.validate()?;
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: draft.name,
            description: draft.description,
            streak: 0,
            last_completed_at: NEVER_COMPLETED,
            active_days: draft.active_days,
            revision: 0,
        })
    }

    /// Replace name, description and schedule. Streak and completion are kept.
    ///
    /// # Errors
    /// Returns the draft's validation error; the record is left untouched.
    pub fn apply_draft(&mut self, draft: HabitDraft) -> Result<(), ValidationError> {
        draft.validate()?;
        self.name = draft.name;
        self.description = draft.description;
        self.active_days = draft.active_days;
        Ok(())
    }

    pub fn draft(&self) -> HabitDraft {
        HabitDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            active_days: self.active_days,
        }
    }

    pub fn has_ever_completed(&self) -> bool {
        self.last_completed_at != NEVER_COMPLETED
    }
}
