//! Daily reminder decisions.
//!
//! Picks which habits a reminder is about, what it says, and when the next
//! one is due. Delivering it (alarms, OS notifications) is the caller's job.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::habit::{sort_habits, HabitRecord, HabitTier};
use crate::storage::ReminderConfig;

pub const REMINDER_TITLE: &str = "Habits for today";

/// Habits scheduled today that are not done yet, in display order.
pub fn habits_to_remind(
    habits: &[HabitRecord],
    now: DateTime<Utc>,
    tz: FixedOffset,
) -> Vec<HabitRecord> {
    sort_habits(habits, now, tz)
        .into_iter()
        .filter(|h| HabitTier::of(h, now, tz) == HabitTier::Due)
        .collect()
}

/// Content of a reminder notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderNotification {
    pub title: String,
    pub body: String,
    /// Set when the reminder is about a single habit, which can then be
    /// marked done straight from the notification.
    pub mark_done_habit_id: Option<String>,
    pub habit_count: usize,
}

impl ReminderNotification {
    /// `None` when there is nothing to remind about.
    pub fn for_habits(due: &[HabitRecord]) -> Option<Self> {
        match due {
            [] => None,
            [habit] => Some(Self {
                title: REMINDER_TITLE.to_string(),
                body: format!("Don't forget to complete your habit: {}", habit.name),
                mark_done_habit_id: Some(habit.id.clone()),
                habit_count: 1,
            }),
            many => Some(Self {
                title: REMINDER_TITLE.to_string(),
                body: format!("You have {} habits to complete today", many.len()),
                mark_done_habit_id: None,
                habit_count: many.len(),
            }),
        }
    }
}

/// Next time the daily reminder fires: today at `hour:minute` if that is
/// still ahead of `now`, otherwise tomorrow.
///
/// # Errors
/// Returns an error if `hour` or `minute` is out of range.
pub fn next_reminder_at(
    now: DateTime<Utc>,
    hour: u32,
    minute: u32,
    tz: FixedOffset,
) -> Result<DateTime<Utc>, ValidationError> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| {
        ValidationError::InvalidValue {
            field: "reminder time".into(),
            message: format!("{hour:02}:{minute:02} is not a valid time of day"),
        }
    })?;

    let today = now.with_timezone(&tz).date_naive().and_time(time);
    let candidate = tz
        .from_local_datetime(&today)
        .single()
        .ok_or_else(|| ValidationError::InvalidValue {
            field: "reminder time".into(),
            message: format!("{today} does not exist at offset {tz}"),
        })?
        .with_timezone(&Utc);

    if candidate > now {
        Ok(candidate)
    } else {
        Ok(candidate + Duration::days(1))
    }
}

/// What the reminder scheduler should do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReminderPlan {
    /// Reminders are off; cancel anything scheduled.
    Disabled,
    Scheduled {
        next_at: DateTime<Utc>,
        /// What a reminder firing right now would show.
        notification: Option<ReminderNotification>,
    },
}

/// # Errors
/// Returns an error if the configured reminder time is invalid.
pub fn plan_reminder(
    config: &ReminderConfig,
    habits: &[HabitRecord],
    now: DateTime<Utc>,
    tz: FixedOffset,
) -> Result<ReminderPlan, ValidationError> {
    if !config.enabled {
        tracing::debug!("reminders disabled");
        return Ok(ReminderPlan::Disabled);
    }

    let next_at = next_reminder_at(now, config.hour, config.minute, tz)?;
    let due = habits_to_remind(habits, now, tz);
    Ok(ReminderPlan::Scheduled {
        next_at,
        notification: ReminderNotification::for_habits(&due),
    })
}
