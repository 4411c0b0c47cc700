//! Habit management commands for CLI.

use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde_json::json;
use tracker_core::{
    categorize, sort_habits, ActiveDays, Clock, HabitDraft, HabitRecord, HabitStore,
    HabitUpdateResult, StreakEngine, SystemClock,
};

use super::Context;

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a new habit
    Add {
        /// Habit name
        name: String,
        /// Habit description
        #[arg(long, default_value = "")]
        description: String,
        /// Active days: comma-separated (mon,wed,fri) or daily/weekdays/weekends
        #[arg(long, default_value = "daily")]
        days: String,
    },
    /// List habits, resetting broken streaks, most urgent first
    List {
        /// Group into due / done / not_today
        #[arg(long)]
        grouped: bool,
    },
    /// Get habit details
    Get {
        /// Habit ID
        id: String,
    },
    /// Edit a habit's name, description or schedule
    Edit {
        /// Habit ID
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New active days
        #[arg(long)]
        days: Option<String>,
    },
    /// Delete a habit
    Delete {
        /// Habit ID
        id: String,
    },
    /// Mark a habit as done today
    Done {
        /// Habit ID
        id: String,
    },
}

/// Read one habit and reset its streak if an active day was missed.
///
/// A reset that could not be saved is logged and the reset record is still
/// returned; it is retried on the next read.
fn get_reconciled<S: HabitStore + ?Sized>(
    engine: &StreakEngine,
    store: &S,
    user_id: &str,
    id: &str,
    now: DateTime<Utc>,
) -> Result<HabitRecord, Box<dyn std::error::Error>> {
    let habit = store.get(user_id, id)?;
    let (habit, outcome) = engine.check_missed_days(store, user_id, habit, now);
    match outcome {
        HabitUpdateResult::NotFound => Err(format!("Habit not found: {id}").into()),
        HabitUpdateResult::Failure => {
            tracing::warn!(habit_id = %id, "streak reset not saved; will retry on next read");
            Ok(habit)
        }
        HabitUpdateResult::Success | HabitUpdateResult::NoUpdateNeeded => Ok(habit),
    }
}

pub fn run(action: HabitAction, user: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open(user)?;
    let now = SystemClock.now();
    let tz = ctx.engine.time_zone();

    match action {
        HabitAction::Add {
            name,
            description,
            days,
        } => {
            let active_days: ActiveDays = days.parse()?;
            let mut habit = HabitRecord::from_draft(
                HabitDraft::new(name, active_days).with_description(description),
            )?;
            habit.revision = ctx.db.put(&ctx.user_id, &habit)?;
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::List { grouped } => {
            let summary = ctx.engine.reconcile_all(&ctx.db, &ctx.user_id, now)?;
            for id in &summary.failed {
                tracing::warn!(habit_id = %id, "streak reset not saved; will retry on next read");
            }
            if grouped {
                let buckets = categorize(&summary.habits, now, tz);
                println!("{}", serde_json::to_string_pretty(&buckets)?);
            } else {
                let sorted = sort_habits(&summary.habits, now, tz);
                println!("{}", serde_json::to_string_pretty(&sorted)?);
            }
        }
        HabitAction::Get { id } => {
            let habit = get_reconciled(&ctx.engine, &ctx.db, &ctx.user_id, &id, now)?;
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::Edit {
            id,
            name,
            description,
            days,
        } => {
            let mut habit = ctx.db.get(&ctx.user_id, &id)?;
            let mut draft = habit.draft();
            if let Some(n) = name {
                draft.name = n;
            }
            if let Some(d) = description {
                draft.description = d;
            }
            if let Some(d) = days {
                draft.active_days = d.parse()?;
            }
            habit.apply_draft(draft)?;
            habit.revision = ctx.db.put(&ctx.user_id, &habit)?;
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::Delete { id } => {
            ctx.db.delete(&ctx.user_id, &id)?;
            println!("Habit deleted: {id}");
        }
        HabitAction::Done { id } => {
            let result = ctx.engine.mark_as_done(&ctx.db, &ctx.user_id, &id, now);
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "habit_id": id, "result": result }))?
            );
            match result {
                HabitUpdateResult::Success | HabitUpdateResult::NoUpdateNeeded => {}
                HabitUpdateResult::NotFound => return Err(format!("Habit not found: {id}").into()),
                HabitUpdateResult::Failure => {
                    return Err(format!("Habit was not marked as done: {id}").into())
                }
            }
        }
    }
    Ok(())
}
