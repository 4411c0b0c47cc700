//! Deadline-bounded engine calls for async callers.
//!
//! Store access is blocking, so each call runs on tokio's blocking pool and
//! is awaited with a timeout. When the deadline passes the caller gets
//! `Failure`, but the blocking write is not aborted: it still commits or
//! fails as a whole.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{HabitRecord, HabitUpdateResult, StreakEngine};
use crate::storage::HabitStore;

async fn run_within<T, F>(timeout: Duration, what: &'static str, work: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(work)).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "{what} task failed");
            None
        }
        Err(_) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "{what} timed out");
            None
        }
    }
}

/// [`StreakEngine::mark_as_done`] bounded by `timeout`.
pub async fn mark_as_done_within<S>(
    engine: StreakEngine,
    store: Arc<S>,
    user_id: String,
    habit_id: String,
    now: DateTime<Utc>,
    timeout: Duration,
) -> HabitUpdateResult
where
    S: HabitStore + Send + Sync + ?Sized + 'static,
{
    run_within(timeout, "mark as done", move || {
        engine.mark_as_done(store.as_ref(), &user_id, &habit_id, now)
    })
    .await
    .unwrap_or(HabitUpdateResult::Failure)
}

/// [`StreakEngine::check_missed_days`] with the reset write bounded by `timeout`.
///
/// The decision is made up front; only a required reset touches the store.
pub async fn check_missed_days_within<S>(
    engine: StreakEngine,
    store: Arc<S>,
    user_id: String,
    habit: HabitRecord,
    now: DateTime<Utc>,
    timeout: Duration,
) -> (HabitRecord, HabitUpdateResult)
where
    S: HabitStore + Send + Sync + ?Sized + 'static,
{
    if !engine.needs_reset(&habit, now) {
        return (habit, HabitUpdateResult::NoUpdateNeeded);
    }

    let fallback = HabitRecord {
        streak: 0,
        ..habit.clone()
    };
    run_within(timeout, "streak reset", move || {
        engine.reset_streak(store.as_ref(), &user_id, habit)
    })
    .await
    .unwrap_or((fallback, HabitUpdateResult::Failure))
}
