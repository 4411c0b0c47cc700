mod config;
pub mod database;
pub mod memory;
pub mod migrations;

pub use config::{Config, EngineConfig, ReminderConfig, StoreConfig, UserConfig};
pub use database::HabitDb;
pub use memory::MemoryHabitStore;

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{ConfigError, StoreError};
use crate::habit::HabitRecord;

/// Per-user keyed habit store.
///
/// Every call is fallible. `put` is a conditional write: it succeeds only
/// when `habit.revision` equals the revision currently stored (0 for a
/// habit that does not exist yet) and returns the new revision.
pub trait HabitStore {
    fn get(&self, user_id: &str, habit_id: &str) -> Result<HabitRecord, StoreError>;

    fn list(&self, user_id: &str) -> Result<Vec<HabitRecord>, StoreError>;

    fn put(&self, user_id: &str, habit: &HabitRecord) -> Result<u64, StoreError>;

    fn delete(&self, user_id: &str, habit_id: &str) -> Result<(), StoreError>;
}

impl<S: HabitStore + ?Sized> HabitStore for &S {
    fn get(&self, user_id: &str, habit_id: &str) -> Result<HabitRecord, StoreError> {
        (**self).get(user_id, habit_id)
    }

    fn list(&self, user_id: &str) -> Result<Vec<HabitRecord>, StoreError> {
        (**self).list(user_id)
    }

    fn put(&self, user_id: &str, habit: &HabitRecord) -> Result<u64, StoreError> {
        (**self).put(user_id, habit)
    }

    fn delete(&self, user_id: &str, habit_id: &str) -> Result<(), StoreError> {
        (**self).delete(user_id, habit_id)
    }
}

impl<S: HabitStore + ?Sized> HabitStore for Arc<S> {
    fn get(&self, user_id: &str, habit_id: &str) -> Result<HabitRecord, StoreError> {
        (**self).get(user_id, habit_id)
    }

    fn list(&self, user_id: &str) -> Result<Vec<HabitRecord>, StoreError> {
        (**self).list(user_id)
    }

    fn put(&self, user_id: &str, habit: &HabitRecord) -> Result<u64, StoreError> {
        (**self).put(user_id, habit)
    }

    fn delete(&self, user_id: &str, habit_id: &str) -> Result<(), StoreError> {
        (**self).delete(user_id, habit_id)
    }
}

/// Returns the data directory, creating it if needed.
///
/// `TRACKER_DATA_DIR` wins if set. Otherwise `~/.config/habit-tracker[-dev]/`,
/// with the `-dev` suffix when `TRACKER_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("TRACKER_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("TRACKER_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("habit-tracker-dev")
            } else {
                base_dir.join("habit-tracker")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
