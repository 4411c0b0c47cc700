//! In-memory habit store.
//!
//! Thread-safe and revision-checked like the SQLite store, so it can stand in
//! for it in tests and in short-lived callers. Writes can be made to fail on
//! demand to exercise the engine's failure paths.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::error::StoreError;
use crate::habit::HabitRecord;

use super::HabitStore;

type UserHabits = BTreeMap<String, HabitRecord>;

#[derive(Debug, Default)]
pub struct MemoryHabitStore {
    users: Mutex<HashMap<String, UserHabits>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryHabitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `get`/`list` fail with `Unavailable`.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `put`/`delete` fail with `Unavailable`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Store a habit as-is, bypassing the revision check. Returns the stored revision.
    pub fn seed(&self, user_id: &str, habit: HabitRecord) -> u64 {
        let mut users = self.lock();
        let mut habit = habit;
        if habit.revision == 0 {
            habit.revision = 1;
        }
        let revision = habit.revision;
        users
            .entry(user_id.to_string())
            .or_default()
            .insert(habit.id.clone(), habit);
        revision
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, UserHabits>> {
        // A poisoned map still holds consistent records; each write is a single insert.
        self.users.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self, flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl HabitStore for MemoryHabitStore {
    fn get(&self, user_id: &str, habit_id: &str) -> Result<HabitRecord, StoreError> {
        self.check(&self.fail_reads)?;
        self.lock()
            .get(user_id)
            .and_then(|habits| habits.get(habit_id))
            .cloned()
            .ok_or_else(|| StoreError::not_found(habit_id))
    }

    fn list(&self, user_id: &str) -> Result<Vec<HabitRecord>, StoreError> {
        self.check(&self.fail_reads)?;
        Ok(self
            .lock()
            .get(user_id)
            .map(|habits| habits.values().cloned().collect())
            .unwrap_or_default())
    }

    fn put(&self, user_id: &str, habit: &HabitRecord) -> Result<u64, StoreError> {
        self.check(&self.fail_writes)?;
        let mut users = self.lock();
        let habits = users.entry(user_id.to_string()).or_default();

        let actual = match habits.get(&habit.id) {
            Some(stored) => stored.revision,
            None if habit.revision != 0 => return Err(StoreError::not_found(&habit.id)),
            None => 0,
        };
        if actual != habit.revision {
            return Err(StoreError::Conflict {
                expected: habit.revision,
                actual,
            });
        }

        let mut stored = habit.clone();
        stored.revision = actual + 1;
        habits.insert(stored.id.clone(), stored);
        Ok(actual + 1)
    }

    fn delete(&self, user_id: &str, habit_id: &str) -> Result<(), StoreError> {
        self.check(&self.fail_writes)?;
        self.lock()
            .get_mut(user_id)
            .and_then(|habits| habits.remove(habit_id))
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(habit_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::{ActiveDays, HabitDraft};

    fn habit(name: &str) -> HabitRecord {
        HabitRecord::from_draft(HabitDraft::new(name, ActiveDays::daily())).unwrap()
    }

    #[test]
    fn put_then_get_bumps_revision() {
        let store = MemoryHabitStore::new();
        let h = habit("Read");
        assert_eq!(store.put("u1", &h).unwrap(), 1);

        let stored = store.get("u1", &h.id).unwrap();
        assert_eq!(stored.revision, 1);
        assert_eq!(stored.name, "Read");
    }

    #[test]
    fn stale_revision_is_rejected() {
        let store = MemoryHabitStore::new();
        let h = habit("Read");
        store.put("u1", &h).unwrap();

        // Still at revision 0, the store is at 1.
        let err = store.put("u1", &h).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { expected: 0, actual: 1 }));
    }

    #[test]
    fn users_are_isolated() {
        let store = MemoryHabitStore::new();
        let h = habit("Read");
        store.put("u1", &h).unwrap();

        assert!(store.get("u2", &h.id).unwrap_err().is_not_found());
        assert!(store.list("u2").unwrap().is_empty());
        assert_eq!(store.list("u1").unwrap().len(), 1);
    }

    #[test]
    fn delete_missing_is_not_found() {
        let store = MemoryHabitStore::new();
        assert!(store.delete("u1", "nope").unwrap_err().is_not_found());

        let h = habit("Read");
        store.put("u1", &h).unwrap();
        store.delete("u1", &h.id).unwrap();
        assert!(store.get("u1", &h.id).unwrap_err().is_not_found());

        // Writing back a copy read before the delete does not resurrect it.
        let stale = HabitRecord { revision: 1, ..h };
        assert!(store.put("u1", &stale).unwrap_err().is_not_found());
    }

    #[test]
    fn failure_injection() {
        let store = MemoryHabitStore::new();
        store.set_fail_writes(true);
        assert!(matches!(
            store.put("u1", &habit("Read")),
            Err(StoreError::Unavailable(_))
        ));
        store.set_fail_writes(false);
        store.set_fail_reads(true);
        assert!(store.list("u1").is_err());
    }
}
