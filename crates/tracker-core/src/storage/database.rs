//! SQLite-backed habit store.
//!
//! One `habits` table keyed by `(user_id, id)`. Timestamps are stored as
//! RFC 3339 UTC strings and the weekday mask as a JSON array. Writes are
//! conditional on the row's `revision` and run inside a transaction, so two
//! processes sharing the file cannot both apply a write based on the same read.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{DatabaseError, StoreError};
use crate::habit::{ActiveDays, HabitRecord};

use super::{data_dir, migrations, HabitStore};

/// SQLite database for habit storage.
pub struct HabitDb {
    conn: Mutex<Connection>,
}

struct HabitRow {
    id: String,
    name: String,
    description: String,
    streak: i64,
    last_completed_at: String,
    active_days: String,
    revision: i64,
}

impl HabitDb {
    /// Open the database at `<data dir>/habits.db`.
    ///
    /// Creates the database file and schema if they don't exist. Lock waits
    /// give up after `busy_timeout`.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the database
    /// cannot be opened or migrated.
    pub fn open(busy_timeout: Duration) -> crate::error::Result<Self> {
        let path = data_dir()?.join("habits.db");
        Ok(Self::open_at(&path, busy_timeout).map_err(StoreError::from)?)
    }

    /// Open (or create) the database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path, busy_timeout: Duration) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        conn.busy_timeout(busy_timeout)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("habit database mutex poisoned".to_string()))
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| DatabaseError::MigrationFailed("mutex poisoned".to_string()))?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS habits (
                user_id           TEXT NOT NULL,
                id                TEXT NOT NULL,
                name              TEXT NOT NULL,
                description       TEXT NOT NULL DEFAULT '',
                streak            INTEGER NOT NULL DEFAULT 0,
                last_completed_at TEXT NOT NULL,
                active_days       TEXT NOT NULL,
                PRIMARY KEY (user_id, id)
            );",
        )?;

        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    fn decode(row: HabitRow) -> Result<HabitRecord, DatabaseError> {
        let corrupt = |message: String| DatabaseError::CorruptRow {
            id: row.id.clone(),
            message,
        };

        let last_completed_at = DateTime::parse_from_rfc3339(&row.last_completed_at)
            .map_err(|e| corrupt(format!("last_completed_at: {e}")))?
            .with_timezone(&Utc);
        let days: [bool; 7] = serde_json::from_str(&row.active_days)
            .map_err(|e| corrupt(format!("active_days: {e}")))?;
        let streak =
            u32::try_from(row.streak).map_err(|_| corrupt(format!("streak: {}", row.streak)))?;
        let revision = u64::try_from(row.revision)
            .map_err(|_| corrupt(format!("revision: {}", row.revision)))?;

        Ok(HabitRecord {
            id: row.id,
            name: row.name,
            description: row.description,
            streak,
            last_completed_at,
            active_days: ActiveDays::new(days),
            revision,
        })
    }

    fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HabitRow> {
        Ok(HabitRow {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            streak: row.get(3)?,
            last_completed_at: row.get(4)?,
            active_days: row.get(5)?,
            revision: row.get(6)?,
        })
    }

    /// Why a guarded write touched no row: the habit is gone, or its revision moved on.
    fn rejected_write(
        conn: &Connection,
        user_id: &str,
        habit: &HabitRecord,
    ) -> Result<StoreError, StoreError> {
        let actual = conn
            .query_row(
                "SELECT revision FROM habits WHERE user_id = ?1 AND id = ?2",
                params![user_id, habit.id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        Ok(match actual {
            None => StoreError::not_found(&habit.id),
            Some(actual) => StoreError::Conflict {
                expected: habit.revision,
                actual: u64::try_from(actual).unwrap_or(0),
            },
        })
    }
}

impl HabitStore for HabitDb {
    fn get(&self, user_id: &str, habit_id: &str) -> Result<HabitRecord, StoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT id, name, description, streak, last_completed_at, active_days, revision
                 FROM habits WHERE user_id = ?1 AND id = ?2",
                params![user_id, habit_id],
                Self::read_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found(habit_id))?;
        Ok(Self::decode(row)?)
    }

    fn list(&self, user_id: &str) -> Result<Vec<HabitRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, description, streak, last_completed_at, active_days, revision
             FROM habits WHERE user_id = ?1 ORDER BY name, id",
        )?;
        let rows = stmt
            .query_map(params![user_id], Self::read_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|row| Self::decode(row).map_err(StoreError::from))
            .collect()
    }

    fn put(&self, user_id: &str, habit: &HabitRecord) -> Result<u64, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let days_json = serde_json::to_string(&habit.active_days.as_array())
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let next = habit.revision + 1;

        let written = if habit.revision == 0 {
            tx.execute(
                "INSERT INTO habits (user_id, id, name, description, streak, last_completed_at, active_days, revision)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT (user_id, id) DO NOTHING",
                params![
                    user_id,
                    habit.id,
                    habit.name,
                    habit.description,
                    habit.streak,
                    habit.last_completed_at.to_rfc3339(),
                    days_json,
                    next as i64,
                ],
            )?
        } else {
            tx.execute(
                "UPDATE habits
                 SET name = ?1, description = ?2, streak = ?3, last_completed_at = ?4,
                     active_days = ?5, revision = ?6
                 WHERE user_id = ?7 AND id = ?8 AND revision = ?9",
                params![
                    habit.name,
                    habit.description,
                    habit.streak,
                    habit.last_completed_at.to_rfc3339(),
                    days_json,
                    next as i64,
                    user_id,
                    habit.id,
                    habit.revision as i64,
                ],
            )?
        };

        if written == 0 {
            return Err(Self::rejected_write(&tx, user_id, habit)?);
        }

        tx.commit()?;
        Ok(next)
    }

    fn delete(&self, user_id: &str, habit_id: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM habits WHERE user_id = ?1 AND id = ?2",
            params![user_id, habit_id],
        )?;
        if deleted == 0 {
            return Err(StoreError::not_found(habit_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::{HabitDraft, NEVER_COMPLETED};
    use chrono::TimeZone;

    fn habit(name: &str) -> HabitRecord {
        HabitRecord::from_draft(HabitDraft::new(name, ActiveDays::weekdays())).unwrap()
    }

    #[test]
    fn insert_and_get() {
        let db = HabitDb::open_memory().unwrap();
        let mut h = habit("Journal");
        h.description = "one page".to_string();

        assert_eq!(db.put("u1", &h).unwrap(), 1);
        let stored = db.get("u1", &h.id).unwrap();
        assert_eq!(stored.name, "Journal");
        assert_eq!(stored.description, "one page");
        assert_eq!(stored.active_days, ActiveDays::weekdays());
        assert_eq!(stored.last_completed_at, NEVER_COMPLETED);
        assert_eq!(stored.revision, 1);
    }

    #[test]
    fn update_requires_current_revision() {
        let db = HabitDb::open_memory().unwrap();
        let h = habit("Journal");
        db.put("u1", &h).unwrap();

        let mut current = db.get("u1", &h.id).unwrap();
        current.streak = 2;
        current.last_completed_at = Utc.with_ymd_and_hms(2024, 6, 3, 8, 30, 0).unwrap();
        assert_eq!(db.put("u1", &current).unwrap(), 2);

        // Second writer still holds revision 1.
        let err = db.put("u1", &current).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { expected: 1, actual: 2 }));

        let stored = db.get("u1", &h.id).unwrap();
        assert_eq!(stored.streak, 2);
        assert_eq!(stored.last_completed_at, current.last_completed_at);

        // A write based on a read from before a delete.
        db.delete("u1", &h.id).unwrap();
        assert!(db.put("u1", &stored).unwrap_err().is_not_found());
    }

    #[test]
    fn write_guard_uses_stored_revision() {
        let db = HabitDb::open_memory().unwrap();
        let h = habit("Journal");
        db.put("u1", &h).unwrap();

        // Inserting the same id again is a conflict, not an overwrite.
        let err = db.put("u1", &h).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { expected: 0, actual: 1 }));

        // Another process bumped the row behind our back.
        let mut current = db.get("u1", &h.id).unwrap();
        db.lock()
            .unwrap()
            .execute("UPDATE habits SET revision = 5 WHERE id = ?1", params![h.id])
            .unwrap();
        current.streak = 9;
        let err = db.put("u1", &current).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { expected: 1, actual: 5 }));
        assert_eq!(db.get("u1", &h.id).unwrap().streak, 0);
    }

    #[test]
    fn list_is_scoped_per_user() {
        let db = HabitDb::open_memory().unwrap();
        db.put("u1", &habit("B")).unwrap();
        db.put("u1", &habit("A")).unwrap();
        db.put("u2", &habit("C")).unwrap();

        let names: Vec<_> = db.list("u1").unwrap().into_iter().map(|h| h.name).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(db.list("u3").unwrap().len(), 0);
    }

    #[test]
    fn delete_and_not_found() {
        let db = HabitDb::open_memory().unwrap();
        let h = habit("Journal");
        db.put("u1", &h).unwrap();

        assert!(db.delete("u2", &h.id).unwrap_err().is_not_found());
        db.delete("u1", &h.id).unwrap();
        assert!(db.get("u1", &h.id).unwrap_err().is_not_found());
    }

    #[test]
    fn corrupt_row_is_reported() {
        let db = HabitDb::open_memory().unwrap();
        db.lock()
            .unwrap()
            .execute(
                "INSERT INTO habits (user_id, id, name, last_completed_at, active_days)
                 VALUES ('u1', 'bad', 'Bad', 'yesterday', '[true]')",
                [],
            )
            .unwrap();

        let err = db.get("u1", "bad").unwrap_err();
        assert!(matches!(
            err,
            StoreError::Database(DatabaseError::CorruptRow { .. })
        ));
    }

    #[test]
    fn file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("habits.db");
        let h = habit("Journal");
        {
            let db = HabitDb::open_at(&path, Duration::from_millis(500)).unwrap();
            db.put("u1", &h).unwrap();
        }
        let db = HabitDb::open_at(&path, Duration::from_millis(500)).unwrap();
        assert_eq!(db.get("u1", &h.id).unwrap().name, "Journal");
    }
}
