//! Database schema migrations for the habit store.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!("failed to read schema_version: {e}");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: baseline.
///
/// The `habits` table is created by `HabitDb::migrate()` directly.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    set_schema_version(conn, 1)
}

/// Migration v2: optimistic concurrency.
///
/// Adds `revision` to habits. Existing rows start at revision 1 so that a
/// client holding a never-persisted record (revision 0) cannot overwrite them.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "ALTER TABLE habits ADD COLUMN revision INTEGER NOT NULL DEFAULT 1;
         CREATE INDEX IF NOT EXISTS idx_habits_user_name ON habits(user_id, name);",
    )?;

    tx.execute("DELETE FROM schema_version", [])?;
    tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [2])?;

    tx.commit()?;
    tracing::debug!("habit schema migrated to v2");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v1_habits_table(conn: &Connection) {
        conn.execute_batch(
            "CREATE TABLE habits (
                user_id           TEXT NOT NULL,
                id                TEXT NOT NULL,
                name              TEXT NOT NULL,
                description       TEXT NOT NULL DEFAULT '',
                streak            INTEGER NOT NULL DEFAULT 0,
                last_completed_at TEXT NOT NULL,
                active_days       TEXT NOT NULL,
                PRIMARY KEY (user_id, id)
            );",
        )
        .unwrap();
    }

    #[test]
    fn fresh_database_reaches_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        v1_habits_table(&conn);
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        v1_habits_table(&conn);
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn v2_backfills_revision_for_existing_rows() {
        let conn = Connection::open_in_memory().unwrap();
        v1_habits_table(&conn);
        conn.execute(
            "INSERT INTO habits (user_id, id, name, last_completed_at, active_days)
             VALUES ('u1', 'h1', 'Read', '1970-01-01T00:00:00+00:00', '[true,true,true,true,true,true,true]')",
            [],
        )
        .unwrap();

        migrate(&conn).unwrap();

        let revision: i64 = conn
            .query_row("SELECT revision FROM habits WHERE id = 'h1'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(revision, 1);
    }
}
