//! Database migrations

use crate::error::Result;
use rusqlite::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 1;

/// Run all pending migrations
pub fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn)?;

    if version < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

/// Get the current schema version
fn get_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get::<_, i32>(0).map(|flag| flag != 0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    Ok(version)
}

/// Migration to version 1: records and single-slot schema cache
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "BEGIN;
         CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY
         );
         CREATE TABLE IF NOT EXISTS records (
             id TEXT PRIMARY KEY,
             fields TEXT NOT NULL,
             sync_status TEXT NOT NULL DEFAULT 'pending',
             created_at INTEGER NOT NULL,
             updated_at INTEGER NOT NULL
         );
         CREATE INDEX IF NOT EXISTS idx_records_created ON records(created_at DESC);
         CREATE INDEX IF NOT EXISTS idx_records_status ON records(sync_status);
         -- Single-slot cache: CHECK pins the row id so any write is an overwrite
         CREATE TABLE IF NOT EXISTS schema_cache (
             slot INTEGER PRIMARY KEY CHECK (slot = 0),
             version INTEGER,
             elements TEXT NOT NULL,
             cached_at TEXT NOT NULL
         );
         INSERT INTO schema_version (version) VALUES (1);
         COMMIT;",
    )?;

    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn test_migrations() {
        let conn = setup();
        run(&conn).unwrap();

        let version = get_version(&conn).unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_migrations_idempotent() {
        let conn = setup();
        run(&conn).unwrap();
        run(&conn).unwrap(); // Should not fail

        let version = get_version(&conn).unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_schema_cache_slot_is_pinned() {
        let conn = setup();
        run(&conn).unwrap();

        conn.execute(
            "INSERT INTO schema_cache (slot, version, elements, cached_at) VALUES (0, 1, '[]', 'now')",
            [],
        )
        .unwrap();
        let second = conn.execute(
            "INSERT INTO schema_cache (slot, version, elements, cached_at) VALUES (1, 2, '[]', 'now')",
            [],
        );
        assert!(second.is_err());
    }
}
