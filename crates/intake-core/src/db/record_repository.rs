//! Record repository implementation

use crate::error::Result;
use crate::models::{FieldValue, Record, RecordId, SyncStatus};
use rusqlite::{params, Connection};
use std::collections::BTreeMap;

/// Trait for record storage operations
pub trait RecordRepository {
    /// Insert or overwrite a record's fields, refreshing `updated_at`.
    ///
    /// A new id gets `created_at` set and status `pending`; an existing id
    /// keeps its `created_at` and drops back to `pending`.
    fn upsert(&self, id: &RecordId, fields: &BTreeMap<String, FieldValue>) -> Result<Record>;

    /// Get a record by ID
    fn get(&self, id: &RecordId) -> Result<Option<Record>>;

    /// List all records, most recent first
    fn list_all(&self) -> Result<Vec<Record>>;

    /// List records awaiting sync, most recent first
    fn list_pending(&self) -> Result<Vec<Record>>;

    /// Transition one record to `synced`. Unknown ids are a silent no-op,
    /// since batch results may race with deletions.
    fn mark_synced(&self, id: &RecordId) -> Result<()>;

    /// Permanently delete a record
    fn remove(&self, id: &RecordId) -> Result<()>;

    /// Number of records awaiting sync
    fn count_pending(&self) -> Result<usize>;
}

/// `SQLite` implementation of `RecordRepository`
pub struct SqliteRecordRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteRecordRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a record from a database row
    fn parse_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<Record> {
        let id: String = row.get(0)?;
        let fields: String = row.get(1)?;
        let status: String = row.get(2)?;
        Ok(Record {
            id: id.parse().unwrap_or_default(),
            fields: serde_json::from_str(&fields).unwrap_or_default(),
            sync_status: status.parse().unwrap_or(SyncStatus::Pending),
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }
}

impl RecordRepository for SqliteRecordRepository<'_> {
    fn upsert(&self, id: &RecordId, fields: &BTreeMap<String, FieldValue>) -> Result<Record> {
        let now = chrono::Utc::now().timestamp_millis();
        let encoded = serde_json::to_string(fields)?;

        self.conn.execute(
            "INSERT INTO records (id, fields, sync_status, created_at, updated_at)
             VALUES (?, ?, 'pending', ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 fields = excluded.fields,
                 sync_status = 'pending',
                 updated_at = excluded.updated_at",
            params![id.as_str(), encoded, now, now],
        )?;

        self.get(id)?
            .ok_or_else(|| crate::error::Error::NotFound(id.to_string()))
    }

    fn get(&self, id: &RecordId) -> Result<Option<Record>> {
        let result = self.conn.query_row(
            "SELECT id, fields, sync_status, created_at, updated_at FROM records WHERE id = ?",
            params![id.as_str()],
            Self::parse_record,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_all(&self) -> Result<Vec<Record>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, fields, sync_status, created_at, updated_at
             FROM records
             ORDER BY created_at DESC",
        )?;

        let records = stmt
            .query_map([], Self::parse_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }

    fn list_pending(&self) -> Result<Vec<Record>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, fields, sync_status, created_at, updated_at
             FROM records
             WHERE sync_status = 'pending'
             ORDER BY created_at DESC",
        )?;

        let records = stmt
            .query_map([], Self::parse_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }

    fn mark_synced(&self, id: &RecordId) -> Result<()> {
        self.conn.execute(
            "UPDATE records SET sync_status = 'synced' WHERE id = ?",
            params![id.as_str()],
        )?;
        Ok(())
    }

    fn remove(&self, id: &RecordId) -> Result<()> {
        self.conn
            .execute("DELETE FROM records WHERE id = ?", params![id.as_str()])?;
        Ok(())
    }

    fn count_pending(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE sync_status = 'pending'",
            [],
            |row| row.get(0),
        )?;
        #[allow(clippy::cast_sign_loss)]
        Ok(count as usize)
    }
}
