//! Single-slot schema cache repository

use crate::error::Result;
use crate::models::{FieldDefinition, Schema};
use rusqlite::{params, Connection};

/// Trait for the cached-schema slot
pub trait SchemaCacheRepository {
    /// Replace the cached schema. Last write wins; no history is kept.
    fn put(&self, version: Option<i64>, elements: &[FieldDefinition]) -> Result<()>;

    /// Read the cached schema, if any
    fn get(&self) -> Result<Option<Schema>>;
}

/// `SQLite` implementation of `SchemaCacheRepository`
pub struct SqliteSchemaCache<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSchemaCache<'a> {
    /// Create a new cache repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl SchemaCacheRepository for SqliteSchemaCache<'_> {
    fn put(&self, version: Option<i64>, elements: &[FieldDefinition]) -> Result<()> {
        let encoded = serde_json::to_string(elements)?;
        let cached_at = chrono::Utc::now().to_rfc3339();

        // Delete-then-insert inside one transaction keeps the slot atomic
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM schema_cache", [])?;
        tx.execute(
            "INSERT INTO schema_cache (slot, version, elements, cached_at) VALUES (0, ?, ?, ?)",
            params![version, encoded, cached_at],
        )?;
        tx.commit()?;

        Ok(())
    }

    fn get(&self) -> Result<Option<Schema>> {
        let result = self.conn.query_row(
            "SELECT version, elements FROM schema_cache WHERE slot = 0",
            [],
            |row| {
                let version: Option<i64> = row.get(0)?;
                let elements: String = row.get(1)?;
                Ok((version, elements))
            },
        );

        match result {
            Ok((version, elements)) => {
                let elements: Vec<FieldDefinition> = serde_json::from_str(&elements)?;
                Ok(Some(Schema { version, elements }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
