//! Record store service: the device-local persistence boundary.
//!
//! Owns the `SQLite` handle exclusively; every other component goes through
//! this contract. The store is an explicit object with an
//! `initialize`/`dispose` lifecycle rather than module-global state.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{
    Database, RecordRepository, SchemaCacheRepository, SqliteRecordRepository, SqliteSchemaCache,
};
use crate::error::{Error, Result};
use crate::models::{FieldDefinition, FieldValue, Record, RecordId, Schema};

/// Where the store keeps its data
#[derive(Debug, Clone)]
pub enum StoreLocation {
    /// A database file at the given path (parent directories are created)
    Path(PathBuf),
    /// Volatile in-memory database, primarily for tests
    InMemory,
}

/// Durable local repository of records plus the single-slot schema cache.
///
/// Cheap to clone; clones share the same underlying handle.
#[derive(Clone)]
pub struct RecordStore {
    location: StoreLocation,
    db: Arc<Mutex<Option<Database>>>,
}

impl RecordStore {
    /// Create an unopened store. No I/O happens until `initialize()`.
    #[must_use]
    pub fn new(location: StoreLocation) -> Self {
        Self {
            location,
            db: Arc::new(Mutex::new(None)),
        }
    }

    /// Convenience constructor for a file-backed store
    #[must_use]
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self::new(StoreLocation::Path(path.into()))
    }

    /// Open the database and run migrations. Idempotent: a second call
    /// returns without touching the existing handle.
    pub async fn initialize(&self) -> Result<()> {
        let mut guard = self.db.lock().await;
        if guard.is_some() {
            tracing::debug!("Record store already initialized");
            return Ok(());
        }

        let database = match &self.location {
            StoreLocation::Path(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                Database::open(path)?
            }
            StoreLocation::InMemory => Database::open_in_memory()?,
        };

        *guard = Some(database);
        tracing::info!("Record store initialized");
        Ok(())
    }

    /// Release the database handle. `initialize()` may be called again.
    pub async fn dispose(&self) {
        let mut guard = self.db.lock().await;
        guard.take();
    }

    async fn with_db<T>(&self, op: impl FnOnce(&Database) -> Result<T>) -> Result<T> {
        let guard = self.db.lock().await;
        let db = guard.as_ref().ok_or(Error::NotInitialized)?;
        op(db)
    }

    /// Persist a capture. A missing id is assigned; an existing id keeps its
    /// `created_at` and is overwritten. The record comes back `pending`.
    pub async fn upsert(
        &self,
        id: Option<RecordId>,
        fields: BTreeMap<String, FieldValue>,
    ) -> Result<Record> {
        let id = id.unwrap_or_default();
        self.with_db(|db| SqliteRecordRepository::new(db.connection()).upsert(&id, &fields))
            .await
    }

    /// Fetch a record by id
    pub async fn get(&self, id: &RecordId) -> Result<Option<Record>> {
        self.with_db(|db| SqliteRecordRepository::new(db.connection()).get(id))
            .await
    }

    /// All records, most recent first
    pub async fn list_all(&self) -> Result<Vec<Record>> {
        self.with_db(|db| SqliteRecordRepository::new(db.connection()).list_all())
            .await
    }

    /// Records awaiting sync, most recent first
    pub async fn list_pending(&self) -> Result<Vec<Record>> {
        self.with_db(|db| SqliteRecordRepository::new(db.connection()).list_pending())
            .await
    }

    /// Mark one record as accepted by the server. Unknown ids are a no-op.
    pub async fn mark_synced(&self, id: &RecordId) -> Result<()> {
        self.with_db(|db| SqliteRecordRepository::new(db.connection()).mark_synced(id))
            .await
    }

    /// Permanently delete a record
    pub async fn remove(&self, id: &RecordId) -> Result<()> {
        self.with_db(|db| SqliteRecordRepository::new(db.connection()).remove(id))
            .await
    }

    /// Size of the pending queue
    pub async fn pending_count(&self) -> Result<usize> {
        self.with_db(|db| SqliteRecordRepository::new(db.connection()).count_pending())
            .await
    }

    /// Overwrite the cached schema slot
    pub async fn cache_schema(
        &self,
        version: Option<i64>,
        elements: &[FieldDefinition],
    ) -> Result<()> {
        self.with_db(|db| SqliteSchemaCache::new(db.connection()).put(version, elements))
            .await
    }

    /// Read the cached schema, if one was ever fetched
    pub async fn cached_schema(&self) -> Result<Option<Schema>> {
        self.with_db(|db| SqliteSchemaCache::new(db.connection()).get())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn setup() -> RecordStore {
        let store = RecordStore::new(StoreLocation::InMemory);
        store.initialize().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_operations_before_initialize_fail() {
        let store = RecordStore::new(StoreLocation::InMemory);
        let result = store.list_all().await;
        assert!(matches!(result, Err(Error::NotInitialized)));
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let store = setup().await;
        store.upsert(None, BTreeMap::new()).await.unwrap();

        // Re-initializing must not re-create storage
        store.initialize().await.unwrap();
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dispose_releases_handle() {
        let store = setup().await;
        store.dispose().await;
        assert!(matches!(
            store.list_all().await,
            Err(Error::NotInitialized)
        ));

        store.initialize().await.unwrap();
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pending_count_tracks_mutations() {
        let store = setup().await;

        let first = store.upsert(None, BTreeMap::new()).await.unwrap();
        let second = store.upsert(None, BTreeMap::new()).await.unwrap();
        assert_eq!(
            store.pending_count().await.unwrap(),
            store.list_pending().await.unwrap().len()
        );

        store.mark_synced(&first.id).await.unwrap();
        assert_eq!(store.pending_count().await.unwrap(), 1);

        store.remove(&second.id).await.unwrap();
        assert_eq!(
            store.pending_count().await.unwrap(),
            store.list_pending().await.unwrap().len()
        );
        assert_eq!(store.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_upsert_assigns_id_and_keeps_it_stable() {
        let store = setup().await;

        let record = store.upsert(None, BTreeMap::new()).await.unwrap();
        let edited = store
            .upsert(Some(record.id), BTreeMap::new())
            .await
            .unwrap();
        assert_eq!(edited.id, record.id);
        assert_eq!(edited.created_at, record.created_at);
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_schema_cache_round_trip() {
        let store = setup().await;
        assert!(store.cached_schema().await.unwrap().is_none());

        let elements = Schema::default_embedded().elements;
        store.cache_schema(Some(7), &elements).await.unwrap();

        let cached = store.cached_schema().await.unwrap().unwrap();
        assert_eq!(cached.version, Some(7));
        assert_eq!(cached.elements, elements);
    }
}
