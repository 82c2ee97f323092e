//! Database layer for Intake

mod connection;
mod migrations;
mod record_repository;
mod schema_cache;

pub use connection::Database;
pub use record_repository::{RecordRepository, SqliteRecordRepository};
pub use schema_cache::{SchemaCacheRepository, SqliteSchemaCache};
