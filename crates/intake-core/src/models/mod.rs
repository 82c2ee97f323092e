//! Data models for Intake

mod record;
mod schema;

pub use record::{FieldValue, Record, RecordId, SyncStatus};
pub use schema::{Conditional, FieldDefinition, FieldType, Schema};
