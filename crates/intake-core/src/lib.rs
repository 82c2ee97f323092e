//! intake-core - Core library for Intake
//!
//! Offline-first capture engine: a durable local record store with a
//! pending-queue sync protocol, and a remotely-defined form schema with
//! three-tier fallback and conditional field visibility. UI layers consume
//! this crate through [`store::RecordStore`], [`schema_resolver::SchemaResolver`],
//! the [`form`] functions, and [`sync::SyncCoordinator`].

pub mod connectivity;
pub mod db;
pub mod error;
pub mod form;
pub mod models;
pub mod remote;
pub mod schema_resolver;
pub mod store;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Error, Result};
pub use models::{FieldDefinition, FieldType, FieldValue, Record, RecordId, Schema, SyncStatus};
pub use store::{RecordStore, StoreLocation};
