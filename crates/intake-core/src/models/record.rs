//! Record model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A unique identifier for a record, generated client-side (UUID v4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Create a new random record ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A scalar field value as captured by a form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Explicit null / no answer
    Null,
    /// Boolean toggle
    Bool(bool),
    /// Numeric value
    Number(f64),
    /// Free text or select option
    Text(String),
}

impl FieldValue {
    /// Whether this value counts as absent for required-field validation.
    ///
    /// Null and whitespace-only text are absent; `false` and `0` are not.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Synchronization state of a record.
///
/// Monotonic per submission: records are created `Pending` and move to
/// `Synced` only on confirmed server acceptance. The reverse transition is
/// never taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Pending,
    Synced,
}

impl SyncStatus {
    /// Storage encoding of the status
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Synced => "synced",
        }
    }
}

impl FromStr for SyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "synced" => Ok(Self::Synced),
            other => Err(format!("unknown sync status: {other}")),
        }
    }
}

/// A captured entity: field values plus sync bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Unique identifier, stable across edits
    pub id: RecordId,
    /// Field name -> scalar value, shaped by the schema active at capture time
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    /// Synchronization state
    pub sync_status: SyncStatus,
    /// Creation timestamp (Unix ms), set once at first persistence
    pub created_at: i64,
    /// Last persistence timestamp (Unix ms)
    pub updated_at: i64,
}

impl Record {
    /// Create a new pending record with the given field values
    #[must_use]
    pub fn new(fields: BTreeMap<String, FieldValue>) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: RecordId::new(),
            fields,
            sync_status: SyncStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the record still awaits server acceptance
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.sync_status, SyncStatus::Pending)
    }
}
