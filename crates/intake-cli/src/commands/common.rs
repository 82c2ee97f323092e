use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use intake_core::connectivity::ConnectivityMonitor;
use intake_core::remote::HttpRemote;
use intake_core::{FieldType, FieldValue, Record, RecordId, RecordStore, Schema};

use crate::auth::FileCredentialStore;
use crate::error::CliError;

/// Fallback API base URL baked into the build
const DEFAULT_API_URL: &str = "https://intake-live.onrender.com/api";
const API_URL_ENV_VAR: &str = "INTAKE_API_URL";

#[derive(Debug, Serialize)]
pub struct RecordListItem {
    pub id: String,
    pub summary: String,
    pub sync_status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Resolve the database path: explicit flag, else the platform data dir
pub fn resolve_db_path(db_path: Option<PathBuf>) -> PathBuf {
    db_path.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("intake")
            .join("intake.db")
    })
}

/// Path of the stored bearer token, next to the database
pub fn credential_path(db_path: &Path) -> PathBuf {
    db_path.with_file_name("token")
}

/// Resolve the API base URL: explicit flag, else env, else built-in default
pub fn resolve_api_url(api_url: Option<String>) -> String {
    if let Some(url) = api_url {
        return url;
    }
    if let Ok(url) = env::var(API_URL_ENV_VAR) {
        if !url.trim().is_empty() {
            return url;
        }
    }
    DEFAULT_API_URL.to_string()
}

/// Open and initialize the record store
pub async fn open_store(db_path: &Path) -> Result<RecordStore, CliError> {
    let store = RecordStore::at_path(db_path);
    store.initialize().await?;
    Ok(store)
}

/// Build the HTTP remote with the file-backed credential store
pub fn build_remote(
    api_url: Option<String>,
    db_path: &Path,
) -> Result<Arc<HttpRemote<FileCredentialStore>>, CliError> {
    let credentials = FileCredentialStore::new(credential_path(db_path));
    let remote = HttpRemote::new(resolve_api_url(api_url), credentials)?;
    Ok(Arc::new(remote))
}

/// Connectivity as the CLI sees it: online unless `--offline` was passed.
/// A process invoked by hand has no link monitor to subscribe to, so the
/// flag stands in for the reachability probe.
pub fn connectivity(offline: bool) -> Arc<ConnectivityMonitor> {
    Arc::new(ConnectivityMonitor::new(!offline))
}

/// Parse `name=value` arguments against the active schema
pub fn parse_field_args(
    schema: &Schema,
    args: &[String],
) -> Result<std::collections::BTreeMap<String, FieldValue>, CliError> {
    if args.is_empty() {
        return Err(CliError::EmptyFields);
    }

    let mut values = std::collections::BTreeMap::new();
    for arg in args {
        let Some((name, raw)) = arg.split_once('=') else {
            return Err(CliError::InvalidFieldArg(arg.clone()));
        };
        let name = name.trim();
        let field = schema
            .elements
            .iter()
            .find(|field| field.name == name)
            .ok_or_else(|| CliError::UnknownField(name.to_string()))?;
        values.insert(name.to_string(), coerce_value(field.field_type, name, raw)?);
    }
    Ok(values)
}

/// Coerce a raw CLI string into the field's declared type
pub fn coerce_value(
    field_type: FieldType,
    name: &str,
    raw: &str,
) -> Result<FieldValue, CliError> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") {
        return Ok(FieldValue::Null);
    }

    match field_type {
        FieldType::Boolean => match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(FieldValue::Bool(true)),
            "false" | "no" | "0" => Ok(FieldValue::Bool(false)),
            _ => Err(CliError::InvalidFieldValue {
                field: name.to_string(),
                reason: format!("expected a boolean, got '{raw}'"),
            }),
        },
        FieldType::Number => raw
            .parse::<f64>()
            .map(FieldValue::Number)
            .map_err(|_| CliError::InvalidFieldValue {
                field: name.to_string(),
                reason: format!("expected a number, got '{raw}'"),
            }),
        FieldType::Text | FieldType::Date | FieldType::Select | FieldType::Textarea => {
            Ok(FieldValue::Text(raw.to_string()))
        }
    }
}

/// Parse and validate a record id argument
pub fn parse_record_id(raw: &str) -> Result<RecordId, CliError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CliError::EmptyRecordId);
    }
    raw.parse()
        .map_err(|_| CliError::InvalidRecordId(raw.to_string()))
}

/// Short human-readable digest of a record's fields
pub fn record_summary(record: &Record, max_fields: usize) -> String {
    let mut parts = Vec::new();
    for (name, value) in &record.fields {
        if parts.len() == max_fields {
            parts.push("...".to_string());
            break;
        }
        let rendered = match value {
            FieldValue::Null => continue,
            FieldValue::Bool(flag) => flag.to_string(),
            FieldValue::Number(number) => number.to_string(),
            FieldValue::Text(text) => text.clone(),
        };
        parts.push(format!("{name}={rendered}"));
    }
    if parts.is_empty() {
        "(no fields)".to_string()
    } else {
        parts.join(" ")
    }
}

pub fn record_to_list_item(record: &Record) -> RecordListItem {
    RecordListItem {
        id: record.id.to_string(),
        summary: record_summary(record, 3),
        sync_status: record.sync_status.as_str().to_string(),
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

/// One text line per record for the default list output
pub fn format_record_lines(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|record| {
            let marker = if record.is_pending() { "pending" } else { "synced " };
            format!("{} [{}] {}", record.id, marker, record_summary(record, 3))
        })
        .collect()
}
