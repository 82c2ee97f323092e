use std::path::Path;

use intake_core::models::FieldDefinition;
use intake_core::remote::RemoteService;
use intake_core::schema_resolver::SchemaResolver;

use crate::commands::common::{build_remote, connectivity, open_store};
use crate::error::CliError;

pub async fn run_schema_show(
    offline: bool,
    api_url: Option<String>,
    db_path: &Path,
) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let remote = build_remote(api_url, db_path)?;
    let resolver = SchemaResolver::new(store.clone(), remote, connectivity(offline));

    let schema = resolver.resolve().await;
    println!("{}", serde_json::to_string_pretty(&schema)?);

    store.dispose().await;
    Ok(())
}

pub async fn run_schema_push(
    file: &Path,
    api_url: Option<String>,
    db_path: &Path,
) -> Result<(), CliError> {
    let raw = std::fs::read_to_string(file)?;
    let elements: Vec<FieldDefinition> = serde_json::from_str(&raw)?;
    if elements.is_empty() {
        return Err(CliError::Config(
            "schema file contains no field definitions".to_string(),
        ));
    }

    let remote = build_remote(api_url, db_path)?;
    let updated = remote.update_schema(&elements).await?;

    // Keep the local cache in step with what the server now serves
    let store = open_store(db_path).await?;
    store
        .cache_schema(updated.version, &updated.elements)
        .await?;
    store.dispose().await;

    match updated.version {
        Some(version) => println!("Schema updated to version {version}"),
        None => println!("Schema updated"),
    }
    Ok(())
}
