use std::path::Path;

use intake_core::form;
use intake_core::schema_resolver::SchemaResolver;

use crate::commands::common::{build_remote, connectivity, open_store, parse_field_args};
use crate::error::CliError;

pub async fn run_add(
    field_args: &[String],
    offline: bool,
    api_url: Option<String>,
    db_path: &Path,
) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let remote = build_remote(api_url, db_path)?;
    let resolver = SchemaResolver::new(store.clone(), remote, connectivity(offline));

    let schema = resolver.resolve().await;
    let values = parse_field_args(&schema, field_args)?;
    let prepared =
        form::prepare_submission(&schema, values, chrono::Local::now().date_naive())?;

    let record = store.upsert(None, prepared).await?;
    let pending = store.pending_count().await?;
    println!("{}", record.id);
    eprintln!("Saved locally; {pending} record(s) awaiting sync");

    store.dispose().await;
    Ok(())
}
