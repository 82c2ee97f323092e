use std::path::Path;

use crate::commands::common::{
    format_record_lines, open_store, parse_record_id, record_to_list_item, RecordListItem,
};
use crate::error::CliError;

pub async fn run_list(pending_only: bool, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let records = if pending_only {
        store.list_pending().await?
    } else {
        store.list_all().await?
    };

    if as_json {
        let items = records
            .iter()
            .map(record_to_list_item)
            .collect::<Vec<RecordListItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for line in format_record_lines(&records) {
            println!("{line}");
        }
    }

    store.dispose().await;
    Ok(())
}

pub async fn run_show(id: &str, db_path: &Path) -> Result<(), CliError> {
    let record_id = parse_record_id(id)?;
    let store = open_store(db_path).await?;

    let record = store
        .get(&record_id)
        .await?
        .ok_or_else(|| CliError::RecordNotFound(record_id.to_string()))?;
    println!("{}", serde_json::to_string_pretty(&record)?);

    store.dispose().await;
    Ok(())
}

pub async fn run_delete(id: &str, db_path: &Path) -> Result<(), CliError> {
    let record_id = parse_record_id(id)?;
    let store = open_store(db_path).await?;

    store
        .get(&record_id)
        .await?
        .ok_or_else(|| CliError::RecordNotFound(record_id.to_string()))?;
    store.remove(&record_id).await?;
    println!("{record_id}");

    store.dispose().await;
    Ok(())
}
