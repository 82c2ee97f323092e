use std::path::Path;

use intake_core::sync::SyncCoordinator;

use crate::commands::common::{build_remote, connectivity, open_store};
use crate::error::CliError;

pub async fn run_sync(
    offline: bool,
    api_url: Option<String>,
    db_path: &Path,
) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let remote = build_remote(api_url, db_path)?;
    let coordinator = SyncCoordinator::new(store.clone(), remote, connectivity(offline));

    let outcome = coordinator.trigger().await?;
    println!("{outcome}");

    coordinator.shutdown();
    store.dispose().await;
    Ok(())
}
