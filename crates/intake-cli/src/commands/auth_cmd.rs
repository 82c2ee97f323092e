use std::path::Path;

use intake_core::remote::CredentialProvider;

use crate::auth::FileCredentialStore;
use crate::commands::common::credential_path;
use crate::error::CliError;

pub fn run_login(token: &str, db_path: &Path) -> Result<(), CliError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(CliError::EmptyToken);
    }

    let store = FileCredentialStore::new(credential_path(db_path));
    store.save(token)?;
    println!("Token stored");
    Ok(())
}

pub fn run_logout(db_path: &Path) -> Result<(), CliError> {
    let store = FileCredentialStore::new(credential_path(db_path));
    store.clear();
    println!("Token cleared");
    Ok(())
}
