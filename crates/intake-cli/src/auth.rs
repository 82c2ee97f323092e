//! File-backed bearer credential store.
//!
//! The core treats credentials as an injected capability; the CLI keeps a
//! single token in a plain file under the data directory. The
//! `INTAKE_TOKEN` environment variable overrides the stored token.

use std::path::PathBuf;

use intake_core::remote::CredentialProvider;

const TOKEN_ENV_VAR: &str = "INTAKE_TOKEN";

#[derive(Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Persist a token for later authenticated calls
    pub fn save(&self, token: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token.trim())
    }
}

impl CredentialProvider for FileCredentialStore {
    fn token(&self) -> Option<String> {
        if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
            let token = token.trim().to_string();
            if !token.is_empty() {
                return Some(token);
            }
        }

        std::fs::read_to_string(&self.path)
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|token| !token.is_empty())
    }

    fn clear(&self) {
        if let Err(error) = std::fs::remove_file(&self.path) {
            if error.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(%error, "Failed to remove stored token");
            }
        }
    }
}
