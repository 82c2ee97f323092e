//! Remote service client: schema fetch/update and batch record submission.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{FieldDefinition, Record, RecordId, Schema};

/// Network timeout for every remote call
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Injected capability providing the bearer credential for authenticated
/// endpoints. The engine never reads ambient storage itself.
pub trait CredentialProvider: Send + Sync {
    /// Current bearer token, if one is stored
    fn token(&self) -> Option<String>;

    /// Forget the stored token
    fn clear(&self);
}

/// One accepted record id in a sync response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedRecord {
    pub id: RecordId,
}

/// One rejected record in a sync response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRecord {
    pub id: RecordId,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Per-record outcome lists of a batch submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResults {
    #[serde(default)]
    pub success: Vec<AcceptedRecord>,
    #[serde(default)]
    pub failed: Vec<RejectedRecord>,
}

/// Server response to a batch submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub total: usize,
    pub successful: usize,
    #[serde(default)]
    pub results: SyncResults,
}

/// The remote endpoints the engine consumes
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// `GET /schema`
    async fn fetch_schema(&self) -> Result<Schema>;

    /// `POST /sync` with the full pending batch
    async fn submit_batch(&self, records: &[Record]) -> Result<SyncReport>;

    /// `POST /schema` (authenticated) replacing the remote schema
    async fn update_schema(&self, elements: &[FieldDefinition]) -> Result<Schema>;
}

/// HTTP implementation of `RemoteService`
#[derive(Clone)]
pub struct HttpRemote<C> {
    base_url: String,
    client: reqwest::Client,
    credentials: C,
}

impl<C: CredentialProvider> HttpRemote<C> {
    /// Build a client against the given API base URL (e.g. `https://host/api`)
    pub fn new(base_url: impl Into<String>, credentials: C) -> Result<Self> {
        let base_url = normalize_endpoint(base_url.into())?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url,
            client,
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(Error::Remote {
            status: status.as_u16(),
            message: parse_api_error(status, &body),
        })
    }
}

#[async_trait]
impl<C: CredentialProvider> RemoteService for HttpRemote<C> {
    async fn fetch_schema(&self) -> Result<Schema> {
        let response = self.client.get(self.url("schema")).send().await?;
        let schema = Self::check(response).await?.json::<Schema>().await?;
        tracing::debug!(version = ?schema.version, "Fetched remote schema");
        Ok(schema)
    }

    async fn submit_batch(&self, records: &[Record]) -> Result<SyncReport> {
        let response = self
            .client
            .post(self.url("sync"))
            .json(&serde_json::json!({ "records": records }))
            .send()
            .await?;
        let report = Self::check(response).await?.json::<SyncReport>().await?;
        tracing::debug!(
            total = report.total,
            successful = report.successful,
            "Batch submission acknowledged"
        );
        Ok(report)
    }

    async fn update_schema(&self, elements: &[FieldDefinition]) -> Result<Schema> {
        let token = self.credentials.token().ok_or(Error::MissingCredential)?;
        let response = self
            .client
            .post(self.url("schema"))
            .bearer_auth(token)
            .json(&serde_json::json!({ "elements": elements }))
            .send()
            .await?;
        Self::check(response).await?.json::<Schema>().await.map_err(Into::into)
    }
}

/// Error body shape the API uses for failures
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return message.trim().to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        trimmed.to_string()
    }
}

fn normalize_endpoint(raw: String) -> Result<String> {
    let endpoint = raw.trim();
    if endpoint.is_empty() {
        return Err(Error::InvalidInput(
            "API base URL must not be empty".to_string(),
        ));
    }
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Ok(endpoint.trim_end_matches('/').to_string())
    } else {
        Err(Error::InvalidInput(
            "API base URL must include http:// or https://".to_string(),
        ))
    }
}
