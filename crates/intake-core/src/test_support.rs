//! In-memory fakes shared by the resolver and coordinator tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{FieldDefinition, Record, RecordId, Schema};
use crate::remote::{AcceptedRecord, RejectedRecord, RemoteService, SyncReport, SyncResults};

enum AcceptMode {
    All,
    Only(Vec<RecordId>),
    Fail,
}

/// Scriptable stand-in for the remote HTTP service
pub struct FakeRemote {
    schema: Mutex<Option<Schema>>,
    accept: Mutex<AcceptMode>,
    rejected: Mutex<Vec<(RecordId, String)>>,
    delay: Mutex<Option<Duration>>,
    fetch_calls: AtomicUsize,
    submit_calls: AtomicUsize,
}

impl Default for FakeRemote {
    fn default() -> Self {
        Self {
            schema: Mutex::new(None),
            accept: Mutex::new(AcceptMode::All),
            rejected: Mutex::new(Vec::new()),
            delay: Mutex::new(None),
            fetch_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
        }
    }
}

impl FakeRemote {
    pub fn serve_schema(&self, schema: Schema) {
        *self.schema.lock().unwrap() = Some(schema);
    }

    pub fn fail_schema_fetches(&self) {
        *self.schema.lock().unwrap() = None;
    }

    pub fn accept_all(&self) {
        *self.accept.lock().unwrap() = AcceptMode::All;
    }

    pub fn accept_only(&self, ids: &[RecordId]) {
        *self.accept.lock().unwrap() = AcceptMode::Only(ids.to_vec());
    }

    pub fn reject(&self, id: RecordId, reason: &str) {
        self.rejected.lock().unwrap().push((id, reason.to_string()));
    }

    pub fn fail_submissions(&self) {
        *self.accept.lock().unwrap() = AcceptMode::Fail;
    }

    pub fn delay_submissions(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteService for FakeRemote {
    async fn fetch_schema(&self) -> Result<Schema> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let schema = self.schema.lock().unwrap().clone();
        schema.ok_or(Error::Remote {
            status: 503,
            message: "schema unavailable".to_string(),
        })
    }

    async fn submit_batch(&self, records: &[Record]) -> Result<SyncReport> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let success: Vec<AcceptedRecord> = {
            let accept = self.accept.lock().unwrap();
            match &*accept {
                AcceptMode::Fail => {
                    return Err(Error::Remote {
                        status: 503,
                        message: "service unavailable".to_string(),
                    })
                }
                AcceptMode::All => records
                    .iter()
                    .map(|record| AcceptedRecord { id: record.id })
                    .collect(),
                AcceptMode::Only(ids) => records
                    .iter()
                    .filter(|record| ids.contains(&record.id))
                    .map(|record| AcceptedRecord { id: record.id })
                    .collect(),
            }
        };

        let failed: Vec<RejectedRecord> = self
            .rejected
            .lock()
            .unwrap()
            .iter()
            .map(|(id, reason)| RejectedRecord {
                id: *id,
                reason: Some(reason.clone()),
            })
            .collect();

        Ok(SyncReport {
            total: records.len(),
            successful: success.len(),
            results: SyncResults { success, failed },
        })
    }

    async fn update_schema(&self, elements: &[FieldDefinition]) -> Result<Schema> {
        Ok(Schema {
            version: Some(99),
            elements: elements.to_vec(),
        })
    }
}
