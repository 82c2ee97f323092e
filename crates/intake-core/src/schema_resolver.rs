//! Schema resolver: remote → cache → embedded default.
//!
//! Produces the schema the form should render. The fallback order is fixed:
//! a reachable remote always wins (and refreshes the cache, even when the
//! version is unchanged), the cache beats the default, and the embedded
//! default is the floor. Exactly one whole schema is returned; schemas are
//! never merged.

use std::sync::Arc;

use crate::connectivity::Connectivity;
use crate::models::Schema;
use crate::remote::RemoteService;
use crate::store::RecordStore;

/// Deterministic three-tier schema fallback
pub struct SchemaResolver<R, C> {
    store: RecordStore,
    remote: Arc<R>,
    connectivity: Arc<C>,
}

impl<R, C> SchemaResolver<R, C>
where
    R: RemoteService,
    C: Connectivity,
{
    /// Create a resolver over the given store and remote service
    pub fn new(store: RecordStore, remote: Arc<R>, connectivity: Arc<C>) -> Self {
        Self {
            store,
            remote,
            connectivity,
        }
    }

    /// Resolve the active schema. Never fails: every fetch, parse, or cache
    /// error degrades to the next tier.
    pub async fn resolve(&self) -> Schema {
        if self.connectivity.is_online().await {
            match self.remote.fetch_schema().await {
                Ok(schema) => {
                    if let Err(error) = self
                        .store
                        .cache_schema(schema.version, &schema.elements)
                        .await
                    {
                        tracing::warn!(%error, "Failed to cache fetched schema");
                    }
                    return schema;
                }
                Err(error) => {
                    tracing::warn!(%error, "Remote schema fetch failed; falling back");
                }
            }
        }

        match self.store.cached_schema().await {
            Ok(Some(cached)) => return cached,
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(%error, "Schema cache read failed; using default");
            }
        }

        tracing::debug!("Using embedded default schema");
        Schema::default_embedded()
    }
}
