// std
use std::sync::Arc;
use std::time::Duration;
// crates
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;
// internal
use crate::{Protocol, StorageError, StorageRegistry};
use kestrel_core::da::{Metadata, ShardIndex};
use kestrel_utils::indexed::{join_indexed, FailurePolicy};

const DEFAULT_RETRIEVE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShardStoreSettings {
    /// Upper bound for a single retrieval, elapsing counts as a fetch failure.
    #[serde(with = "humantime_serde")]
    pub retrieve_timeout: Duration,
}

impl Default for ShardStoreSettings {
    fn default() -> Self {
        Self {
            retrieve_timeout: DEFAULT_RETRIEVE_TIMEOUT,
        }
    }
}

/// Shard and metadata publishing and fetching on top of the configured backends.
#[derive(Clone, Debug)]
pub struct ShardStore {
    registry: StorageRegistry,
    settings: ShardStoreSettings,
}

impl ShardStore {
    #[must_use]
    pub const fn new(registry: StorageRegistry, settings: ShardStoreSettings) -> Self {
        Self { registry, settings }
    }

    #[must_use]
    pub const fn registry(&self) -> &StorageRegistry {
        &self.registry
    }

    /// Uploads every shard concurrently. The returned uris are in shard order,
    /// and a single failed upload fails the whole call.
    pub async fn publish_shards(
        &self,
        protocol: Protocol,
        shards: Vec<Vec<u8>>,
    ) -> Result<Vec<String>, StorageError> {
        let backend = self.registry.backend(protocol)?;
        let uris = join_indexed(shards, FailurePolicy::Abort, |index, shard| {
            let backend = Arc::clone(&backend);
            async move {
                let uri = backend.store(Bytes::from(shard)).await?;
                debug!("Stored shard {index} at {uri}");
                Ok::<_, StorageError>(uri)
            }
        })
        .await?;
        Ok(uris.into_iter().map(|(_, uri)| uri).collect())
    }

    pub async fn publish_metadata(
        &self,
        protocol: Protocol,
        metadata: &Metadata,
    ) -> Result<String, StorageError> {
        let backend = self.registry.backend(protocol)?;
        let bytes = metadata.to_bytes()?;
        backend.store(Bytes::from(bytes)).await
    }

    pub async fn retrieve(&self, uri: &str) -> Result<Bytes, StorageError> {
        let backend = self.registry.backend_for_uri(uri)?;
        let timeout = self.settings.retrieve_timeout;
        tokio::time::timeout(timeout, backend.retrieve(uri))
            .await
            .map_err(|_| StorageError::Timeout {
                uri: uri.to_owned(),
                timeout,
            })?
    }

    pub async fn fetch_metadata(&self, uri: &str) -> Result<Metadata, StorageError> {
        let bytes = self.retrieve(uri).await?;
        Ok(Metadata::from_bytes(&bytes)?)
    }

    /// Fetches the shards at `indices` concurrently. Results follow the order
    /// of `indices`; under [`FailurePolicy::Tolerate`] failed shards are left out.
    pub async fn fetch_shards(
        &self,
        shard_uris: &[String],
        indices: &[ShardIndex],
        policy: FailurePolicy,
    ) -> Result<Vec<(ShardIndex, Bytes)>, StorageError> {
        let targets = indices
            .iter()
            .map(|&index| {
                shard_uris
                    .get(index)
                    .map(|uri| (index, uri.clone()))
                    .ok_or_else(|| StorageError::NotFound(format!("shard {index}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let shards = join_indexed(targets, policy, |_, (index, uri)| {
            let store = self.clone();
            async move {
                let shard = store.retrieve(&uri).await?;
                Ok::<_, StorageError>((index, shard))
            }
        })
        .await?;
        Ok(shards.into_iter().map(|(_, shard)| shard).collect())
    }

    /// Asks the backend owning `uri` to dial the publisher's storage node.
    pub async fn connect_source(&self, uri: &str, source: &str) -> Result<(), StorageError> {
        if source.is_empty() {
            return Ok(());
        }
        self.registry.backend_for_uri(uri)?.connect_source(source).await
    }
}
