//! Rollkit data availability surface. Blob ids are the raw bytes of the
//! blob's metadata uri.

// std
use std::sync::Arc;
// crates
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
// internal
use kestrel_core::codec::ErasureCodec;
use kestrel_da_storage::Protocol;
use kestrel_dispersal::{PublishError, Publisher};
use kestrel_retrieval::{RetrieveError, Retriever};

pub type BlobId = Vec<u8>;

const DEFAULT_MAX_BLOB_SIZE: u64 = 64 * 64 * 500;

const fn default_max_blob_size() -> u64 {
    DEFAULT_MAX_BLOB_SIZE
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RollkitSettings {
    pub data_shard_count: usize,
    pub parity_shard_count: usize,
    #[serde(default = "default_max_blob_size")]
    pub max_blob_size: u64,
}

impl Default for RollkitSettings {
    fn default() -> Self {
        Self {
            data_shard_count: 4,
            parity_shard_count: 2,
            max_blob_size: DEFAULT_MAX_BLOB_SIZE,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RollkitError {
    #[error("Blob {index} is {size} bytes, the limit is {max}")]
    BlobTooLarge { index: usize, size: u64, max: u64 },
    #[error("Blob id {index} is not a metadata uri")]
    InvalidId { index: usize },
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error(transparent)]
    Retrieve(#[from] RetrieveError),
}

pub struct RollkitStore<C> {
    publisher: Arc<Publisher<C>>,
    retriever: Arc<Retriever<C>>,
    settings: RollkitSettings,
}

impl<C> RollkitStore<C>
where
    C: ErasureCodec,
{
    pub const fn new(
        publisher: Arc<Publisher<C>>,
        retriever: Arc<Retriever<C>>,
        settings: RollkitSettings,
    ) -> Self {
        Self {
            publisher,
            retriever,
            settings,
        }
    }

    #[must_use]
    pub const fn max_blob_size(&self) -> u64 {
        self.settings.max_blob_size
    }

    /// Publishes every blob on ipfs in order. Sizes are checked for the whole
    /// batch first, so an oversized blob leaves nothing published.
    #[instrument(skip_all, fields(blobs = blobs.len()))]
    pub async fn submit(&self, blobs: &[Vec<u8>]) -> Result<Vec<BlobId>, RollkitError> {
        for (index, blob) in blobs.iter().enumerate() {
            let size = blob.len() as u64;
            if size > self.settings.max_blob_size {
                return Err(RollkitError::BlobTooLarge {
                    index,
                    size,
                    max: self.settings.max_blob_size,
                });
            }
        }

        let mut ids = Vec::with_capacity(blobs.len());
        for blob in blobs {
            let published = self
                .publisher
                .publish(
                    blob,
                    self.settings.data_shard_count,
                    self.settings.parity_shard_count,
                    Protocol::Ipfs.tag(),
                )
                .await
                .inspect_err(|e| error!("Failed to publish rollkit blob: {e}"))?;
            ids.push(published.metadata_uri.into_bytes());
        }
        info!("Submitted {} rollkit blobs", ids.len());
        Ok(ids)
    }

    #[instrument(skip_all, fields(ids = ids.len()))]
    pub async fn get(&self, ids: &[BlobId]) -> Result<Vec<Vec<u8>>, RollkitError> {
        let mut blobs = Vec::with_capacity(ids.len());
        for (index, id) in ids.iter().enumerate() {
            let metadata_uri =
                std::str::from_utf8(id).map_err(|_| RollkitError::InvalidId { index })?;
            blobs.push(self.retriever.retrieve(metadata_uri).await?);
        }
        Ok(blobs)
    }
}
