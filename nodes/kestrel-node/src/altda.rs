//! Rollup-facing store: blobs go in, opaque commitments come out.

// std
use std::sync::Arc;
// crates
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
// internal
use kestrel_core::altda::{decode_commitment, encode_commitment, CommitmentError};
use kestrel_core::codec::ErasureCodec;
use kestrel_da_storage::Protocol;
use kestrel_dispersal::{PublishError, Publisher};
use kestrel_retrieval::{RetrieveError, Retriever};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AltDaSettings {
    pub data_shard_count: usize,
    pub parity_shard_count: usize,
}

impl Default for AltDaSettings {
    fn default() -> Self {
        Self {
            data_shard_count: 4,
            parity_shard_count: 2,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AltDaError {
    #[error(transparent)]
    Commitment(#[from] CommitmentError),
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error(transparent)]
    Retrieve(#[from] RetrieveError),
}

pub struct AltDaStore<C> {
    publisher: Arc<Publisher<C>>,
    retriever: Arc<Retriever<C>>,
    settings: AltDaSettings,
}

impl<C> AltDaStore<C>
where
    C: ErasureCodec,
{
    pub const fn new(
        publisher: Arc<Publisher<C>>,
        retriever: Arc<Retriever<C>>,
        settings: AltDaSettings,
    ) -> Self {
        Self {
            publisher,
            retriever,
            settings,
        }
    }

    /// Publishes `blob` on ipfs and wraps its metadata uri in a commitment.
    #[instrument(skip_all, fields(blob_size = blob.len()))]
    pub async fn put(&self, blob: &[u8]) -> Result<Vec<u8>, AltDaError> {
        let published = self
            .publisher
            .publish(
                blob,
                self.settings.data_shard_count,
                self.settings.parity_shard_count,
                Protocol::Ipfs.tag(),
            )
            .await?;
        debug!("Stored rollup blob at {}", published.metadata_uri);
        Ok(encode_commitment(&published.metadata_uri))
    }

    #[instrument(skip_all)]
    pub async fn get(&self, commitment: &[u8]) -> Result<Vec<u8>, AltDaError> {
        let metadata_uri = decode_commitment(commitment)?;
        Ok(self.retriever.retrieve(&metadata_uri).await?)
    }
}
