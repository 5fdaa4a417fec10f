pub mod hashes;

// std
use std::fmt::Debug;
// crates
use tracing::{debug, instrument, warn};
// internal
pub use hashes::{HashKind, ShardHashes};
use kestrel_core::chain::ChainContext;
use kestrel_core::codec::ErasureCodec;
use kestrel_core::da::{double_hash, recovered_data_hash, Digest, ShardIndex};
use kestrel_core::DynError;
use kestrel_da_storage::{ShardStore, StorageError};
use kestrel_utils::indexed::FailurePolicy;

#[derive(thiserror::Error, Debug)]
pub enum RetrieveError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Metadata lists {shard_count} shards but {parity_shard_count} parity shards")]
    InvalidMetadata {
        shard_count: usize,
        parity_shard_count: usize,
    },
    #[error("Not enough shards to reconstruct: {available} of {required}")]
    InsufficientShards { available: usize, required: usize },
    #[error("Reconstructed data does not match its recovered data hash")]
    RecoveredDataMismatch,
    #[error("Erasure decoding failed: {0}")]
    Codec(DynError),
}

/// Reassembles blobs from their published metadata.
pub struct Retriever<C> {
    codec: C,
    store: ShardStore,
    chain: ChainContext,
}

impl<C> Retriever<C>
where
    C: ErasureCodec,
{
    pub const fn new(codec: C, store: ShardStore, chain: ChainContext) -> Self {
        Self {
            codec,
            store,
            chain,
        }
    }

    pub const fn store(&self) -> &ShardStore {
        &self.store
    }

    /// Shard fetch failures are tolerated as long as enough shards remain.
    /// When the chain holds commitments for `metadata_uri`, shards that do not
    /// match them count as missing.
    #[instrument(skip(self))]
    pub async fn retrieve(&self, metadata_uri: &str) -> Result<Vec<u8>, RetrieveError> {
        let metadata = self.store.fetch_metadata(metadata_uri).await?;
        let shard_count = metadata.shard_count();
        let data_shard_count =
            metadata
                .data_shard_count()
                .ok_or(RetrieveError::InvalidMetadata {
                    shard_count,
                    parity_shard_count: metadata.parity_shard_count,
                })?;

        let commitments = self.commitments(metadata_uri, shard_count).await;
        let indices: Vec<ShardIndex> = (0..shard_count).collect();
        let fetched = self
            .store
            .fetch_shards(&metadata.shard_uris, &indices, FailurePolicy::Tolerate)
            .await?;

        let mut shards: Vec<Option<Vec<u8>>> = vec![None; shard_count];
        for (index, shard) in fetched {
            if let Some(commitments) = &commitments {
                if double_hash(&shard) != commitments[index] {
                    warn!("Shard {index} of {metadata_uri} does not match its commitment");
                    continue;
                }
            }
            shards[index] = Some(shard.to_vec());
        }

        let available = shards.iter().filter(|shard| shard.is_some()).count();
        if available < data_shard_count {
            return Err(RetrieveError::InsufficientShards {
                available,
                required: data_shard_count,
            });
        }
        debug!("Reconstructing {metadata_uri} from {available} of {shard_count} shards");

        let blob = self
            .codec
            .decode(
                shards,
                data_shard_count,
                metadata.recovered_data_size as usize,
            )
            .map_err(|e| RetrieveError::Codec(Box::new(e)))?;
        if recovered_data_hash(&blob) != metadata.recovered_data_hash {
            return Err(RetrieveError::RecoveredDataMismatch);
        }
        Ok(blob)
    }

    /// Hashes of the shards at `indices`, in the order they were requested.
    /// Indices past the last shard are skipped.
    #[instrument(skip(self))]
    pub async fn shard_hashes(
        &self,
        metadata_uri: &str,
        indices: &[ShardIndex],
        kind: HashKind,
    ) -> Result<ShardHashes, RetrieveError> {
        let metadata = self.store.fetch_metadata(metadata_uri).await?;
        let requested: Vec<ShardIndex> = indices
            .iter()
            .copied()
            .filter(|index| {
                let in_range = *index < metadata.shard_count();
                if !in_range {
                    debug!("Skipping out of range shard index {index}");
                }
                in_range
            })
            .collect();

        let fetched = self
            .store
            .fetch_shards(&metadata.shard_uris, &requested, FailurePolicy::Abort)
            .await?;
        let (indices, hashes) = fetched
            .into_iter()
            .map(|(index, shard)| (index, kind.apply(&shard)))
            .unzip();

        Ok(ShardHashes {
            shard_size: metadata.shard_size,
            shard_uris: metadata.shard_uris,
            indices,
            hashes,
        })
    }

    async fn commitments(&self, metadata_uri: &str, shard_count: usize) -> Option<Vec<Digest>> {
        match self.chain.rpc().published_data(metadata_uri).await {
            Ok(Some(record)) if record.shard_double_hashes.len() == shard_count => {
                Some(record.shard_double_hashes)
            }
            Ok(Some(record)) => {
                warn!(
                    "Ignoring commitments of {metadata_uri}: {} on chain, {shard_count} in metadata",
                    record.shard_double_hashes.len()
                );
                None
            }
            Ok(None) => None,
            Err(err) => {
                warn!("Could not query commitments of {metadata_uri} due to {err:?}");
                None
            }
        }
    }
}
