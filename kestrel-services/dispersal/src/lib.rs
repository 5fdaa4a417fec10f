// std
use std::fmt::Debug;
use std::str::FromStr;
// crates
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
// internal
use kestrel_core::chain::{ChainContext, ChainError, DaMessage, TxHash};
use kestrel_core::codec::ErasureCodec;
use kestrel_core::da::{double_hash, recovered_data_hash, Metadata};
use kestrel_core::DynError;
use kestrel_da_storage::{Protocol, ShardStore, StorageError};

#[derive(thiserror::Error, Debug)]
pub enum PublishError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error("Data shard count must be positive")]
    NoDataShards,
    #[error("Shard count {total} is outside the allowed range [{min}, {max}]")]
    ShardCountOutOfBounds { total: usize, min: usize, max: usize },
    #[error("Shard size {shard_size} exceeds the maximum of {max}")]
    ShardSizeExceeded { shard_size: usize, max: usize },
    #[error("Erasure coding failed: {0}")]
    Codec(DynError),
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PublisherSettings {
    /// Address auditors can dial to reach this node's storage peer directly.
    #[serde(default)]
    pub data_source_info: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Published {
    pub tx_hash: TxHash,
    pub metadata_uri: String,
}

/// Erasure codes blobs, uploads their shards and metadata, and anchors the
/// shard commitments on chain.
pub struct Publisher<C> {
    codec: C,
    store: ShardStore,
    chain: ChainContext,
    settings: PublisherSettings,
}

impl<C> Publisher<C>
where
    C: ErasureCodec,
{
    pub const fn new(
        codec: C,
        store: ShardStore,
        chain: ChainContext,
        settings: PublisherSettings,
    ) -> Self {
        Self {
            codec,
            store,
            chain,
            settings,
        }
    }

    /// Nothing is written anywhere until every local check passed, and the chain
    /// message is only broadcast once shards and metadata are stored.
    #[instrument(skip(self, blob), fields(blob_size = blob.len()))]
    pub async fn publish(
        &self,
        blob: &[u8],
        data_shard_count: usize,
        parity_shard_count: usize,
        protocol: &str,
    ) -> Result<Published, PublishError> {
        let protocol = Protocol::from_str(protocol)?;
        self.store.registry().backend(protocol)?;
        if data_shard_count == 0 {
            return Err(PublishError::NoDataShards);
        }

        let recovered_data_hash = recovered_data_hash(blob);
        let recovered_data_size = blob.len() as u64;

        let params = self.chain.rpc().params().await?;
        let max = params.max_shard_count.min(self.codec.max_total_shards());
        let total = data_shard_count.saturating_add(parity_shard_count);
        if total < params.min_shard_count || total > max {
            return Err(PublishError::ShardCountOutOfBounds {
                total,
                min: params.min_shard_count,
                max,
            });
        }

        let encoded = self
            .codec
            .encode(blob, data_shard_count, parity_shard_count)
            .map_err(|e| PublishError::Codec(Box::new(e)))?;
        if encoded.shard_size > params.max_shard_size {
            return Err(PublishError::ShardSizeExceeded {
                shard_size: encoded.shard_size,
                max: params.max_shard_size,
            });
        }

        let shard_double_hashes = encoded
            .shards
            .iter()
            .map(|shard| double_hash(shard))
            .collect();
        let shard_uris = self
            .store
            .publish_shards(protocol, encoded.shards)
            .await?;
        debug!("Published {} shards to {protocol}", shard_uris.len());

        let metadata = Metadata {
            shard_size: encoded.shard_size as u64,
            parity_shard_count,
            recovered_data_hash,
            recovered_data_size,
            shard_uris,
        };
        let metadata_uri = self.store.publish_metadata(protocol, &metadata).await?;

        let message = DaMessage::PublishData {
            sender: self.chain.sender().to_owned(),
            metadata_uri: metadata_uri.clone(),
            parity_shard_count,
            shard_double_hashes,
            data_source_info: self.settings.data_source_info.clone(),
        };
        let tx_hash = self.chain.rpc().broadcast(message).await?;
        info!("Published {metadata_uri} in transaction {tx_hash}");

        Ok(Published {
            tx_hash,
            metadata_uri,
        })
    }
}
