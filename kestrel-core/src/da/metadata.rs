// crates
use serde::{Deserialize, Serialize};
// internal
use crate::da::Digest;
use crate::wire;

/// Directory record published next to the shards, `shard_uris[i]` locates shard `i`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub shard_size: u64,
    pub parity_shard_count: usize,
    pub recovered_data_hash: Digest,
    pub recovered_data_size: u64,
    pub shard_uris: Vec<String>,
}

impl Metadata {
    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.shard_uris.len()
    }

    /// `None` when the record lists no more uris than parity shards.
    #[must_use]
    pub fn data_shard_count(&self) -> Option<usize> {
        self.shard_uris
            .len()
            .checked_sub(self.parity_shard_count)
            .filter(|count| *count > 0)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, wire::Error> {
        wire::serialize(self)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, wire::Error> {
        wire::deserialize(data)
    }
}
