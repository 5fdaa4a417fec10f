// crates
use serde::{Deserialize, Serialize};
// internal
use kestrel_core::da::{double_hash, hash, Digest, ShardIndex};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashKind {
    Single,
    #[default]
    Double,
}

impl HashKind {
    #[must_use]
    pub fn apply(self, shard: &[u8]) -> Digest {
        match self {
            Self::Single => hash(shard),
            Self::Double => double_hash(shard),
        }
    }
}

/// Spot-check answer: `hashes[i]` belongs to shard `indices[i]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardHashes {
    pub shard_size: u64,
    pub shard_uris: Vec<String>,
    pub indices: Vec<ShardIndex>,
    pub hashes: Vec<Digest>,
}
