// crates
use serde::{Deserialize, Serialize};
// internal
use crate::da::Digest;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishedDataStatus {
    Pending,
    VoteExtensionPassed,
    Challenging,
    Resolved,
}

impl PublishedDataStatus {
    /// Records are only audited once the vote extension period is over.
    #[must_use]
    pub const fn is_auditable(self) -> bool {
        matches!(self, Self::VoteExtensionPassed | Self::Challenging)
    }
}

/// On-chain record of a publish, read-only to this node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedData {
    pub metadata_uri: String,
    pub shard_double_hashes: Vec<Digest>,
    pub parity_shard_count: usize,
    pub data_source_info: String,
    pub status: PublishedDataStatus,
}

impl PublishedData {
    #[must_use]
    pub fn data_shard_count(&self) -> Option<usize> {
        self.shard_double_hashes
            .len()
            .checked_sub(self.parity_shard_count)
            .filter(|count| *count > 0)
    }
}
