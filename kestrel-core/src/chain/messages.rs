// crates
use serde::{Deserialize, Serialize};
// internal
use crate::da::{Digest, ShardIndex};
use crate::proofs::Proof;

/// Data availability messages this node broadcasts or scans blocks for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DaMessage {
    PublishData {
        sender: String,
        metadata_uri: String,
        parity_shard_count: usize,
        shard_double_hashes: Vec<Digest>,
        data_source_info: String,
    },
    ChallengeForFraud {
        sender: String,
        metadata_uri: String,
    },
    SubmitInvalidity {
        sender: String,
        metadata_uri: String,
        indices: Vec<ShardIndex>,
    },
    SubmitValidityProof {
        sender: String,
        validator_address: String,
        metadata_uri: String,
        indices: Vec<ShardIndex>,
        proofs: Vec<Proof>,
    },
}

impl DaMessage {
    #[must_use]
    pub fn metadata_uri(&self) -> &str {
        match self {
            Self::PublishData { metadata_uri, .. }
            | Self::ChallengeForFraud { metadata_uri, .. }
            | Self::SubmitInvalidity { metadata_uri, .. }
            | Self::SubmitValidityProof { metadata_uri, .. } => metadata_uri,
        }
    }
}
