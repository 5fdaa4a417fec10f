// std
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
// crates
use bytes::Bytes;
use tracing::{debug, warn};
// internal
use kestrel_core::chain::DaMessage;
use kestrel_core::da::{double_hash, Digest, ShardIndex};
use kestrel_da_storage::ShardStore;
use kestrel_utils::indexed::FailurePolicy;

/// A publish commitment picked up from a block, audited once and dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditTask {
    pub metadata_uri: String,
    pub shard_double_hashes: Vec<Digest>,
    pub parity_shard_count: usize,
    pub data_source_info: String,
}

impl AuditTask {
    /// Only publish messages carry something to audit.
    #[must_use]
    pub fn from_message(message: DaMessage) -> Option<Self> {
        match message {
            DaMessage::PublishData {
                metadata_uri,
                parity_shard_count,
                shard_double_hashes,
                data_source_info,
                ..
            } => Some(Self {
                metadata_uri,
                shard_double_hashes,
                parity_shard_count,
                data_source_info,
            }),
            _ => None,
        }
    }

    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.shard_double_hashes.len()
    }

    #[must_use]
    pub fn data_shard_count(&self) -> Option<usize> {
        self.shard_count()
            .checked_sub(self.parity_shard_count)
            .filter(|count| *count > 0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FraudReason {
    MetadataUnavailable(String),
    InvalidShardLayout { shard_count: usize, parity_shard_count: usize },
    ShardCountMismatch { committed: usize, listed: usize },
    ParityCountMismatch { committed: usize, listed: usize },
    InsufficientValidShards { valid: usize, required: usize },
}

impl Display for FraudReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MetadataUnavailable(err) => write!(f, "metadata unavailable: {err}"),
            Self::InvalidShardLayout {
                shard_count,
                parity_shard_count,
            } => write!(
                f,
                "{parity_shard_count} parity shards leave no data shard out of {shard_count}"
            ),
            Self::ShardCountMismatch { committed, listed } => write!(
                f,
                "{committed} shards committed but {listed} listed in metadata"
            ),
            Self::ParityCountMismatch { committed, listed } => write!(
                f,
                "{committed} parity shards committed but {listed} listed in metadata"
            ),
            Self::InsufficientValidShards { valid, required } => {
                write!(f, "only {valid} shards verify, {required} required")
            }
        }
    }
}

/// Shards that were fetched and matched their on-chain commitment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Evidence {
    pub shard_count: usize,
    pub valid_shards: BTreeMap<ShardIndex, Bytes>,
}

impl Evidence {
    #[must_use]
    pub fn is_valid(&self, index: ShardIndex) -> bool {
        self.valid_shards.contains_key(&index)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Fraud {
        reason: FraudReason,
        evidence: Evidence,
    },
    Valid(Evidence),
}

impl Verdict {
    #[must_use]
    pub const fn is_fraud(&self) -> bool {
        matches!(self, Self::Fraud { .. })
    }

    #[must_use]
    pub const fn evidence(&self) -> &Evidence {
        match self {
            Self::Fraud { evidence, .. } | Self::Valid(evidence) => evidence,
        }
    }
}

/// Re-derives shard commitments from independently fetched bytes and decides
/// whether the publisher's commitment is backed by recoverable data.
#[derive(Clone, Debug)]
pub struct ChallengeEngine {
    store: ShardStore,
}

impl ChallengeEngine {
    #[must_use]
    pub const fn new(store: ShardStore) -> Self {
        Self { store }
    }

    #[must_use]
    pub const fn store(&self) -> &ShardStore {
        &self.store
    }

    pub async fn decide(&self, task: &AuditTask) -> Verdict {
        let shard_count = task.shard_count();
        let fraud = |reason| Verdict::Fraud {
            reason,
            evidence: Evidence {
                shard_count,
                valid_shards: BTreeMap::new(),
            },
        };

        let metadata = match self.store.fetch_metadata(&task.metadata_uri).await {
            Ok(metadata) => metadata,
            Err(err) => return fraud(FraudReason::MetadataUnavailable(err.to_string())),
        };
        let Some(required) = task.data_shard_count() else {
            return fraud(FraudReason::InvalidShardLayout {
                shard_count,
                parity_shard_count: task.parity_shard_count,
            });
        };
        if metadata.shard_count() != shard_count {
            return fraud(FraudReason::ShardCountMismatch {
                committed: shard_count,
                listed: metadata.shard_count(),
            });
        }
        if metadata.parity_shard_count != task.parity_shard_count {
            return fraud(FraudReason::ParityCountMismatch {
                committed: task.parity_shard_count,
                listed: metadata.parity_shard_count,
            });
        }

        let indices: Vec<ShardIndex> = (0..shard_count).collect();
        let fetched = match self
            .store
            .fetch_shards(&metadata.shard_uris, &indices, FailurePolicy::Tolerate)
            .await
        {
            Ok(fetched) => fetched,
            Err(err) => return fraud(FraudReason::MetadataUnavailable(err.to_string())),
        };

        let mut valid_shards = BTreeMap::new();
        for (index, shard) in fetched {
            if double_hash(&shard) == task.shard_double_hashes[index] {
                valid_shards.insert(index, shard);
            } else {
                warn!(
                    "Shard {index} of {} does not match its commitment",
                    task.metadata_uri
                );
            }
        }
        debug!(
            "{} of {shard_count} shards of {} verified",
            valid_shards.len(),
            task.metadata_uri
        );

        let valid = valid_shards.len();
        let evidence = Evidence {
            shard_count,
            valid_shards,
        };
        if valid < required {
            Verdict::Fraud {
                reason: FraudReason::InsufficientValidShards { valid, required },
                evidence,
            }
        } else {
            Verdict::Valid(evidence)
        }
    }
}
