pub mod messages;
#[cfg(feature = "mock")]
pub mod mock;

// std
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
// crates
use serde::{Deserialize, Serialize};
// internal
use crate::da::PublishedData;
use crate::DynError;
pub use messages::DaMessage;

pub type TxHash = String;

/// Chain-side bounds applied to every publish.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaParams {
    pub min_shard_count: usize,
    pub max_shard_count: usize,
    pub max_shard_size: usize,
}

#[derive(thiserror::Error, Debug)]
pub enum ChainError {
    #[error("Chain query failed: {0}")]
    Query(String),
    #[error("Transaction rejected: {0}")]
    Rejected(String),
    #[error(transparent)]
    Transport(DynError),
}

/// Query and broadcast surface of the chain node. Signing happens behind it.
#[async_trait::async_trait]
pub trait ChainRpc: Send + Sync {
    async fn params(&self) -> Result<DaParams, ChainError>;
    async fn published_data(&self, metadata_uri: &str)
        -> Result<Option<PublishedData>, ChainError>;
    /// Number of shards a validator must prove for a record of `shard_count` shards.
    async fn proof_threshold(&self, shard_count: usize) -> Result<usize, ChainError>;
    async fn proof_deputy(&self, validator: &str) -> Result<Option<String>, ChainError>;
    async fn has_validity_proof(
        &self,
        metadata_uri: &str,
        validator: &str,
    ) -> Result<bool, ChainError>;
    async fn broadcast(&self, message: DaMessage) -> Result<TxHash, ChainError>;
    async fn latest_height(&self) -> Result<u64, ChainError>;
    async fn block_messages(&self, height: u64) -> Result<Vec<DaMessage>, ChainError>;
}

/// Chain handle and account identities shared by every component of the node.
#[derive(Clone)]
pub struct ChainContext {
    rpc: Arc<dyn ChainRpc>,
    sender: String,
    validator: Option<String>,
}

impl ChainContext {
    pub fn new(rpc: Arc<dyn ChainRpc>, sender: impl Into<String>) -> Self {
        Self {
            rpc,
            sender: sender.into(),
            validator: None,
        }
    }

    #[must_use]
    pub fn with_validator(mut self, validator: impl Into<String>) -> Self {
        self.validator = Some(validator.into());
        self
    }

    pub fn rpc(&self) -> &dyn ChainRpc {
        self.rpc.as_ref()
    }

    /// Account signing the messages this node broadcasts.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn validator(&self) -> Option<&str> {
        self.validator.as_deref()
    }
}

impl Debug for ChainContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainContext")
            .field("sender", &self.sender)
            .field("validator", &self.validator)
            .finish()
    }
}
