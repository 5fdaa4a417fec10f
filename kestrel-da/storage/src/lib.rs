pub mod backends;
pub mod registry;
pub mod shards;

// std
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;
// crates
use bytes::Bytes;
use serde::{Deserialize, Serialize};
// internal
pub use registry::StorageRegistry;
pub use kestrel_utils::indexed::FailurePolicy;
pub use shards::{ShardStore, ShardStoreSettings};

/// Storage networks shards and metadata can be published to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Ipfs,
    Arweave,
}

impl Protocol {
    pub const ALL: [Self; 2] = [Self::Ipfs, Self::Arweave];

    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Ipfs => "ipfs",
            Self::Arweave => "arweave",
        }
    }

    #[must_use]
    pub const fn uri_scheme(self) -> &'static str {
        match self {
            Self::Ipfs => "ipfs://",
            Self::Arweave => "ar://",
        }
    }

    #[must_use]
    pub fn uri_for(self, id: &str) -> String {
        format!("{}{id}", self.uri_scheme())
    }

    /// Backend that owns `uri`, chosen by its scheme prefix.
    pub fn from_uri(uri: &str) -> Result<Self, StorageError> {
        Self::ALL
            .into_iter()
            .find(|protocol| uri.starts_with(protocol.uri_scheme()))
            .ok_or_else(|| StorageError::UnsupportedProtocol(uri.to_owned()))
    }

    /// Backend specific identifier carried by `uri`.
    pub fn object_id(self, uri: &str) -> Result<&str, StorageError> {
        uri.strip_prefix(self.uri_scheme())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StorageError::InvalidUri(uri.to_owned()))
    }
}

impl FromStr for Protocol {
    type Err = StorageError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|protocol| protocol.tag() == tag)
            .ok_or_else(|| StorageError::UnsupportedProtocol(tag.to_owned()))
    }
}

impl Display for Protocol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("Unsupported protocol: {0}")]
    UnsupportedProtocol(String),
    #[error("No backend configured for {0}")]
    BackendUnavailable(Protocol),
    #[error("Invalid uri: {0}")]
    InvalidUri(String),
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Retrieving {uri} timed out after {timeout:?}")]
    Timeout { uri: String, timeout: Duration },
    #[error("Backend error: {0}")]
    Backend(String),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Wire(#[from] kestrel_core::wire::Error),
    #[error("Storage worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    fn protocol(&self) -> Protocol;

    /// Stores `data` and returns the uri it can be retrieved from.
    async fn store(&self, data: Bytes) -> Result<String, StorageError>;

    async fn retrieve(&self, uri: &str) -> Result<Bytes, StorageError>;

    /// Dials the node a publisher advertised so its content resolves faster.
    async fn connect_source(&self, _source: &str) -> Result<(), StorageError> {
        Ok(())
    }
}
