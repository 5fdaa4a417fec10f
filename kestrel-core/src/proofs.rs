// crates
use serde::{Deserialize, Serialize};
// internal
use crate::da::{hash, Digest};
use crate::DynError;

pub type Proof = Vec<u8>;

/// Public inputs of a shard validity proof.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardWitness {
    pub shard_hash: Digest,
    pub shard_double_hash: Digest,
}

impl ShardWitness {
    #[must_use]
    pub fn from_shard(shard: &[u8]) -> Self {
        let shard_hash = hash(shard);
        Self {
            shard_hash,
            shard_double_hash: hash(&shard_hash),
        }
    }

    /// A witness is well formed when its second hash derives from the first.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        hash(&self.shard_hash) == self.shard_double_hash
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ProverError {
    #[error("Malformed witness: {0}")]
    MalformedWitness(String),
    #[error("Proving key is not available")]
    MissingProvingKey,
    #[error(transparent)]
    Backend(DynError),
}

#[async_trait::async_trait]
pub trait Prover: Send + Sync {
    async fn prove(&self, witness: &ShardWitness) -> Result<Proof, ProverError>;
}

#[cfg(feature = "mock")]
pub mod mock {
    // std
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    // internal
    use super::{Proof, Prover, ProverError, ShardWitness};
    use crate::da::hash;

    /// Produces `H(shard_hash || shard_double_hash)` as a stand-in proof.
    #[derive(Default)]
    pub struct MockProver {
        missing_key: AtomicBool,
        proved: AtomicUsize,
    }

    impl MockProver {
        #[must_use]
        pub fn without_key() -> Self {
            Self {
                missing_key: AtomicBool::new(true),
                proved: AtomicUsize::new(0),
            }
        }

        pub fn proved(&self) -> usize {
            self.proved.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl Prover for MockProver {
        async fn prove(&self, witness: &ShardWitness) -> Result<Proof, ProverError> {
            if self.missing_key.load(Ordering::SeqCst) {
                return Err(ProverError::MissingProvingKey);
            }
            if !witness.is_consistent() {
                return Err(ProverError::MalformedWitness(const_hex::encode(
                    witness.shard_hash,
                )));
            }
            self.proved.fetch_add(1, Ordering::SeqCst);
            let mut input = witness.shard_hash.to_vec();
            input.extend_from_slice(&witness.shard_double_hash);
            Ok(hash(&input).to_vec())
        }
    }
}
