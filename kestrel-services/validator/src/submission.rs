// crates
use tracing::{info, warn};
// internal
use crate::engine::Evidence;
use kestrel_core::chain::{ChainContext, ChainError, DaMessage, TxHash};
use kestrel_core::da::ShardIndex;
use kestrel_core::proofs::{Prover, ProverError, ShardWitness};

#[derive(thiserror::Error, Debug)]
pub enum SubmitError {
    #[error("No validator address configured")]
    NoValidator,
    #[error("Failed to prove shard {index}: {source}")]
    Prover {
        index: ShardIndex,
        #[source]
        source: ProverError,
    },
    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// What was sent for one audited commitment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Submission {
    pub proved: Vec<ShardIndex>,
    pub unprovable: Vec<ShardIndex>,
    pub validity_tx: Option<TxHash>,
    pub invalidity_tx: Option<TxHash>,
}

pub struct ProofSubmitter<P> {
    prover: P,
    chain: ChainContext,
}

impl<P> ProofSubmitter<P>
where
    P: Prover,
{
    pub const fn new(prover: P, chain: ChainContext) -> Self {
        Self { prover, chain }
    }

    /// Proves every sampled shard present in `evidence`. Sampled shards that
    /// are missing are reported in an explicit invalidity message. A prover
    /// failure aborts before anything is broadcast.
    pub async fn submit(
        &self,
        metadata_uri: &str,
        evidence: &Evidence,
        sample: &[ShardIndex],
    ) -> Result<Submission, SubmitError> {
        let validator = self.chain.validator().ok_or(SubmitError::NoValidator)?;
        let (proved, unprovable): (Vec<ShardIndex>, Vec<ShardIndex>) =
            sample.iter().copied().partition(|index| evidence.is_valid(*index));

        let mut proofs = Vec::with_capacity(proved.len());
        for index in &proved {
            let Some(shard) = evidence.valid_shards.get(index) else {
                continue;
            };
            let witness = ShardWitness::from_shard(shard);
            let proof = self
                .prover
                .prove(&witness)
                .await
                .map_err(|source| SubmitError::Prover {
                    index: *index,
                    source,
                })?;
            proofs.push(proof);
        }

        let validity_tx = if proved.is_empty() {
            None
        } else {
            let message = DaMessage::SubmitValidityProof {
                sender: self.chain.sender().to_owned(),
                validator_address: validator.to_owned(),
                metadata_uri: metadata_uri.to_owned(),
                indices: proved.clone(),
                proofs,
            };
            let tx_hash = self.chain.rpc().broadcast(message).await?;
            info!(
                "Submitted {} validity proofs for {metadata_uri} in {tx_hash}",
                proved.len()
            );
            Some(tx_hash)
        };

        let invalidity_tx = if unprovable.is_empty() {
            None
        } else {
            warn!("Shards {unprovable:?} of {metadata_uri} cannot be proved");
            Some(self.submit_invalidity(metadata_uri, unprovable.clone()).await?)
        };

        Ok(Submission {
            proved,
            unprovable,
            validity_tx,
            invalidity_tx,
        })
    }

    pub async fn submit_invalidity(
        &self,
        metadata_uri: &str,
        indices: Vec<ShardIndex>,
    ) -> Result<TxHash, SubmitError> {
        let message = DaMessage::SubmitInvalidity {
            sender: self.chain.sender().to_owned(),
            metadata_uri: metadata_uri.to_owned(),
            indices,
        };
        Ok(self.chain.rpc().broadcast(message).await?)
    }
}
