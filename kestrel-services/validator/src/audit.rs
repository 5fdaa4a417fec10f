// crates
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
// internal
use crate::engine::{AuditTask, ChallengeEngine, FraudReason, Verdict};
use crate::sampler::sample_indices;
use crate::submission::{ProofSubmitter, SubmitError, Submission};
use kestrel_core::chain::{ChainContext, ChainError, DaMessage, TxHash};
use kestrel_core::da::{PublishedDataStatus, ShardIndex};
use kestrel_core::proofs::Prover;

#[derive(thiserror::Error, Debug)]
pub enum AuditError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
    #[error("No validator address configured")]
    NoValidator,
    #[error("Validator {validator} delegates proofs to {found:?}, not to {expected}")]
    DeputyMismatch {
        validator: String,
        expected: String,
        found: Option<String>,
    },
}

/// Operator switches, both off gives a detect-only node.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct AuditPolicy {
    pub submit_challenge: bool,
    pub submit_proof: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuditOutcome {
    NotIndexed,
    NotReady(PublishedDataStatus),
    AlreadyProved,
    Fraud {
        reason: FraudReason,
        challenge_tx: Option<TxHash>,
        invalidity_tx: Option<TxHash>,
    },
    Valid(Option<Submission>),
}

/// Runs the challenge decision for one commitment and acts on it.
pub struct Auditor<P> {
    engine: ChallengeEngine,
    submitter: ProofSubmitter<P>,
    chain: ChainContext,
    policy: AuditPolicy,
}

impl<P> Auditor<P>
where
    P: Prover,
{
    pub const fn new(
        engine: ChallengeEngine,
        submitter: ProofSubmitter<P>,
        chain: ChainContext,
        policy: AuditPolicy,
    ) -> Self {
        Self {
            engine,
            submitter,
            chain,
            policy,
        }
    }

    pub async fn audit(&self, task: AuditTask) -> Result<AuditOutcome, AuditError> {
        let uri = task.metadata_uri.as_str();
        match self.chain.rpc().published_data(uri).await? {
            None => return Ok(AuditOutcome::NotIndexed),
            Some(record) if !record.status.is_auditable() => {
                return Ok(AuditOutcome::NotReady(record.status));
            }
            Some(_) => {}
        }

        if let Err(err) = self
            .engine
            .store()
            .connect_source(uri, &task.data_source_info)
            .await
        {
            warn!("Could not connect to data source of {uri} due to {err:?}");
        }

        match self.engine.decide(&task).await {
            Verdict::Fraud { reason, evidence } => {
                warn!("Fraud detected on {uri}: {reason}");
                let challenge_tx = if self.policy.submit_challenge {
                    let message = DaMessage::ChallengeForFraud {
                        sender: self.chain.sender().to_owned(),
                        metadata_uri: uri.to_owned(),
                    };
                    Some(self.chain.rpc().broadcast(message).await?)
                } else {
                    None
                };

                let invalidity_tx = match (self.policy.submit_proof, self.chain.validator()) {
                    (true, Some(validator)) => {
                        let missing: Vec<ShardIndex> =
                            self.assignment(validator, evidence.shard_count)
                                .await?
                                .into_iter()
                                .filter(|index| !evidence.is_valid(*index))
                                .collect();
                        if missing.is_empty() {
                            None
                        } else {
                            Some(self.submitter.submit_invalidity(uri, missing).await?)
                        }
                    }
                    _ => None,
                };

                Ok(AuditOutcome::Fraud {
                    reason,
                    challenge_tx,
                    invalidity_tx,
                })
            }
            Verdict::Valid(evidence) => {
                let validator = match (self.policy.submit_proof, self.chain.validator()) {
                    (true, Some(validator)) => validator,
                    _ => return Ok(AuditOutcome::Valid(None)),
                };
                if self.chain.rpc().has_validity_proof(uri, validator).await? {
                    info!("Validity proof for {uri} already submitted");
                    return Ok(AuditOutcome::AlreadyProved);
                }
                let sample = self.assignment(validator, evidence.shard_count).await?;
                let submission = self.submitter.submit(uri, &evidence, &sample).await?;
                Ok(AuditOutcome::Valid(Some(submission)))
            }
        }
    }

    async fn assignment(
        &self,
        validator: &str,
        shard_count: usize,
    ) -> Result<Vec<ShardIndex>, ChainError> {
        let threshold = self.chain.rpc().proof_threshold(shard_count).await?;
        Ok(sample_indices(validator, threshold, shard_count))
    }
}

/// Proofs are only accepted from the deputy the validator registered on chain.
pub async fn verify_deputy(chain: &ChainContext) -> Result<(), AuditError> {
    let validator = chain.validator().ok_or(AuditError::NoValidator)?;
    let deputy = chain.rpc().proof_deputy(validator).await?;
    if deputy.as_deref() == Some(chain.sender()) {
        Ok(())
    } else {
        Err(AuditError::DeputyMismatch {
            validator: validator.to_owned(),
            expected: chain.sender().to_owned(),
            found: deputy,
        })
    }
}
