// std
use std::sync::Arc;
// internal
use crate::{AuditPolicy, AuditTask, Auditor, ChallengeEngine, ProofSubmitter};
use kestrel_core::chain::mock::MockChain;
use kestrel_core::chain::{ChainContext, DaMessage, DaParams};
use kestrel_core::proofs::mock::MockProver;
use kestrel_da_storage::backends::memory::MemoryBackend;
use kestrel_da_storage::{Protocol, ShardStore, ShardStoreSettings, StorageRegistry};
use kestrel_dispersal::{Publisher, PublisherSettings};
use kestrel_reed_solomon::ReedSolomonCodec;

pub const VALIDATOR: &str = "validator-1";
pub const DEPUTY: &str = "deputy-1";

pub struct Fixture {
    pub chain: Arc<MockChain>,
    pub backend: Arc<MemoryBackend>,
    pub store: ShardStore,
    pub publisher: Publisher<ReedSolomonCodec>,
}

pub struct Published {
    pub task: AuditTask,
    pub shard_uris: Vec<String>,
}

pub fn fixture(proof_threshold: usize) -> Fixture {
    let chain = Arc::new(
        MockChain::new(DaParams {
            min_shard_count: 2,
            max_shard_count: 32,
            max_shard_size: 4096,
        })
        .with_proof_threshold(proof_threshold),
    );
    let backend = Arc::new(MemoryBackend::new(Protocol::Ipfs));
    let store = ShardStore::new(
        StorageRegistry::new().with_backend(backend.clone()),
        ShardStoreSettings::default(),
    );
    let publisher = Publisher::new(
        ReedSolomonCodec,
        store.clone(),
        ChainContext::new(chain.clone(), "publisher"),
        PublisherSettings::default(),
    );
    Fixture {
        chain,
        backend,
        store,
        publisher,
    }
}

impl Fixture {
    pub fn validator_context(&self) -> ChainContext {
        ChainContext::new(self.chain.clone(), DEPUTY).with_validator(VALIDATOR)
    }

    pub fn auditor(&self, policy: AuditPolicy, prover: MockProver) -> Auditor<MockProver> {
        let context = self.validator_context();
        Auditor::new(
            ChallengeEngine::new(self.store.clone()),
            ProofSubmitter::new(prover, context.clone()),
            context,
            policy,
        )
    }

    /// Publishes a 4 + 2 coded blob and returns its audit task.
    pub async fn publish(&self, blob: &[u8]) -> Published {
        let published = self.publisher.publish(blob, 4, 2, "ipfs").await.unwrap();
        let message = self
            .chain
            .broadcasts()
            .into_iter()
            .rev()
            .find(|message| {
                matches!(message, DaMessage::PublishData { metadata_uri, .. } if *metadata_uri == published.metadata_uri)
            })
            .unwrap();
        let shard_uris = self
            .store
            .fetch_metadata(&published.metadata_uri)
            .await
            .unwrap()
            .shard_uris;
        Published {
            task: AuditTask::from_message(message).unwrap(),
            shard_uris,
        }
    }

    pub fn messages_after_publish(&self) -> Vec<DaMessage> {
        self.chain
            .broadcasts()
            .into_iter()
            .filter(|message| !matches!(message, DaMessage::PublishData { .. }))
            .collect()
    }
}

pub const fn full_policy() -> AuditPolicy {
    AuditPolicy {
        submit_challenge: true,
        submit_proof: true,
    }
}
