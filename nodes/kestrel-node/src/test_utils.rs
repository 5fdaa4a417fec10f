// std
use std::sync::Arc;
// internal
use crate::altda::AltDaSettings;
use crate::rollkit::RollkitSettings;
use crate::DaNode;
use kestrel_core::chain::mock::MockChain;
use kestrel_core::chain::{ChainContext, DaParams};
use kestrel_da_storage::backends::memory::MemoryBackend;
use kestrel_da_storage::{Protocol, ShardStore, ShardStoreSettings, StorageRegistry};
use kestrel_dispersal::PublisherSettings;

pub fn services() -> (Arc<DaNode>, Arc<MockChain>, Arc<MemoryBackend>) {
    let chain = Arc::new(
        MockChain::new(DaParams {
            min_shard_count: 2,
            max_shard_count: 32,
            max_shard_size: 4096,
        })
        .with_proof_threshold(2),
    );
    let backend = Arc::new(MemoryBackend::new(Protocol::Ipfs));
    let store = ShardStore::new(
        StorageRegistry::new().with_backend(backend.clone()),
        ShardStoreSettings::default(),
    );
    let node = DaNode::new(
        ChainContext::new(chain.clone(), "publisher"),
        store,
        PublisherSettings::default(),
        AltDaSettings::default(),
        RollkitSettings::default(),
    );
    (Arc::new(node), chain, backend)
}
