pub mod altda;
pub mod api;
pub mod config;
pub mod rollkit;
#[cfg(test)]
mod test_utils;

// std
use std::sync::Arc;
// crates
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;
// internal
use crate::altda::{AltDaSettings, AltDaStore};
use crate::config::{ChainSettings, StorageSettings, ValidatorSettings};
use crate::rollkit::{RollkitSettings, RollkitStore};
use chain_http_client::ChainHttpClient;
use kestrel_core::chain::ChainContext;
use kestrel_core::proofs::Prover;
use kestrel_da_storage::backends::{arweave::ArweaveBackend, ipfs::IpfsBackend};
use kestrel_da_storage::{ShardStore, StorageError, StorageRegistry};
use kestrel_dispersal::{Publisher, PublisherSettings};
use kestrel_reed_solomon::ReedSolomonCodec;
use kestrel_retrieval::Retriever;
use kestrel_validator::{
    verify_deputy, AuditError, Auditor, ChainWatcher, ChallengeEngine, ProofSubmitter,
    WatcherHandle,
};

pub use config::{Config, HttpArgs, LogArgs, ValidatorArgs};

/// Client-facing services behind the http api.
pub struct DaNode {
    pub publisher: Arc<Publisher<ReedSolomonCodec>>,
    pub retriever: Arc<Retriever<ReedSolomonCodec>>,
    pub alt_da: AltDaStore<ReedSolomonCodec>,
    pub rollkit: RollkitStore<ReedSolomonCodec>,
}

impl DaNode {
    #[must_use]
    pub fn new(
        chain: ChainContext,
        store: ShardStore,
        publish: PublisherSettings,
        alt_da: AltDaSettings,
        rollkit: RollkitSettings,
    ) -> Self {
        let publisher = Arc::new(Publisher::new(
            ReedSolomonCodec,
            store.clone(),
            chain.clone(),
            publish,
        ));
        let retriever = Arc::new(Retriever::new(ReedSolomonCodec, store, chain));
        let alt_da = AltDaStore::new(publisher.clone(), retriever.clone(), alt_da);
        let rollkit = RollkitStore::new(publisher.clone(), retriever.clone(), rollkit);
        Self {
            publisher,
            retriever,
            alt_da,
            rollkit,
        }
    }
}

/// Registers a backend for every storage network present in `settings`.
pub fn storage_registry(settings: &StorageSettings) -> Result<StorageRegistry, StorageError> {
    let mut registry = StorageRegistry::new();
    if let Some(ipfs) = &settings.ipfs {
        registry.register(Arc::new(IpfsBackend::new(ipfs.clone())?));
    }
    if let Some(arweave) = &settings.arweave {
        registry.register(Arc::new(ArweaveBackend::new(arweave.clone())?));
    }
    Ok(registry)
}

pub fn chain_context(
    settings: &ChainSettings,
    validator: Option<&str>,
) -> Result<ChainContext, chain_http_client::Error> {
    let client = ChainHttpClient::new(settings.gateway.clone())?;
    let context = ChainContext::new(Arc::new(client), settings.sender.clone());
    Ok(match validator {
        Some(validator) => context.with_validator(validator),
        None => context,
    })
}

/// Checks the deputy registration, then spawns the chain watcher until
/// `shutdown` fires.
pub async fn start_validator<P>(
    chain: ChainContext,
    store: ShardStore,
    prover: P,
    settings: ValidatorSettings,
    shutdown: CancellationToken,
) -> Result<(JoinHandle<()>, WatcherHandle), AuditError>
where
    P: Prover + 'static,
{
    verify_deputy(&chain).await?;
    info!(
        "Validating as {} through deputy {}",
        chain.validator().unwrap_or_default(),
        chain.sender()
    );

    let auditor = Arc::new(Auditor::new(
        ChallengeEngine::new(store),
        ProofSubmitter::new(prover, chain.clone()),
        chain.clone(),
        settings.policy,
    ));
    let (watcher, handle) = ChainWatcher::new(chain, auditor, settings.watcher);
    Ok((tokio::spawn(watcher.run(shutdown)), handle))
}
