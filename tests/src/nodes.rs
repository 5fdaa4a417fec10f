// std
use std::net::TcpListener;
use std::sync::Arc;
// crates
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde_json::json;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
// internal
use kestrel_core::chain::mock::MockChain;
use kestrel_core::chain::{ChainContext, DaParams};
use kestrel_core::proofs::mock::MockProver;
use kestrel_da_storage::backends::memory::MemoryBackend;
use kestrel_da_storage::{Protocol, ShardStore, ShardStoreSettings, StorageRegistry};
use kestrel_dispersal::PublisherSettings;
use kestrel_node::altda::AltDaSettings;
use kestrel_node::api::backend::{AxumBackend, AxumBackendSettings};
use kestrel_node::config::ValidatorSettings;
use kestrel_node::rollkit::RollkitSettings;
use kestrel_node::{start_validator, DaNode};
use kestrel_validator::WatcherHandle;

pub const PUBLISHER: &str = "kestrel1publisher";
pub const VALIDATOR: &str = "kestrelvaloper1validator";
pub const DEPUTY: &str = "kestrel1deputy";

pub const DEFAULT_PARAMS: DaParams = DaParams {
    min_shard_count: 2,
    max_shard_count: 16,
    max_shard_size: 1024,
};

/// A node api on an ephemeral port, backed by an in-memory chain and storage.
pub struct TestNode {
    pub chain: Arc<MockChain>,
    pub ipfs: Arc<MemoryBackend>,
    pub arweave: Arc<MemoryBackend>,
    pub store: ShardStore,
    url: Url,
    client: Client,
    shutdown: CancellationToken,
}

impl TestNode {
    pub async fn spawn(params: DaParams, proof_threshold: usize) -> Self {
        let chain = Arc::new(MockChain::new(params).with_proof_threshold(proof_threshold));
        chain.set_deputy(VALIDATOR, DEPUTY);
        let ipfs = Arc::new(MemoryBackend::new(Protocol::Ipfs));
        let arweave = Arc::new(MemoryBackend::new(Protocol::Arweave));
        let store = ShardStore::new(
            StorageRegistry::new()
                .with_backend(ipfs.clone())
                .with_backend(arweave.clone()),
            ShardStoreSettings::default(),
        );
        let node = Arc::new(DaNode::new(
            ChainContext::new(chain.clone(), PUBLISHER),
            store.clone(),
            PublisherSettings::default(),
            AltDaSettings::default(),
            RollkitSettings::default(),
        ));

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        let backend = AxumBackend::new(AxumBackendSettings {
            address,
            cors_origins: vec![],
        });
        tokio::spawn(backend.serve_from(listener, node, shutdown.clone()));

        Self {
            chain,
            ipfs,
            arweave,
            store,
            url: Url::parse(&format!("http://{address}/")).unwrap(),
            client: Client::new(),
            shutdown,
        }
    }

    /// Starts a validator watcher sharing this node's chain and storage.
    pub async fn start_validator(
        &self,
        prover: MockProver,
        settings: ValidatorSettings,
    ) -> (JoinHandle<()>, WatcherHandle) {
        let context = ChainContext::new(self.chain.clone(), DEPUTY).with_validator(VALIDATOR);
        start_validator(
            context,
            self.store.clone(),
            prover,
            settings,
            self.shutdown.clone(),
        )
        .await
        .unwrap()
    }

    fn endpoint(&self, path: &str) -> Url {
        self.url.join(path.trim_start_matches('/')).unwrap()
    }

    pub async fn publish(
        &self,
        blob: &[u8],
        data_shard_count: usize,
        parity_shard_count: usize,
        protocol: &str,
    ) -> Response {
        self.client
            .post(self.endpoint("/api/publish"))
            .json(&json!({
                "blob": STANDARD.encode(blob),
                "data_shard_count": data_shard_count,
                "parity_shard_count": parity_shard_count,
                "protocol": protocol,
            }))
            .send()
            .await
            .unwrap()
    }

    /// Publishes `file` through the multipart form endpoint.
    pub async fn publish_file(
        &self,
        file_name: &str,
        file: &[u8],
        data_shard_count: usize,
        parity_shard_count: usize,
        protocol: &str,
    ) -> Response {
        let form = Form::new()
            .text("file_name", file_name.to_owned())
            .text("protocol", protocol.to_owned())
            .text("data_shard_count", data_shard_count.to_string())
            .text("parity_shard_count", parity_shard_count.to_string())
            .part(
                file_name.to_owned(),
                Part::bytes(file.to_vec()).file_name(file_name.to_owned()),
            );
        self.client
            .post(self.endpoint("/api/publish_file"))
            .multipart(form)
            .send()
            .await
            .unwrap()
    }

    pub async fn get_blob(&self, metadata_uri: &str) -> Response {
        self.client
            .get(self.endpoint("/api/get_blob"))
            .query(&[("metadata_uri", metadata_uri)])
            .send()
            .await
            .unwrap()
    }

    pub async fn shard_hashes(&self, metadata_uri: &str, indices: &str, kind: &str) -> Response {
        self.client
            .get(self.endpoint("/api/shard_hashes"))
            .query(&[
                ("metadata_uri", metadata_uri),
                ("indices", indices),
                ("kind", kind),
            ])
            .send()
            .await
            .unwrap()
    }

    pub async fn put(&self, blob: &[u8]) -> Response {
        self.client
            .post(self.endpoint("/put"))
            .body(blob.to_vec())
            .send()
            .await
            .unwrap()
    }

    pub async fn get(&self, commitment: &[u8]) -> Response {
        let path = format!("/get/{}", const_hex::encode_prefixed(commitment));
        self.client.get(self.endpoint(&path)).send().await.unwrap()
    }

    pub async fn rollkit_submit(&self, blobs: &[Vec<u8>]) -> Response {
        let blobs: Vec<String> = blobs.iter().map(|blob| STANDARD.encode(blob)).collect();
        self.client
            .post(self.endpoint("/rollkit/submit"))
            .json(&json!({ "blobs": blobs }))
            .send()
            .await
            .unwrap()
    }

    pub async fn rollkit_get(&self, ids: &[String]) -> Response {
        self.client
            .post(self.endpoint("/rollkit/get"))
            .json(&json!({ "ids": ids }))
            .send()
            .await
            .unwrap()
    }

    pub async fn rollkit_max_blob_size(&self) -> Response {
        self.client
            .get(self.endpoint("/rollkit/max_blob_size"))
            .send()
            .await
            .unwrap()
    }

    pub fn stop(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for TestNode {
    fn drop(&mut self) {
        self.stop();
    }
}
