// std
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
// crates
// internal
use super::{ChainError, ChainRpc, DaMessage, DaParams, TxHash};
use crate::da::{hash, PublishedData, PublishedDataStatus};

const DEFAULT_PROOF_THRESHOLD: usize = 2;

struct MockChainState {
    params: DaParams,
    proof_threshold: usize,
    published: HashMap<String, PublishedData>,
    deputies: HashMap<String, String>,
    validity_proofs: HashSet<(String, String)>,
    broadcasts: Vec<DaMessage>,
    blocks: BTreeMap<u64, Vec<DaMessage>>,
    height: u64,
    status_on_publish: PublishedDataStatus,
    calls: usize,
}

/// In-memory chain that includes every broadcast in the block at the current height.
pub struct MockChain {
    state: Mutex<MockChainState>,
}

impl MockChain {
    #[must_use]
    pub fn new(params: DaParams) -> Self {
        Self {
            state: Mutex::new(MockChainState {
                params,
                proof_threshold: DEFAULT_PROOF_THRESHOLD,
                published: HashMap::new(),
                deputies: HashMap::new(),
                validity_proofs: HashSet::new(),
                broadcasts: Vec::new(),
                blocks: BTreeMap::new(),
                height: 0,
                status_on_publish: PublishedDataStatus::VoteExtensionPassed,
                calls: 0,
            }),
        }
    }

    #[must_use]
    pub fn with_proof_threshold(self, threshold: usize) -> Self {
        self.state.lock().unwrap().proof_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_status_on_publish(self, status: PublishedDataStatus) -> Self {
        self.state.lock().unwrap().status_on_publish = status;
        self
    }

    pub fn set_height(&self, height: u64) {
        self.state.lock().unwrap().height = height;
    }

    pub fn set_deputy(&self, validator: &str, deputy: &str) {
        self.state
            .lock()
            .unwrap()
            .deputies
            .insert(validator.to_owned(), deputy.to_owned());
    }

    pub fn set_status(&self, metadata_uri: &str, status: PublishedDataStatus) {
        if let Some(record) = self.state.lock().unwrap().published.get_mut(metadata_uri) {
            record.status = status;
        }
    }

    pub fn insert_published(&self, record: PublishedData) {
        self.state
            .lock()
            .unwrap()
            .published
            .insert(record.metadata_uri.clone(), record);
    }

    pub fn push_block_message(&self, height: u64, message: DaMessage) {
        self.state
            .lock()
            .unwrap()
            .blocks
            .entry(height)
            .or_default()
            .push(message);
    }

    #[must_use]
    pub fn broadcasts(&self) -> Vec<DaMessage> {
        self.state.lock().unwrap().broadcasts.clone()
    }

    /// Number of rpc calls served so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MockChainState) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        f(&mut state)
    }
}

#[async_trait::async_trait]
impl ChainRpc for MockChain {
    async fn params(&self) -> Result<DaParams, ChainError> {
        Ok(self.with_state(|state| state.params))
    }

    async fn published_data(
        &self,
        metadata_uri: &str,
    ) -> Result<Option<PublishedData>, ChainError> {
        Ok(self.with_state(|state| state.published.get(metadata_uri).cloned()))
    }

    async fn proof_threshold(&self, shard_count: usize) -> Result<usize, ChainError> {
        Ok(self.with_state(|state| state.proof_threshold.min(shard_count)))
    }

    async fn proof_deputy(&self, validator: &str) -> Result<Option<String>, ChainError> {
        Ok(self.with_state(|state| state.deputies.get(validator).cloned()))
    }

    async fn has_validity_proof(
        &self,
        metadata_uri: &str,
        validator: &str,
    ) -> Result<bool, ChainError> {
        Ok(self.with_state(|state| {
            state
                .validity_proofs
                .contains(&(metadata_uri.to_owned(), validator.to_owned()))
        }))
    }

    async fn broadcast(&self, message: DaMessage) -> Result<TxHash, ChainError> {
        Ok(self.with_state(|state| {
            match &message {
                DaMessage::PublishData {
                    metadata_uri,
                    parity_shard_count,
                    shard_double_hashes,
                    data_source_info,
                    ..
                } => {
                    state.published.insert(
                        metadata_uri.clone(),
                        PublishedData {
                            metadata_uri: metadata_uri.clone(),
                            shard_double_hashes: shard_double_hashes.clone(),
                            parity_shard_count: *parity_shard_count,
                            data_source_info: data_source_info.clone(),
                            status: state.status_on_publish,
                        },
                    );
                }
                DaMessage::SubmitValidityProof {
                    metadata_uri,
                    validator_address,
                    ..
                } => {
                    state
                        .validity_proofs
                        .insert((metadata_uri.clone(), validator_address.clone()));
                }
                DaMessage::ChallengeForFraud { .. } | DaMessage::SubmitInvalidity { .. } => {}
            }
            let nonce = state.broadcasts.len() as u64;
            state.broadcasts.push(message.clone());
            state.blocks.entry(state.height).or_default().push(message);
            const_hex::encode(hash(&nonce.to_le_bytes()))
        }))
    }

    async fn latest_height(&self) -> Result<u64, ChainError> {
        Ok(self.with_state(|state| state.height))
    }

    async fn block_messages(&self, height: u64) -> Result<Vec<DaMessage>, ChainError> {
        Ok(self.with_state(|state| state.blocks.get(&height).cloned().unwrap_or_default()))
    }
}
