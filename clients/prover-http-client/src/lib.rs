// std
use std::time::Duration;
// crates
use reqwest::{Client, ClientBuilder, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::trace;
// internal
use kestrel_core::proofs::{Proof, Prover, ProverError, ShardWitness};

const PROVE: &str = "/prove";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Prover service error: {0}")]
    Server(String),
    #[error("Proof is not valid hex: {0}")]
    Encoding(#[from] const_hex::FromHexError),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProverClientSettings {
    pub url: Url,
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,
}

const fn default_timeout() -> Duration {
    Duration::from_secs(120)
}

#[derive(Serialize)]
struct ProveRequest {
    shard_hash: String,
    shard_double_hash: String,
}

impl From<&ShardWitness> for ProveRequest {
    fn from(witness: &ShardWitness) -> Self {
        Self {
            shard_hash: const_hex::encode(witness.shard_hash),
            shard_double_hash: const_hex::encode(witness.shard_double_hash),
        }
    }
}

#[derive(Deserialize)]
struct ProveResponse {
    proof: String,
}

/// Delegates shard proofs to a remote proving service holding the circuit keys.
#[derive(Clone)]
pub struct HttpProver {
    client: Client,
    prove_url: Url,
}

impl HttpProver {
    pub fn new(settings: ProverClientSettings) -> Result<Self, Error> {
        let client = ClientBuilder::new().timeout(settings.timeout).build()?;
        let prove_url = settings.url.join(PROVE.trim_start_matches('/'))?;
        Ok(Self { client, prove_url })
    }

    async fn request_proof(&self, witness: &ShardWitness) -> Result<Option<Proof>, Error> {
        let response = self
            .client
            .post(self.prove_url.clone())
            .json(&ProveRequest::from(witness))
            .send()
            .await?;
        match response.status() {
            StatusCode::OK => {
                let ProveResponse { proof } = response.json().await?;
                Ok(Some(const_hex::decode(proof)?))
            }
            StatusCode::SERVICE_UNAVAILABLE => Ok(None),
            status => {
                let body = response.text().await?;
                Err(Error::Server(format!("Unexpected response [{status}]: {body}")))
            }
        }
    }
}

#[async_trait::async_trait]
impl Prover for HttpProver {
    async fn prove(&self, witness: &ShardWitness) -> Result<Proof, ProverError> {
        if !witness.is_consistent() {
            return Err(ProverError::MalformedWitness(format!(
                "{} does not hash to {}",
                const_hex::encode(witness.shard_hash),
                const_hex::encode(witness.shard_double_hash)
            )));
        }
        trace!("Requesting proof for {}", const_hex::encode(witness.shard_double_hash));
        self.request_proof(witness)
            .await
            .map_err(|e| ProverError::Backend(Box::new(e)))?
            .ok_or(ProverError::MissingProvingKey)
    }
}
