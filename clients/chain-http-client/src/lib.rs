//! [`ChainRpc`] over the REST gateway of a chain node.
//!
//! Transactions are handed to the gateway unsigned together with the sending
//! account, the gateway owns the keys and signs before broadcasting.

// std
use std::time::Duration;
// crates
use reqwest::{Client, ClientBuilder, RequestBuilder, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;
// internal
use kestrel_core::chain::{ChainError, ChainRpc, DaMessage, DaParams, TxHash};
use kestrel_core::da::PublishedData;

const DA_PARAMS: &str = "/da/params";
const DA_PUBLISHED_DATA: &str = "/da/published_data";
const DA_PROOF_THRESHOLD: &str = "/da/proof_threshold";
const DA_PROOF_DEPUTY: &str = "/da/proof_deputy";
const DA_VALIDITY_PROOF: &str = "/da/validity_proof";
const DA_BLOCK_MESSAGES: &str = "/da/block_messages";
const TX_BROADCAST: &str = "/tx/broadcast";
const STATUS: &str = "/status";

const NO_QUERY: [(&str, &str); 0] = [];

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Internal server error: {0}")]
    Server(String),
    #[error("Transaction rejected: {0}")]
    Rejected(String),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

impl From<Error> for ChainError {
    fn from(error: Error) -> Self {
        match error {
            Error::Server(message) => Self::Query(message),
            Error::Rejected(message) => Self::Rejected(message),
            other => Self::Transport(Box::new(other)),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainClientSettings {
    pub url: Url,
    /// Fee attached to every broadcast transaction.
    #[serde(default)]
    pub fees: String,
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,
}

const fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

#[derive(Serialize)]
struct BroadcastRequest<'a> {
    from: &'a str,
    fees: &'a str,
    message: &'a DaMessage,
}

#[derive(Deserialize)]
struct BroadcastResponse {
    tx_hash: TxHash,
}

#[derive(Deserialize)]
struct StatusResponse {
    latest_block_height: u64,
}

#[derive(Deserialize)]
struct ThresholdResponse {
    threshold: usize,
}

#[derive(Deserialize)]
struct DeputyResponse {
    deputy: String,
}

#[derive(Deserialize)]
struct ValidityProofResponse {
    exists: bool,
}

#[derive(Clone)]
pub struct ChainHttpClient {
    client: Client,
    base_url: Url,
    fees: String,
}

impl ChainHttpClient {
    pub fn new(settings: ChainClientSettings) -> Result<Self, Error> {
        let client = ClientBuilder::new().timeout(settings.timeout).build()?;
        Ok(Self {
            client,
            base_url: settings.url,
            fees: settings.fees,
        })
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(Error::Url)
    }

    async fn get<Q, Res>(&self, path: &str, query: &Q) -> Result<Res, Error>
    where
        Q: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let request = self.client.get(self.url(path)?).query(query);
        execute_request(request)
            .await?
            .ok_or_else(|| Error::Server(format!("{path} returned no content")))
    }

    /// Like [`Self::get`], a `404` is read as absence rather than failure.
    async fn get_optional<Q, Res>(&self, path: &str, query: &Q) -> Result<Option<Res>, Error>
    where
        Q: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let request = self.client.get(self.url(path)?).query(query);
        execute_request(request).await
    }

    /// Sends `message` signed by `sender` and returns the transaction hash.
    pub async fn broadcast_from(&self, sender: &str, message: &DaMessage) -> Result<TxHash, Error> {
        let body = BroadcastRequest {
            from: sender,
            fees: &self.fees,
            message,
        };
        let request = self.client.post(self.url(TX_BROADCAST)?).json(&body);
        let response: Option<BroadcastResponse> = execute_request(request).await?;
        let tx_hash = response
            .ok_or_else(|| Error::Server("broadcast returned no content".to_owned()))?
            .tx_hash;
        debug!("Broadcast {} from {sender} as {tx_hash}", message_kind(message));
        Ok(tx_hash)
    }
}

async fn execute_request<Res: DeserializeOwned>(
    request: RequestBuilder,
) -> Result<Option<Res>, Error> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    match status {
        StatusCode::OK => serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| Error::Server(format!("Failed to parse response: {e}"))),
        StatusCode::NOT_FOUND => Ok(None),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Err(Error::Rejected(body)),
        StatusCode::INTERNAL_SERVER_ERROR => Err(Error::Server(body)),
        _ => Err(Error::Server(format!(
            "Unexpected response [{status}]: {body}",
        ))),
    }
}

const fn message_kind(message: &DaMessage) -> &'static str {
    match message {
        DaMessage::PublishData { .. } => "publish_data",
        DaMessage::ChallengeForFraud { .. } => "challenge_for_fraud",
        DaMessage::SubmitInvalidity { .. } => "submit_invalidity",
        DaMessage::SubmitValidityProof { .. } => "submit_validity_proof",
    }
}

/// The signing account is taken from the message itself.
fn message_sender(message: &DaMessage) -> &str {
    match message {
        DaMessage::PublishData { sender, .. }
        | DaMessage::ChallengeForFraud { sender, .. }
        | DaMessage::SubmitInvalidity { sender, .. }
        | DaMessage::SubmitValidityProof { sender, .. } => sender,
    }
}

#[async_trait::async_trait]
impl ChainRpc for ChainHttpClient {
    async fn params(&self) -> Result<DaParams, ChainError> {
        Ok(self.get(DA_PARAMS, &NO_QUERY).await?)
    }

    async fn published_data(
        &self,
        metadata_uri: &str,
    ) -> Result<Option<PublishedData>, ChainError> {
        Ok(self
            .get_optional(DA_PUBLISHED_DATA, &[("metadata_uri", metadata_uri)])
            .await?)
    }

    async fn proof_threshold(&self, shard_count: usize) -> Result<usize, ChainError> {
        let response: ThresholdResponse = self
            .get(DA_PROOF_THRESHOLD, &[("shard_count", shard_count)])
            .await?;
        Ok(response.threshold)
    }

    async fn proof_deputy(&self, validator: &str) -> Result<Option<String>, ChainError> {
        let response: Option<DeputyResponse> = self
            .get_optional(DA_PROOF_DEPUTY, &[("validator", validator)])
            .await?;
        Ok(response.map(|response| response.deputy))
    }

    async fn has_validity_proof(
        &self,
        metadata_uri: &str,
        validator: &str,
    ) -> Result<bool, ChainError> {
        let response: Option<ValidityProofResponse> = self
            .get_optional(
                DA_VALIDITY_PROOF,
                &[("metadata_uri", metadata_uri), ("validator", validator)],
            )
            .await?;
        Ok(response.is_some_and(|response| response.exists))
    }

    async fn broadcast(&self, message: DaMessage) -> Result<TxHash, ChainError> {
        Ok(self
            .broadcast_from(message_sender(&message), &message)
            .await?)
    }

    async fn latest_height(&self) -> Result<u64, ChainError> {
        let response: StatusResponse = self.get(STATUS, &NO_QUERY).await?;
        Ok(response.latest_block_height)
    }

    async fn block_messages(&self, height: u64) -> Result<Vec<DaMessage>, ChainError> {
        Ok(self
            .get_optional(DA_BLOCK_MESSAGES, &[("height", height)])
            .await?
            .unwrap_or_default())
    }
}
