// std
use std::time::Duration;
// crates
use bytes::Bytes;
use reqwest::{header::CONTENT_TYPE, Client, ClientBuilder, Url};
use serde::{Deserialize, Serialize};
// internal
use super::check_response;
use crate::{Protocol, StorageBackend, StorageError};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArweaveSettings {
    /// Gateway serving transaction data at `/{id}`.
    pub gateway_url: Url,
    /// Bundling service accepting raw data and answering with the transaction id.
    pub upload_url: Url,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

#[derive(Deserialize)]
struct UploadResponse {
    id: String,
}

pub struct ArweaveBackend {
    client: Client,
    settings: ArweaveSettings,
}

impl ArweaveBackend {
    pub fn new(settings: ArweaveSettings) -> Result<Self, StorageError> {
        let client = ClientBuilder::new()
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self { client, settings })
    }
}

#[async_trait::async_trait]
impl StorageBackend for ArweaveBackend {
    fn protocol(&self) -> Protocol {
        Protocol::Arweave
    }

    async fn store(&self, data: Bytes) -> Result<String, StorageError> {
        let mut request = self
            .client
            .post(self.settings.upload_url.clone())
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(data);
        if let Some(api_key) = &self.settings.api_key {
            request = request.bearer_auth(api_key);
        }
        let response = request.send().await?;
        let uploaded: UploadResponse = check_response(response, self.settings.upload_url.as_str())
            .await?
            .json()
            .await?;
        Ok(Protocol::Arweave.uri_for(&uploaded.id))
    }

    async fn retrieve(&self, uri: &str) -> Result<Bytes, StorageError> {
        let id = Protocol::Arweave.object_id(uri)?;
        let url = self.settings.gateway_url.join(id)?;
        let response = self.client.get(url).send().await?;
        Ok(check_response(response, uri).await?.bytes().await?)
    }
}
