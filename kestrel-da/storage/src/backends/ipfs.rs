// std
use std::time::Duration;
// crates
use bytes::Bytes;
use reqwest::{
    multipart::{Form, Part},
    Client, ClientBuilder, Url,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
// internal
use super::check_response;
use crate::{Protocol, StorageBackend, StorageError};

const ADD_PATH: &str = "api/v0/add";
const CAT_PATH: &str = "api/v0/cat";
const SWARM_CONNECT_PATH: &str = "api/v0/swarm/connect";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IpfsSettings {
    /// Kubo RPC endpoint, e.g. `http://127.0.0.1:5001/`.
    pub api_url: Url,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AddResponse {
    hash: String,
}

/// Backend talking to a kubo node over its RPC api.
pub struct IpfsBackend {
    client: Client,
    api_url: Url,
}

impl IpfsBackend {
    pub fn new(settings: IpfsSettings) -> Result<Self, StorageError> {
        let client = ClientBuilder::new()
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self {
            client,
            api_url: settings.api_url,
        })
    }

    fn endpoint(&self, path: &str, arg: Option<&str>) -> Result<Url, StorageError> {
        let mut url = self.api_url.join(path)?;
        if let Some(arg) = arg {
            url.query_pairs_mut().append_pair("arg", arg);
        }
        Ok(url)
    }
}

#[async_trait::async_trait]
impl StorageBackend for IpfsBackend {
    fn protocol(&self) -> Protocol {
        Protocol::Ipfs
    }

    async fn store(&self, data: Bytes) -> Result<String, StorageError> {
        let mut url = self.endpoint(ADD_PATH, None)?;
        url.query_pairs_mut()
            .append_pair("pin", "true")
            .append_pair("cid-version", "1");
        let form = Form::new().part("file", Part::bytes(data.to_vec()).file_name("data"));
        let response = self.client.post(url).multipart(form).send().await?;
        let added: AddResponse = check_response(response, ADD_PATH).await?.json().await?;
        Ok(Protocol::Ipfs.uri_for(&added.hash))
    }

    async fn retrieve(&self, uri: &str) -> Result<Bytes, StorageError> {
        let cid = Protocol::Ipfs.object_id(uri)?;
        let url = self.endpoint(CAT_PATH, Some(cid))?;
        let response = self.client.post(url).send().await?;
        Ok(check_response(response, uri).await?.bytes().await?)
    }

    async fn connect_source(&self, source: &str) -> Result<(), StorageError> {
        let url = self.endpoint(SWARM_CONNECT_PATH, Some(source))?;
        let response = self.client.post(url).send().await?;
        check_response(response, source).await?;
        debug!("Connected to publisher node {source}");
        Ok(())
    }
}
