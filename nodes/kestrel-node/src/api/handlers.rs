// std
use std::collections::HashMap;
use std::sync::Arc;
// crates
use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
// internal
use crate::altda::AltDaError;
use crate::rollkit::RollkitError;
use crate::DaNode;
use kestrel_core::da::ShardIndex;
use kestrel_da_storage::StorageError;
use kestrel_dispersal::PublishError;
use kestrel_retrieval::{HashKind, RetrieveError, ShardHashes};

const WELCOME_TEXT: &str = "Kestrel DA node api";
/// Upper bound on a multipart file upload body.
pub const MAX_FILE_SIZE: usize = 10 << 20;

/// 200 with the json body, or the status chosen for the error and its message.
macro_rules! make_request_and_return_response {
    ($cond:expr) => {
        make_request_and_return_response!($cond, |_| StatusCode::INTERNAL_SERVER_ERROR)
    };
    ($cond:expr, $status:expr) => {{
        match $cond.await {
            ::std::result::Result::Ok(val) => {
                IntoResponse::into_response((StatusCode::OK, Json(val)))
            }
            ::std::result::Result::Err(e) => {
                IntoResponse::into_response(($status(&e), e.to_string()))
            }
        }
    }};
}

#[derive(Serialize, Deserialize)]
pub struct PublishRequest {
    /// Base64 encoded blob.
    pub blob: String,
    pub data_shard_count: usize,
    pub parity_shard_count: usize,
    pub protocol: String,
}

#[derive(Serialize, Deserialize)]
pub struct RollkitSubmitRequest {
    /// Base64 encoded blobs.
    pub blobs: Vec<String>,
}

#[derive(Serialize, Deserialize)]
pub struct RollkitIds {
    /// Base64 encoded blob ids.
    pub ids: Vec<String>,
}

#[derive(Serialize, Deserialize)]
pub struct RollkitBlobs {
    pub blobs: Vec<String>,
}

#[derive(Serialize, Deserialize)]
pub struct MaxBlobSizeResponse {
    pub max_blob_size: u64,
}

#[derive(Serialize, Deserialize)]
pub struct GetBlobQuery {
    pub metadata_uri: String,
}

#[derive(Serialize, Deserialize)]
pub struct GetBlobResponse {
    pub blob: String,
}

#[derive(Serialize, Deserialize)]
pub struct ShardHashesQuery {
    pub metadata_uri: String,
    /// Comma separated shard indices.
    #[serde(default)]
    pub indices: String,
    #[serde(default)]
    pub kind: HashKind,
}

#[derive(Serialize, Deserialize)]
pub struct ShardHashesResponse {
    pub shard_size: u64,
    pub shard_uris: Vec<String>,
    pub shard_hashes: Vec<String>,
}

impl From<ShardHashes> for ShardHashesResponse {
    fn from(hashes: ShardHashes) -> Self {
        Self {
            shard_size: hashes.shard_size,
            shard_uris: hashes.shard_uris,
            shard_hashes: hashes.hashes.iter().map(|hash| STANDARD.encode(hash)).collect(),
        }
    }
}

fn bad_request(message: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, message.into()).into_response()
}

fn storage_status(err: &StorageError) -> StatusCode {
    match err {
        StorageError::UnsupportedProtocol(_)
        | StorageError::BackendUnavailable(_)
        | StorageError::InvalidUri(_) => StatusCode::BAD_REQUEST,
        StorageError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn publish_status(err: &PublishError) -> StatusCode {
    match err {
        PublishError::Storage(err) => storage_status(err),
        PublishError::NoDataShards
        | PublishError::ShardCountOutOfBounds { .. }
        | PublishError::ShardSizeExceeded { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn retrieve_status(err: &RetrieveError) -> StatusCode {
    match err {
        RetrieveError::Storage(err) => storage_status(err),
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn alt_da_status(err: &AltDaError) -> StatusCode {
    match err {
        AltDaError::Commitment(_) => StatusCode::BAD_REQUEST,
        AltDaError::Publish(err) => publish_status(err),
        AltDaError::Retrieve(err) => retrieve_status(err),
    }
}

fn rollkit_status(err: &RollkitError) -> StatusCode {
    match err {
        RollkitError::BlobTooLarge { .. } | RollkitError::InvalidId { .. } => {
            StatusCode::BAD_REQUEST
        }
        RollkitError::Publish(err) => publish_status(err),
        RollkitError::Retrieve(err) => retrieve_status(err),
    }
}

fn decode_all(encoded: &[String]) -> Result<Vec<Vec<u8>>, base64::DecodeError> {
    encoded.iter().map(|item| STANDARD.decode(item)).collect()
}

fn encode_all(items: Vec<Vec<u8>>) -> Vec<String> {
    items.iter().map(|item| STANDARD.encode(item)).collect()
}

/// Fields of a multipart file publish. The file itself is sent in the part
/// named by `file_name`.
#[derive(Debug)]
struct PublishFileForm {
    file: Bytes,
    data_shard_count: usize,
    parity_shard_count: usize,
    protocol: String,
}

impl PublishFileForm {
    async fn read(mut multipart: Multipart) -> Result<Self, String> {
        let mut fields = HashMap::new();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| format!("Malformed form: {e}"))?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            let value = field
                .bytes()
                .await
                .map_err(|e| format!("Failed to read form field {name}: {e}"))?;
            fields.insert(name, value);
        }
        Self::from_fields(&fields)
    }

    fn from_fields(fields: &HashMap<String, Bytes>) -> Result<Self, String> {
        let text = |name: &str| -> Result<String, String> {
            let value = fields
                .get(name)
                .ok_or_else(|| format!("Missing form field {name}"))?;
            String::from_utf8(value.to_vec()).map_err(|_| format!("Form field {name} is not text"))
        };
        let count = |name: &str| -> Result<usize, String> {
            text(name)?
                .trim()
                .parse()
                .map_err(|e| format!("Form field {name}: {e}"))
        };

        let file_name = text("file_name")?;
        let file = fields
            .get(&file_name)
            .cloned()
            .ok_or_else(|| format!("Missing file {file_name}"))?;
        Ok(Self {
            file,
            data_shard_count: count("data_shard_count")?,
            parity_shard_count: count("parity_shard_count")?,
            protocol: text("protocol")?,
        })
    }
}

/// Unparsable entries are dropped, range checks happen against the metadata.
fn parse_indices(indices: &str) -> Vec<ShardIndex> {
    indices
        .split(',')
        .filter_map(|index| index.trim().parse().ok())
        .collect()
}

pub async fn welcome() -> &'static str {
    WELCOME_TEXT
}

pub async fn publish(
    State(node): State<Arc<DaNode>>,
    Json(request): Json<PublishRequest>,
) -> Response {
    let blob = match STANDARD.decode(&request.blob) {
        Ok(blob) => blob,
        Err(e) => return bad_request(format!("Blob is not valid base64: {e}")),
    };
    make_request_and_return_response!(
        node.publisher.publish(
            &blob,
            request.data_shard_count,
            request.parity_shard_count,
            &request.protocol,
        ),
        publish_status
    )
}

pub async fn publish_file(State(node): State<Arc<DaNode>>, multipart: Multipart) -> Response {
    let form = match PublishFileForm::read(multipart).await {
        Ok(form) => form,
        Err(e) => return bad_request(e),
    };
    make_request_and_return_response!(
        node.publisher.publish(
            &form.file,
            form.data_shard_count,
            form.parity_shard_count,
            &form.protocol,
        ),
        publish_status
    )
}

pub async fn get_blob(
    State(node): State<Arc<DaNode>>,
    Query(query): Query<GetBlobQuery>,
) -> Response {
    make_request_and_return_response!(
        async {
            node.retriever
                .retrieve(&query.metadata_uri)
                .await
                .map(|blob| GetBlobResponse {
                    blob: STANDARD.encode(blob),
                })
        },
        retrieve_status
    )
}

pub async fn shard_hashes(
    State(node): State<Arc<DaNode>>,
    Query(query): Query<ShardHashesQuery>,
) -> Response {
    let indices = parse_indices(&query.indices);
    make_request_and_return_response!(
        async {
            node.retriever
                .shard_hashes(&query.metadata_uri, &indices, query.kind)
                .await
                .map(ShardHashesResponse::from)
        },
        retrieve_status
    )
}

pub async fn put_blob(State(node): State<Arc<DaNode>>, body: Bytes) -> Response {
    match node.alt_da.put(&body).await {
        Ok(commitment) => octet_stream(commitment),
        Err(e) => (alt_da_status(&e), e.to_string()).into_response(),
    }
}

pub async fn get_commitment(
    State(node): State<Arc<DaNode>>,
    Path(commitment): Path<String>,
) -> Response {
    let commitment = match const_hex::decode(&commitment) {
        Ok(commitment) => commitment,
        Err(e) => return bad_request(format!("Commitment is not valid hex: {e}")),
    };
    match node.alt_da.get(&commitment).await {
        Ok(blob) => octet_stream(blob),
        Err(e) => (alt_da_status(&e), e.to_string()).into_response(),
    }
}

pub async fn rollkit_max_blob_size(State(node): State<Arc<DaNode>>) -> Json<MaxBlobSizeResponse> {
    Json(MaxBlobSizeResponse {
        max_blob_size: node.rollkit.max_blob_size(),
    })
}

pub async fn rollkit_submit(
    State(node): State<Arc<DaNode>>,
    Json(request): Json<RollkitSubmitRequest>,
) -> Response {
    let blobs = match decode_all(&request.blobs) {
        Ok(blobs) => blobs,
        Err(e) => return bad_request(format!("Blob is not valid base64: {e}")),
    };
    make_request_and_return_response!(
        async {
            node.rollkit.submit(&blobs).await.map(|ids| RollkitIds {
                ids: encode_all(ids),
            })
        },
        rollkit_status
    )
}

pub async fn rollkit_get(
    State(node): State<Arc<DaNode>>,
    Json(request): Json<RollkitIds>,
) -> Response {
    let ids = match decode_all(&request.ids) {
        Ok(ids) => ids,
        Err(e) => return bad_request(format!("Blob id is not valid base64: {e}")),
    };
    make_request_and_return_response!(
        async {
            node.rollkit.get(&ids).await.map(|blobs| RollkitBlobs {
                blobs: encode_all(blobs),
            })
        },
        rollkit_status
    )
}

fn octet_stream(body: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "application/octet-stream")],
        body,
    )
        .into_response()
}
