pub mod arweave;
pub mod ipfs;
#[cfg(any(test, feature = "mock"))]
pub mod memory;

// crates
use reqwest::{Response, StatusCode};
// internal
use crate::StorageError;

/// Maps non-success responses of a storage gateway onto [`StorageError`].
pub(crate) async fn check_response(response: Response, target: &str) -> Result<Response, StorageError> {
    let status = response.status();
    match status {
        StatusCode::OK => Ok(response),
        StatusCode::NOT_FOUND => Err(StorageError::NotFound(target.to_owned())),
        _ => {
            let body = response.text().await.map_err(StorageError::Request)?;
            Err(StorageError::Backend(format!(
                "Unexpected response [{status}]: {body}"
            )))
        }
    }
}
