// std
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
// crates
use axum::{extract::DefaultBodyLimit, http::HeaderValue, routing, Router, Server};
use hyper::header::{CONTENT_TYPE, USER_AGENT};
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
// internal
use super::handlers::{
    get_blob, get_commitment, publish, publish_file, put_blob, rollkit_get, rollkit_max_blob_size,
    rollkit_submit, shard_hashes, welcome, MAX_FILE_SIZE,
};
use super::paths;
use crate::DaNode;

/// Configuration for the Http Server
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct AxumBackendSettings {
    /// Socket where the server will be listening on for incoming requests.
    pub address: SocketAddr,
    /// Allowed origins for this server deployment requests.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Invalid cors origin {origin}")]
    InvalidOrigin { origin: String },
    #[error(transparent)]
    Bind(#[from] std::io::Error),
    #[error(transparent)]
    Server(#[from] hyper::Error),
}

pub struct AxumBackend {
    settings: AxumBackendSettings,
}

impl AxumBackend {
    #[must_use]
    pub const fn new(settings: AxumBackendSettings) -> Self {
        Self { settings }
    }

    pub fn router(&self, node: Arc<DaNode>) -> Result<Router, ApiError> {
        let mut builder = CorsLayer::new();
        if self.settings.cors_origins.is_empty() {
            builder = builder.allow_origin(Any);
        }

        for origin in &self.settings.cors_origins {
            let value = origin
                .as_str()
                .parse::<HeaderValue>()
                .map_err(|_| ApiError::InvalidOrigin {
                    origin: origin.clone(),
                })?;
            builder = builder.allow_origin(value);
        }

        Ok(Router::new()
            .route(paths::WELCOME, routing::get(welcome))
            .route(paths::PUBLISH, routing::post(publish))
            .route(
                paths::PUBLISH_FILE,
                routing::post(publish_file).layer(DefaultBodyLimit::max(MAX_FILE_SIZE)),
            )
            .route(paths::GET_BLOB, routing::get(get_blob))
            .route(paths::SHARD_HASHES, routing::get(shard_hashes))
            .route(paths::ALT_DA_PUT, routing::post(put_blob))
            .route(paths::ALT_DA_GET, routing::get(get_commitment))
            .route(paths::ROLLKIT_SUBMIT, routing::post(rollkit_submit))
            .route(paths::ROLLKIT_GET, routing::post(rollkit_get))
            .route(paths::ROLLKIT_MAX_BLOB_SIZE, routing::get(rollkit_max_blob_size))
            .layer(
                builder
                    .allow_headers([CONTENT_TYPE, USER_AGENT])
                    .allow_methods(Any),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(node))
    }

    pub async fn serve(self, node: Arc<DaNode>, shutdown: CancellationToken) -> Result<(), ApiError> {
        let listener = TcpListener::bind(self.settings.address)?;
        self.serve_from(listener, node, shutdown).await
    }

    /// Serves on an already bound listener until `shutdown` is cancelled.
    pub async fn serve_from(
        self,
        listener: TcpListener,
        node: Arc<DaNode>,
        shutdown: CancellationToken,
    ) -> Result<(), ApiError> {
        let app = self.router(node)?;
        info!("Http api listening on {}", listener.local_addr()?);
        Server::from_tcp(listener)?
            .serve(app.into_make_service())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;
        Ok(())
    }
}
