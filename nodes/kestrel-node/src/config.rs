// std
use std::net::SocketAddr;
use std::path::PathBuf;
// crates
use clap::{Parser, ValueEnum};
use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use tracing::Level;
// internal
use crate::altda::AltDaSettings;
use crate::api::backend::AxumBackendSettings;
use crate::rollkit::RollkitSettings;
use chain_http_client::ChainClientSettings;
use kestrel_da_storage::backends::arweave::ArweaveSettings;
use kestrel_da_storage::backends::ipfs::IpfsSettings;
use kestrel_da_storage::ShardStoreSettings;
use kestrel_dispersal::PublisherSettings;
use kestrel_tracing::logging::local::{FileConfig, FileRotation};
use kestrel_tracing::{LoggerLayer, TracingSettings};
use kestrel_validator::{AuditPolicy, WatcherSettings};
use prover_http_client::ProverClientSettings;

#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LoggerLayerType {
    File,
    #[default]
    Stdout,
    Stderr,
}

#[derive(Parser, Debug, Clone)]
pub struct LogArgs {
    /// Directory for the File backend
    #[clap(long = "log-dir", env = "LOG_DIR", required_if_eq("backend", "file"))]
    directory: Option<PathBuf>,

    /// Prefix for the File backend
    #[clap(long = "log-path", env = "LOG_PATH")]
    prefix: Option<PathBuf>,

    /// Backend type
    #[clap(long = "log-backend", env = "LOG_BACKEND", value_enum)]
    backend: Option<LoggerLayerType>,

    #[clap(long = "log-level", env = "LOG_LEVEL")]
    level: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct HttpArgs {
    #[clap(long = "http-host", env = "HTTP_HOST")]
    http_addr: Option<SocketAddr>,

    #[clap(long = "http-cors-origin", env = "HTTP_CORS_ORIGIN")]
    cors_origins: Option<Vec<String>>,
}

#[derive(Parser, Debug, Clone)]
pub struct ValidatorArgs {
    /// Validator operator address the proofs are submitted for
    #[clap(long = "validator-address", env = "VALIDATOR_ADDRESS")]
    address: Option<String>,

    #[clap(long = "submit-challenge", env = "SUBMIT_CHALLENGE")]
    submit_challenge: Option<bool>,

    #[clap(long = "submit-proof", env = "SUBMIT_PROOF")]
    submit_proof: Option<bool>,

    /// First block height to scan
    #[clap(long = "start-height", env = "START_HEIGHT")]
    start_height: Option<u64>,
}

#[derive(Deserialize, Debug, Clone, Serialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub ipfs: Option<IpfsSettings>,
    #[serde(default)]
    pub arweave: Option<ArweaveSettings>,
    #[serde(default)]
    pub shards: ShardStoreSettings,
}

#[derive(Deserialize, Debug, Clone, Serialize)]
pub struct ChainSettings {
    pub gateway: ChainClientSettings,
    /// Account signing this node's transactions, the proof deputy on validators.
    pub sender: String,
}

#[derive(Deserialize, Debug, Clone, Default, Serialize)]
pub struct ValidatorSettings {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub policy: AuditPolicy,
    #[serde(default)]
    pub watcher: WatcherSettings,
}

#[derive(Deserialize, Debug, Clone, Serialize)]
pub struct Config {
    #[serde(default)]
    pub log: TracingSettings,
    pub http: AxumBackendSettings,
    pub storage: StorageSettings,
    pub chain: ChainSettings,
    pub prover: ProverClientSettings,
    #[serde(default)]
    pub publish: PublisherSettings,
    #[serde(default)]
    pub validator: ValidatorSettings,
    #[serde(default)]
    pub alt_da: AltDaSettings,
    #[serde(default)]
    pub rollkit: RollkitSettings,
}

impl Config {
    pub fn update_from_args(
        mut self,
        log_args: LogArgs,
        http_args: HttpArgs,
        validator_args: ValidatorArgs,
    ) -> Result<Self> {
        update_tracing(&mut self.log, log_args)?;
        update_http(&mut self.http, http_args)?;
        update_validator(&mut self.validator, validator_args)?;
        Ok(self)
    }
}

pub fn update_tracing(tracing: &mut TracingSettings, tracing_args: LogArgs) -> Result<()> {
    let LogArgs {
        backend,
        directory,
        prefix,
        level,
    } = tracing_args;

    if let Some(backend) = backend {
        tracing.logger = match backend {
            LoggerLayerType::File => LoggerLayer::File(FileConfig {
                directory: directory.ok_or_else(|| eyre!("File backend requires a directory."))?,
                prefix,
                rotation: FileRotation::default(),
            }),
            LoggerLayerType::Stdout => LoggerLayer::Stdout,
            LoggerLayerType::Stderr => LoggerLayer::Stderr,
        }
    };

    if let Some(level_str) = level {
        tracing.level = match level_str.as_str() {
            "TRACE" => Level::TRACE,
            "DEBUG" => Level::DEBUG,
            "INFO" => Level::INFO,
            "ERROR" => Level::ERROR,
            "WARN" => Level::WARN,
            _ => return Err(eyre!("Invalid log level provided.")),
        };
    }
    Ok(())
}

pub fn update_http(http: &mut AxumBackendSettings, http_args: HttpArgs) -> Result<()> {
    let HttpArgs {
        http_addr,
        cors_origins,
    } = http_args;

    if let Some(addr) = http_addr {
        http.address = addr;
    }

    if let Some(cors) = cors_origins {
        http.cors_origins = cors;
    }

    Ok(())
}

pub fn update_validator(
    validator: &mut ValidatorSettings,
    validator_args: ValidatorArgs,
) -> Result<()> {
    let ValidatorArgs {
        address,
        submit_challenge,
        submit_proof,
        start_height,
    } = validator_args;

    if let Some(address) = address {
        validator.address = Some(address);
    }
    if let Some(submit_challenge) = submit_challenge {
        validator.policy.submit_challenge = submit_challenge;
    }
    if let Some(submit_proof) = submit_proof {
        validator.policy.submit_proof = submit_proof;
    }
    if start_height.is_some() {
        validator.watcher.start_height = start_height;
    }

    Ok(())
}
