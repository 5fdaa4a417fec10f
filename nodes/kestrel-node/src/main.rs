// std
use std::sync::Arc;
// crates
use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, span, Level};
use uuid::Uuid;
// internal
use kestrel_da_storage::ShardStore;
use kestrel_node::api::backend::AxumBackend;
use kestrel_node::config::Config;
use kestrel_node::{
    chain_context, start_validator, storage_registry, DaNode, HttpArgs, LogArgs, ValidatorArgs,
};
use prover_http_client::HttpProver;

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Serve the publish, retrieve and alt-da api
    Serve,
    /// Serve the api and audit published commitments as a validator
    Validate,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path for a yaml-encoded node config file
    config: std::path::PathBuf,
    #[command(subcommand)]
    command: Command,
    /// Overrides log config.
    #[clap(flatten)]
    log_args: LogArgs,
    /// Overrides http config.
    #[clap(flatten)]
    http_args: HttpArgs,
    /// Overrides validator config.
    #[clap(flatten)]
    validator_args: ValidatorArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let Args {
        config,
        command,
        log_args,
        http_args,
        validator_args,
    } = Args::parse();
    let config = serde_yaml::from_reader::<_, Config>(std::fs::File::open(config)?)?
        .update_from_args(log_args, http_args, validator_args)?;

    let _logger_guard =
        kestrel_tracing::init(config.log.clone()).map_err(|e| eyre!("Error encountered: {}", e))?;

    #[cfg(debug_assertions)]
    let debug_span = {
        let debug_id = Uuid::new_v4();
        span!(Level::DEBUG, "Kestrel", debug_id = debug_id.to_string())
    };
    #[cfg(debug_assertions)]
    let _guard = debug_span.enter();

    let Config {
        http,
        storage,
        chain,
        prover,
        publish,
        validator,
        alt_da,
        rollkit,
        ..
    } = config;

    let store = ShardStore::new(storage_registry(&storage)?, storage.shards.clone());
    let validator_address = match command {
        Command::Serve => None,
        Command::Validate => Some(
            validator
                .address
                .clone()
                .ok_or_else(|| eyre!("Validating requires a validator address."))?,
        ),
    };
    let chain = chain_context(&chain, validator_address.as_deref())?;
    let shutdown = CancellationToken::new();

    let watcher = match validator_address {
        Some(_) => {
            let prover = HttpProver::new(prover)?;
            let (task, _handle) = start_validator(
                chain.clone(),
                store.clone(),
                prover,
                validator,
                shutdown.clone(),
            )
            .await?;
            Some(task)
        }
        None => None,
    };

    let node = Arc::new(DaNode::new(chain, store, publish, alt_da, rollkit));
    let server = tokio::spawn(AxumBackend::new(http).serve(node, shutdown.clone()));

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    shutdown.cancel();

    if let Err(err) = server.await? {
        error!("Http api stopped due to {err:?}");
    }
    if let Some(watcher) = watcher {
        watcher.await?;
    }
    Ok(())
}
