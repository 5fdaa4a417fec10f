//! Structured logging for kestrel binaries.
//!
//! A node builds a [`TracingSettings`] from its config file, calls [`init`]
//! once at startup and holds on to the returned [`WorkerGuard`] until exit.

pub mod filter;
pub mod logging;
pub mod panic;

// std
use std::error::Error;
// crates
use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};
// internal
use crate::filter::envfilter::{create_envfilter_layer, EnvFilterConfig};
use crate::logging::local::{create_file_layer, create_writer_layer, FileConfig};

pub type DynError = Box<dyn Error + Send + Sync + 'static>;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoggerLayer {
    File(FileConfig),
    #[default]
    Stdout,
    Stderr,
    None,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterLayer {
    EnvFilter(EnvFilterConfig),
    #[default]
    None,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TracingSettings {
    #[serde(default)]
    pub logger: LoggerLayer,
    #[serde(default)]
    pub filter: FilterLayer,
    #[serde(with = "serde_level", default = "default_level")]
    pub level: Level,
}

impl Default for TracingSettings {
    fn default() -> Self {
        Self {
            logger: LoggerLayer::Stdout,
            filter: FilterLayer::None,
            level: default_level(),
        }
    }
}

impl TracingSettings {
    #[must_use]
    pub const fn new(logger: LoggerLayer, filter: FilterLayer, level: Level) -> Self {
        Self {
            logger,
            filter,
            level,
        }
    }
}

const fn default_level() -> Level {
    Level::INFO
}

/// Installs the global subscriber and the panic hook.
///
/// Pending log lines are flushed when the returned guard is dropped.
pub fn init(settings: TracingSettings) -> Result<Option<WorkerGuard>, DynError> {
    let TracingSettings {
        logger,
        filter,
        level,
    } = settings;

    let mut layers: Vec<Box<dyn tracing_subscriber::Layer<_> + Send + Sync>> = vec![];

    let guard = match logger {
        LoggerLayer::File(config) => {
            let (layer, guard) = create_file_layer(config);
            layers.push(Box::new(layer));
            Some(guard)
        }
        LoggerLayer::Stdout => {
            let (layer, guard) = create_writer_layer(std::io::stdout());
            layers.push(Box::new(layer));
            Some(guard)
        }
        LoggerLayer::Stderr => {
            let (layer, guard) = create_writer_layer(std::io::stderr());
            layers.push(Box::new(layer));
            Some(guard)
        }
        LoggerLayer::None => None,
    };

    if let FilterLayer::EnvFilter(config) = filter {
        layers.push(Box::new(create_envfilter_layer(&config)?));
    }

    if layers.is_empty() {
        return Ok(None);
    }

    tracing_subscriber::registry()
        .with(LevelFilter::from(level))
        .with(layers)
        .try_init()?;

    std::panic::set_hook(Box::new(panic::panic_hook));

    Ok(guard)
}

mod serde_level {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use tracing::Level;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(|e| D::Error::custom(format!("invalid log level {e}")))
    }

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S>(value: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value.as_str())
    }
}
