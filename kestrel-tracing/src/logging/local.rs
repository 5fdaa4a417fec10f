// std
use std::{io::Write, path::PathBuf};
// crates
use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{
    format::{DefaultFields, Format},
    Layer,
};
// internal

pub type FmtLayer<S> = Layer<S, DefaultFields, Format, NonBlocking>;

const DEFAULT_LOG_FILE: &str = "kestrel.log";

/// How often a node starts a new log file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileRotation {
    Minutely,
    #[default]
    Hourly,
    Daily,
    Never,
}

impl From<FileRotation> for Rotation {
    fn from(rotation: FileRotation) -> Self {
        match rotation {
            FileRotation::Minutely => Self::MINUTELY,
            FileRotation::Hourly => Self::HOURLY,
            FileRotation::Daily => Self::DAILY,
            FileRotation::Never => Self::NEVER,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileConfig {
    pub directory: PathBuf,
    /// File name, suffixed with the rotation date unless rotation is `never`.
    pub prefix: Option<PathBuf>,
    #[serde(default)]
    pub rotation: FileRotation,
}

pub fn create_file_layer<S>(config: FileConfig) -> (FmtLayer<S>, WorkerGuard) {
    let FileConfig {
        directory,
        prefix,
        rotation,
    } = config;
    let appender = RollingFileAppender::new(
        rotation.into(),
        directory,
        prefix.unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
    );

    let (layer, guard) = create_writer_layer(appender);
    (layer.with_ansi(false), guard)
}

/// Lines are written from a background thread for as long as the guard lives.
pub fn create_writer_layer<S, W>(writer: W) -> (FmtLayer<S>, WorkerGuard)
where
    W: Write + Send + 'static,
{
    let (writer, guard) = tracing_appender::non_blocking(writer);
    let layer = Layer::new()
        .with_level(true)
        .with_target(true)
        .with_writer(writer);
    (layer, guard)
}
