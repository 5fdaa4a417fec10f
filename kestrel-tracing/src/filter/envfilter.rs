// std
use std::collections::BTreeMap;
use std::error::Error;
// crates
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
// internal

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EnvFilterConfig {
    /// Log level per target, e.g. `kestrel_validator: debug`.
    /// More: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html#directives
    pub filters: BTreeMap<String, String>,
}

impl EnvFilterConfig {
    #[must_use]
    pub fn directives(&self) -> String {
        self.filters
            .iter()
            .map(|(target, level)| format!("{target}={level}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

pub fn create_envfilter_layer(
    config: &EnvFilterConfig,
) -> Result<EnvFilter, Box<dyn Error + Send + Sync>> {
    EnvFilter::try_new(config.directives()).map_err(Into::into)
}
