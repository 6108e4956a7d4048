use crate::config::ConfigError;
use aggregator::{AggregationError, SourceError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("aggregation failed: {0}")]
    Aggregation(#[from] AggregationError),

    #[error("could not serialize output: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("could not install metrics exporter: {0}")]
    Metrics(String),
}
