use aggregator::{FeatureQuery, ShapeMode};
use serde::Deserialize;
use std::fs::File;
use std::str::FromStr;

pub const DEFAULT_LOG_LEVEL: &str = "info";

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_metrics_prefix() -> String {
    "flagfold".to_string()
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
    #[serde(default = "default_metrics_prefix")]
    pub prefix: String,
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,
    pub sentry_dsn: Option<String>,
}

#[derive(Deserialize, Debug, Default, PartialEq)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    pub logging: Option<LoggingConfig>,
}

/// Defaults for aggregation runs. Command line flags take precedence.
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct AggregationConfig {
    pub shape: ShapeMode,
    pub query: FeatureQuery,
}

#[derive(Deserialize, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config: Config = serde_yaml::from_reader(file)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(metrics) = &self.common.metrics
            && metrics.statsd_port == 0
        {
            return Err(ConfigError::InvalidPort);
        }

        if let Some(dsn) = self
            .common
            .logging
            .as_ref()
            .and_then(|logging| logging.sentry_dsn.as_deref())
        {
            sentry::types::Dsn::from_str(dsn)
                .map_err(|e| ConfigError::InvalidSentryDsn(e.to_string()))?;
        }

        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("statsd port cannot be 0")]
    InvalidPort,
    #[error("invalid sentry dsn: {0}")]
    InvalidSentryDsn(String),
}
