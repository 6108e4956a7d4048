//! Logging and metrics setup for the command line.

use crate::config::{DEFAULT_LOG_LEVEL, LoggingConfig, MetricsConfig};
use crate::errors::CliError;
use metrics_exporter_statsd::StatsdBuilder;
use std::str::FromStr;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global tracing subscriber.
///
/// Logs go to stderr so stdout carries only the JSON output. When a sentry
/// DSN is configured, events are forwarded to sentry as well; the returned
/// guard flushes them on drop and must be held until exit.
pub fn init_logging(config: Option<&LoggingConfig>) -> Option<sentry::ClientInitGuard> {
    let level = config.map_or(DEFAULT_LOG_LEVEL, |logging| logging.level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // The DSN was validated when the config was loaded.
    let guard = config
        .and_then(|logging| logging.sentry_dsn.as_deref())
        .and_then(|dsn| sentry::types::Dsn::from_str(dsn).ok())
        .map(|dsn| {
            sentry::init(sentry::ClientOptions {
                dsn: Some(dsn),
                release: sentry::release_name!(),
                ..Default::default()
            })
        });
    let sentry_layer = guard
        .as_ref()
        .map(|_| sentry::integrations::tracing::layer());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(sentry_layer)
        .init();

    guard
}

/// Installs the statsd recorder and registers metric descriptions.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), CliError> {
    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(&config.prefix))
        .map_err(|e| CliError::Metrics(e.to_string()))?;
    metrics::set_global_recorder(recorder).map_err(|e| CliError::Metrics(e.to_string()))?;

    shared::metrics_defs::describe_all(aggregator::metrics_defs::ALL_METRICS);
    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "Metrics exporter installed"
    );
    Ok(())
}
