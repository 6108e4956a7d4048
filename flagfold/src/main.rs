mod config;
mod errors;
mod telemetry;

use aggregator::metrics_defs::ALL_METRICS;
use aggregator::source::{JsonFileSource, RowSource};
use aggregator::{FeatureQuery, ShapeMode, TagFilter};
use clap::{Args, Parser};
use config::{AggregationConfig, Config};
use errors::CliError;
use std::path::PathBuf;
use std::process::ExitCode;

/// Folds feature query rows into feature configurations.
#[derive(Parser)]
#[command(name = "flagfold", version)]
enum CliCommand {
    /// Aggregate a JSON row file and print the configuration response.
    Aggregate(AggregateArgs),
    /// List the metrics emitted during aggregation.
    ListMetrics,
}

#[derive(Args, Debug)]
struct AggregateArgs {
    /// JSON file holding an array of feature rows.
    #[arg(long)]
    rows: PathBuf,
    /// YAML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output shape: full, client or playground.
    #[arg(long)]
    shape: Option<ShapeMode>,
    /// Inline segment constraints into strategies instead of referencing segment ids.
    #[arg(long)]
    inline_segments: bool,
    #[arg(long)]
    environment: Option<String>,
    #[arg(long = "project")]
    projects: Vec<String>,
    /// Tag filter in `type:value` form.
    #[arg(long = "tag")]
    tags: Vec<TagFilter>,
    #[arg(long = "name")]
    names: Vec<String>,
    #[arg(long)]
    prefix: Option<String>,
    #[arg(long)]
    pretty: bool,
}

impl AggregateArgs {
    /// Applies command line overrides on top of the configured defaults.
    fn resolve(&self, defaults: AggregationConfig) -> (ShapeMode, FeatureQuery) {
        let shape = self.shape.unwrap_or(defaults.shape);
        let mut query = defaults.query;

        if self.inline_segments {
            query.inline_segment_constraints = true;
        }
        if let Some(environment) = &self.environment {
            query.environment = environment.clone();
        }
        if !self.projects.is_empty() {
            query.projects = self.projects.clone();
        }
        if !self.tags.is_empty() {
            query.tags = self.tags.clone();
        }
        if !self.names.is_empty() {
            query.names = self.names.clone();
        }
        if let Some(prefix) = &self.prefix {
            query.name_prefix = Some(prefix.clone());
        }

        (shape, query)
    }
}

fn run_aggregate(args: AggregateArgs) -> Result<(), CliError> {
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let _sentry = telemetry::init_logging(config.common.logging.as_ref());
    if let Some(metrics_config) = &config.common.metrics {
        telemetry::init_metrics(metrics_config)?;
    }

    let (shape, query) = args.resolve(config.aggregation);
    tracing::info!(
        rows = %args.rows.display(),
        shape = %shape,
        environment = %query.environment,
        "Starting aggregation"
    );

    let source = JsonFileSource::new(&args.rows);
    let rows = source.fetch(&query)?;
    let response = aggregator::aggregate_response(rows, shape, &query)?;

    let output = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{output}");

    tracing::info!(
        features = response.features.len(),
        "Wrote feature configurations"
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = CliCommand::parse();

    match cli {
        CliCommand::Aggregate(args) => match run_aggregate(args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, "flagfold failed");
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        },
        CliCommand::ListMetrics => {
            for def in ALL_METRICS {
                println!(
                    "{}\t{}\t{}",
                    def.name,
                    def.metric_type.as_str(),
                    def.description
                );
            }
            ExitCode::SUCCESS
        }
    }
}
