//! Feature configuration aggregation.
//!
//! The feature query joins each feature against its strategies, segments,
//! tags and dependencies, so one feature arrives as many flat rows. This crate
//! folds that row stream back into exactly one configuration per feature,
//! with one entry per strategy, and shapes it for admin or client consumers.
//!
//! The engine is a pure synchronous transform: every call owns its state and
//! may run concurrently with any other call.

pub mod errors;
pub mod fold;
pub mod metrics_defs;
pub mod parameters;
pub mod query;
pub mod row;
pub mod shaper;
pub mod source;
pub mod strategy;

#[cfg(test)]
mod testutils;

pub use errors::{AggregationError, QueryError, Result, SourceError};
pub use query::{FeatureQuery, SegmentMode, ShapeMode, TagFilter};
pub use row::FeatureRow;
pub use shaper::{ClientFeaturesResponse, FeatureConfiguration, StrategyConfig};

use metrics_defs::{
    AGGREGATION_DURATION, AGGREGATION_ERRORS, AGGREGATION_FEATURES, AGGREGATION_ROWS,
};
use shared::{counter, histogram};
use std::time::Instant;

/// Aggregates a row stream into one configuration per feature, in the order
/// features first appear in the stream.
///
/// The query's filters are expected to be applied by the row source already.
pub fn aggregate<I>(
    rows: I,
    shape: ShapeMode,
    query: &FeatureQuery,
) -> Result<Vec<FeatureConfiguration>>
where
    I: IntoIterator<Item = FeatureRow>,
{
    aggregate_response(rows, shape, query).map(|response| response.features)
}

/// Like [`aggregate`], wrapped in the response envelope.
pub fn aggregate_response<I>(
    rows: I,
    shape: ShapeMode,
    query: &FeatureQuery,
) -> Result<ClientFeaturesResponse>
where
    I: IntoIterator<Item = FeatureRow>,
{
    let start = Instant::now();

    let aggregation = match fold::fold_rows(rows, query.segment_mode()) {
        Ok(aggregation) => aggregation,
        Err(e) => {
            counter!(AGGREGATION_ERRORS).increment(1);
            tracing::error!(error = %e, environment = %query.environment, "Aggregation aborted");
            return Err(e);
        }
    };
    let row_count = aggregation.rows;

    let response = shaper::build_response(aggregation, shape, query);

    counter!(AGGREGATION_ROWS).increment(row_count as u64);
    counter!(AGGREGATION_FEATURES, "shape" => shape.as_str())
        .increment(response.features.len() as u64);
    histogram!(AGGREGATION_DURATION, "shape" => shape.as_str())
        .record(start.elapsed().as_secs_f64());

    tracing::debug!(
        rows = row_count,
        features = response.features.len(),
        shape = %shape,
        environment = %query.environment,
        "Aggregated feature configurations"
    );

    Ok(response)
}
