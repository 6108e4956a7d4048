use crate::row::SegmentId;
use thiserror::Error;

/// Result type alias for aggregation operations
pub type Result<T, E = AggregationError> = std::result::Result<T, E>;

/// Data-integrity failures that abort an aggregation call.
///
/// None of these can happen when the row source honors its column contract,
/// so each one points at an upstream defect. No partial result is produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregationError {
    #[error("row {row} has no feature name")]
    MissingFeatureName { row: usize },

    #[error("segment {segment_id} of feature {feature} references unknown strategy {strategy_id}")]
    UnknownSegmentStrategy {
        feature: String,
        strategy_id: String,
        segment_id: SegmentId,
    },

    #[error("segment {segment_id} of feature {feature} is not attached to any strategy")]
    SegmentWithoutStrategy {
        feature: String,
        segment_id: SegmentId,
    },
}

/// Errors raised while parsing query parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("invalid tag filter {0:?}, expected type:value")]
    InvalidTagFilter(String),

    #[error("unknown shape {0:?}, expected one of full, client, playground")]
    UnknownShape(String),
}

/// Errors raised by row sources
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("could not read rows: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse rows: {0}")]
    Parse(#[from] serde_json::Error),
}
