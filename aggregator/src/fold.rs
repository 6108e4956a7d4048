//! Row grouping and folding.
//!
//! Rows arrive in stream order, fanned out across strategies, segments, tags
//! and dependencies. Each row is merged into the accumulator of its feature;
//! accumulators are kept in first-seen order so the output follows the order
//! of the stream.

use crate::errors::{AggregationError, Result};
use crate::query::SegmentMode;
use crate::row::{Dependency, FeatureRow, SegmentId, Tag};
use crate::strategy::StrategySet;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Working state for one feature during a single aggregation call.
///
/// Feature-level columns are taken from the first row seen for the feature
/// and never overwritten. Environment columns follow the last row that
/// carries them.
#[derive(Debug)]
pub struct Accumulator {
    pub name: String,
    pub description: Option<String>,
    pub feature_type: Option<String>,
    pub project: Option<String>,
    pub stale: bool,
    pub impression_data: bool,
    pub created_at: Option<String>,
    pub last_seen_at: Option<String>,
    pub favorite: Option<bool>,

    pub enabled: bool,
    pub variants: Vec<JsonValue>,

    pub strategies: StrategySet,
    pub tags: IndexSet<Tag>,
    /// Keyed by parent feature name.
    pub dependencies: IndexMap<String, Dependency>,
}

impl Accumulator {
    fn new(name: &str, row: &FeatureRow) -> Self {
        Accumulator {
            name: name.to_string(),
            description: row.description.clone(),
            feature_type: row.feature_type.clone(),
            project: row.project.clone(),
            stale: row.stale.unwrap_or(false),
            impression_data: row.impression_data.unwrap_or(false),
            created_at: row.created_at.clone(),
            last_seen_at: row.last_seen_at.clone(),
            favorite: row.favorite,
            enabled: false,
            variants: Vec::new(),
            strategies: StrategySet::new(),
            tags: IndexSet::new(),
            dependencies: IndexMap::new(),
        }
    }

    /// Merges one row's fragments. Returns the segment id when a segment was
    /// attached by reference.
    fn merge_row(&mut self, row: &FeatureRow, mode: SegmentMode) -> Result<Option<SegmentId>> {
        if let Some(enabled) = row.enabled {
            self.enabled = enabled;
        }
        if let Some(variants) = &row.variants {
            self.variants = variants.clone();
        }

        self.strategies.ingest(row);

        let mut referenced = None;
        if let Some(segment) = row.segment() {
            let attached = self.strategies.attach_segment(&self.name, mode, &segment)?;
            if attached && mode == SegmentMode::Reference {
                referenced = Some(segment.id);
            }
        }

        if let Some(tag) = row.tag() {
            self.tags.insert(tag);
        }

        if let Some(dependency) = row.dependency() {
            // Fan-out repeats each edge, keep one per parent.
            self.dependencies
                .entry(dependency.feature.clone())
                .or_insert(dependency);
        }

        Ok(referenced)
    }
}

/// A segment as sent alongside referencing strategies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentDefinition {
    pub id: SegmentId,
    pub constraints: Vec<JsonValue>,
}

/// Result of folding a row stream.
#[derive(Debug, Default)]
pub struct Aggregation {
    pub features: IndexMap<String, Accumulator>,
    /// Segments referenced by materialized strategies, reference mode only.
    pub segments: IndexMap<SegmentId, SegmentDefinition>,
    pub rows: usize,
}

/// Folds the row stream into one accumulator per feature.
///
/// Any data-integrity error aborts the whole fold.
pub fn fold_rows<I>(rows: I, mode: SegmentMode) -> Result<Aggregation>
where
    I: IntoIterator<Item = FeatureRow>,
{
    let mut aggregation = Aggregation::default();

    for (index, row) in rows.into_iter().enumerate() {
        aggregation.rows += 1;

        let Some(name) = row.name.as_deref() else {
            return Err(AggregationError::MissingFeatureName { row: index });
        };

        let position = match aggregation.features.get_index_of(name) {
            Some(position) => position,
            None => {
                aggregation
                    .features
                    .insert_full(name.to_string(), Accumulator::new(name, &row))
                    .0
            }
        };

        let feature = &mut aggregation.features[position];
        if let Some(segment_id) = feature.merge_row(&row, mode)? {
            aggregation
                .segments
                .entry(segment_id)
                .or_insert_with(|| SegmentDefinition {
                    id: segment_id,
                    constraints: row.segment_constraints.clone().unwrap_or_default(),
                });
        }
    }

    Ok(aggregation)
}
