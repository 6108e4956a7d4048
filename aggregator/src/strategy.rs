//! Strategy assembly.
//!
//! Segment fan-out repeats a strategy on one row per attached segment. The
//! `StrategySet` keeps one entry per strategy id in insertion order, with an
//! index for constant-time membership checks, and folds each segment row into
//! the entry it belongs to.

use crate::errors::{AggregationError, Result};
use crate::parameters::normalize_parameters;
use crate::query::SegmentMode;
use crate::row::{FeatureRow, SegmentFragment, SegmentId, StrategyId};
use indexmap::IndexMap;
use serde_json::{Number, Value as JsonValue};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyEntry {
    pub id: StrategyId,
    pub name: String,
    pub title: Option<String>,
    pub disabled: Option<bool>,
    pub parameters: IndexMap<String, String>,
    /// The strategy's own constraints, followed by inlined segment constraints
    /// in inline mode.
    pub constraints: Vec<JsonValue>,
    /// Referenced segment ids. Always empty in inline mode.
    pub segments: Vec<SegmentId>,
    pub sort_order: Option<Number>,
    pub variants: Vec<JsonValue>,
}

impl StrategyEntry {
    pub fn from_row(id: &str, row: &FeatureRow) -> Self {
        StrategyEntry {
            id: id.to_string(),
            name: row.strategy_name.clone().unwrap_or_default(),
            title: row.strategy_title.clone(),
            disabled: row.strategy_disabled,
            parameters: normalize_parameters(row.parameters.as_ref()),
            constraints: row.constraints.clone().unwrap_or_default(),
            segments: Vec::new(),
            sort_order: row.sort_order.clone(),
            variants: row.strategy_variants.clone().unwrap_or_default(),
        }
    }

    pub fn attach_segment(&mut self, mode: SegmentMode, segment: &SegmentFragment<'_>) {
        match mode {
            SegmentMode::Inline => self.constraints.extend_from_slice(segment.constraints),
            SegmentMode::Reference => self.segments.push(segment.id),
        }
    }
}

/// Strategies of one feature, deduplicated by id.
#[derive(Debug, Default)]
pub struct StrategySet {
    entries: IndexMap<StrategyId, StrategyEntry>,
    disabled: HashSet<StrategyId>,
}

impl StrategySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the strategy fragment of `row` the first time its id is seen.
    ///
    /// Disabled strategies are remembered but never materialized, so their
    /// segment rows can be told apart from rows referencing unknown ids.
    pub fn ingest(&mut self, row: &FeatureRow) {
        let Some(id) = row.strategy_id.as_deref() else {
            return;
        };
        if self.entries.contains_key(id) || self.disabled.contains(id) {
            return;
        }
        if row.is_strategy_disabled() {
            self.disabled.insert(id.to_string());
        } else {
            self.entries
                .insert(id.to_string(), StrategyEntry::from_row(id, row));
        }
    }

    /// Attaches a segment row to the strategy it references.
    ///
    /// Returns `Ok(false)` when the strategy is disabled and the segment was
    /// dropped along with it.
    pub fn attach_segment(
        &mut self,
        feature: &str,
        mode: SegmentMode,
        segment: &SegmentFragment<'_>,
    ) -> Result<bool> {
        let Some(strategy_id) = segment.strategy_id else {
            return Err(AggregationError::SegmentWithoutStrategy {
                feature: feature.to_string(),
                segment_id: segment.id,
            });
        };

        if let Some(entry) = self.entries.get_mut(strategy_id) {
            entry.attach_segment(mode, segment);
            Ok(true)
        } else if self.disabled.contains(strategy_id) {
            Ok(false)
        } else {
            Err(AggregationError::UnknownSegmentStrategy {
                feature: feature.to_string(),
                strategy_id: strategy_id.to_string(),
                segment_id: segment.id,
            })
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&StrategyEntry> {
        self.entries.get(id)
    }

    /// Entries in first-seen order.
    pub fn into_entries(self) -> Vec<StrategyEntry> {
        self.entries.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::RowBuilder;
    use serde_json::json;

    #[test]
    fn test_entry_from_row() {
        let row = RowBuilder::new("f")
            .strategy("s1", "flexibleRollout")
            .title("Half")
            .parameters(json!({"rollout": 50, "stickiness": "default"}))
            .constraints(json!([{"contextName": "userId"}]))
            .sort_order(2)
            .strategy_variants(json!([{"name": "blue", "weight": 1000}]))
            .build();

        let entry = StrategyEntry::from_row("s1", &row);

        assert_eq!(entry.id, "s1");
        assert_eq!(entry.name, "flexibleRollout");
        assert_eq!(entry.title.as_deref(), Some("Half"));
        assert_eq!(entry.parameters["rollout"], "50");
        assert_eq!(entry.constraints, vec![json!({"contextName": "userId"})]);
        assert_eq!(entry.sort_order, Some(Number::from(2)));
        assert_eq!(entry.variants.len(), 1);
        assert!(entry.segments.is_empty());
    }

    #[test]
    fn test_constraints_are_copied() {
        let row = RowBuilder::new("f")
            .strategy("s1", "default")
            .constraints(json!([{"contextName": "a"}]))
            .segment(1, json!([{"contextName": "b"}]))
            .build();

        let mut set = StrategySet::new();
        set.ingest(&row);
        set.attach_segment("f", SegmentMode::Inline, &row.segment().unwrap())
            .unwrap();

        assert_eq!(set.get("s1").unwrap().constraints.len(), 2);
        assert_eq!(row.constraints.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_ingest_deduplicates() {
        let mut set = StrategySet::new();
        set.ingest(&RowBuilder::new("f").strategy("s1", "a").build());
        set.ingest(&RowBuilder::new("f").strategy("s1", "b").build());
        set.ingest(&RowBuilder::new("f").strategy("s2", "c").build());

        assert_eq!(set.len(), 2);
        assert_eq!(set.get("s1").unwrap().name, "a");
    }

    #[test]
    fn test_disabled_strategy_is_not_materialized() {
        let row = RowBuilder::new("f")
            .strategy("s1", "default")
            .disabled(true)
            .segment(3, json!([]))
            .build();

        let mut set = StrategySet::new();
        set.ingest(&row);
        assert!(set.is_empty());

        let attached = set
            .attach_segment("f", SegmentMode::Reference, &row.segment().unwrap())
            .unwrap();
        assert!(!attached);
    }

    #[test]
    fn test_reference_mode_records_ids_only() {
        let mut set = StrategySet::new();
        let first = RowBuilder::new("f")
            .strategy("s1", "default")
            .segment(1, json!([{"contextName": "x"}]))
            .build();
        let second = RowBuilder::new("f")
            .strategy("s1", "default")
            .segment(2, json!([{"contextName": "y"}]))
            .build();

        for row in [&first, &second] {
            set.ingest(row);
            set.attach_segment("f", SegmentMode::Reference, &row.segment().unwrap())
                .unwrap();
        }

        let entry = set.get("s1").unwrap();
        assert_eq!(entry.segments, vec![1, 2]);
        assert!(entry.constraints.is_empty());
    }

    #[test]
    fn test_unknown_strategy_is_an_error() {
        let row = RowBuilder::new("f").segment(9, json!([])).build();
        let mut set = StrategySet::new();

        let err = set
            .attach_segment("f", SegmentMode::Inline, &row.segment().unwrap())
            .unwrap_err();
        assert_eq!(
            err,
            AggregationError::SegmentWithoutStrategy {
                feature: "f".into(),
                segment_id: 9
            }
        );

        let row = RowBuilder::new("f")
            .strategy_id_only("ghost")
            .segment(9, json!([]))
            .build();
        let err = set
            .attach_segment("f", SegmentMode::Inline, &row.segment().unwrap())
            .unwrap_err();
        assert!(matches!(
            err,
            AggregationError::UnknownSegmentStrategy { ref strategy_id, .. } if strategy_id == "ghost"
        ));
    }
}
