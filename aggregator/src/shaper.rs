//! Output shaping.
//!
//! One fold produces `Accumulator`s; each shape is a stateless projection of
//! them. The full shape serves admin listings, the client shape is what SDKs
//! evaluate, and the playground shape sits in between.

use crate::fold::{Accumulator, Aggregation, SegmentDefinition};
use crate::query::{FeatureQuery, ShapeMode};
use crate::row::{Dependency, SegmentId, Tag};
use crate::strategy::StrategyEntry;
use indexmap::IndexMap;
use serde::Serialize;
use std::cmp::Ordering;
use serde_json::{Number, Value as JsonValue};

/// Version of the client features response format.
pub const RESPONSE_VERSION: u32 = 2;

/// A strategy as it leaves the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    pub parameters: IndexMap<String, String>,
    pub constraints: Vec<JsonValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<SegmentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<Number>,
    pub variants: Vec<JsonValue>,
}

/// One configuration per feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureConfiguration {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub feature_type: Option<String>,
    pub project: Option<String>,
    pub stale: bool,
    pub impression_data: bool,
    pub enabled: bool,
    pub variants: Vec<JsonValue>,
    pub strategies: Vec<StrategyConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<Dependency>>,
}

/// Response envelope for feature configuration requests.
///
/// # Example
/// ```json
/// {
///   "version": 2,
///   "features": [{"name": "checkout", "enabled": true, "strategies": [...]}],
///   "query": {"environment": "production", "inlineSegmentConstraints": false},
///   "segments": [{"id": 7, "constraints": [...]}]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientFeaturesResponse {
    pub version: u32,
    pub features: Vec<FeatureConfiguration>,
    pub query: FeatureQuery,
    /// Present in reference mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<SegmentDefinition>>,
}

/// Orders strategies by ascending sort order.
///
/// The sort is stable. Strategies without a sort order keep their positions;
/// the remaining positions are filled by the numbered strategies in order.
pub fn sort_strategies(strategies: Vec<StrategyEntry>) -> Vec<StrategyEntry> {
    let mut slots = Vec::new();
    let mut numbered = Vec::new();
    let mut ordered: Vec<Option<StrategyEntry>> = Vec::with_capacity(strategies.len());

    for (position, strategy) in strategies.into_iter().enumerate() {
        if strategy.sort_order.is_some() {
            slots.push(position);
            numbered.push(strategy);
            ordered.push(None);
        } else {
            ordered.push(Some(strategy));
        }
    }

    numbered.sort_by(|a, b| {
        let a = a.sort_order.as_ref().and_then(Number::as_f64);
        let b = b.sort_order.as_ref().and_then(Number::as_f64);
        a.partial_cmp(&b).unwrap_or(Ordering::Equal)
    });
    for (slot, strategy) in slots.into_iter().zip(numbered) {
        ordered[slot] = Some(strategy);
    }

    ordered.into_iter().flatten().collect()
}

fn full_strategy(entry: StrategyEntry) -> StrategyConfig {
    StrategyConfig {
        id: Some(entry.id),
        name: entry.name,
        title: entry.title,
        disabled: entry.disabled,
        parameters: entry.parameters,
        constraints: entry.constraints,
        segments: entry.segments,
        sort_order: entry.sort_order,
        variants: entry.variants,
    }
}

fn client_strategy(entry: StrategyEntry) -> StrategyConfig {
    StrategyConfig {
        id: None,
        name: entry.name,
        title: None,
        disabled: entry.disabled,
        parameters: entry.parameters,
        constraints: entry.constraints,
        segments: entry.segments,
        sort_order: None,
        variants: entry.variants,
    }
}

fn playground_strategy(entry: StrategyEntry) -> StrategyConfig {
    let id = entry.id.clone();
    let title = entry.title.clone().filter(|title| !title.is_empty());
    StrategyConfig {
        id: Some(id),
        title,
        ..client_strategy(entry)
    }
}

/// Admin projection: keeps strategy ids, titles and sort orders, and tags.
pub fn to_full(feature: Accumulator) -> FeatureConfiguration {
    FeatureConfiguration {
        strategies: sort_strategies(feature.strategies.into_entries())
            .into_iter()
            .map(full_strategy)
            .collect(),
        name: feature.name,
        description: feature.description,
        feature_type: feature.feature_type,
        project: feature.project,
        stale: feature.stale,
        impression_data: feature.impression_data,
        enabled: feature.enabled,
        variants: feature.variants,
        created_at: feature.created_at,
        last_seen_at: feature.last_seen_at,
        favorite: feature.favorite,
        tags: Some(feature.tags.into_iter().collect()),
        dependencies: None,
    }
}

/// Client projection: strips administrative strategy fields and includes
/// dependencies instead of tags. Features without dependencies omit the key.
pub fn to_client(feature: Accumulator) -> FeatureConfiguration {
    project_for_evaluation(feature, client_strategy)
}

/// Playground projection: the client shape with strategy ids and non-empty
/// titles kept.
pub fn to_playground(feature: Accumulator) -> FeatureConfiguration {
    project_for_evaluation(feature, playground_strategy)
}

fn project_for_evaluation(
    feature: Accumulator,
    strategy: fn(StrategyEntry) -> StrategyConfig,
) -> FeatureConfiguration {
    let dependencies: Vec<Dependency> = feature.dependencies.into_values().collect();
    FeatureConfiguration {
        strategies: sort_strategies(feature.strategies.into_entries())
            .into_iter()
            .map(strategy)
            .collect(),
        name: feature.name,
        description: feature.description,
        feature_type: feature.feature_type,
        project: feature.project,
        stale: feature.stale,
        impression_data: feature.impression_data,
        enabled: feature.enabled,
        variants: feature.variants,
        created_at: None,
        last_seen_at: None,
        favorite: None,
        tags: None,
        dependencies: (!dependencies.is_empty()).then_some(dependencies),
    }
}

/// Projects every accumulator into `shape`, keeping first-seen order.
pub fn shape_features(
    features: IndexMap<String, Accumulator>,
    shape: ShapeMode,
) -> Vec<FeatureConfiguration> {
    let project: fn(Accumulator) -> FeatureConfiguration = match shape {
        ShapeMode::Full => to_full,
        ShapeMode::Client => to_client,
        ShapeMode::Playground => to_playground,
    };
    features.into_values().map(project).collect()
}

/// Builds the response envelope for a completed fold.
pub fn build_response(
    aggregation: Aggregation,
    shape: ShapeMode,
    query: &FeatureQuery,
) -> ClientFeaturesResponse {
    let segments = (!query.inline_segment_constraints)
        .then(|| aggregation.segments.into_values().collect());

    ClientFeaturesResponse {
        version: RESPONSE_VERSION,
        features: shape_features(aggregation.features, shape),
        query: query.clone(),
        segments,
    }
}
