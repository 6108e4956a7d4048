//! The flat row contract delivered by the row source.
//!
//! One row is one combination of a feature with at most one strategy, segment,
//! tag and dependency. A fragment is present when its key column is non-null;
//! otherwise all of its columns are null together (an outer-join miss).

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value as JsonValue};

pub type StrategyId = String;
pub type SegmentId = i64;

/// A single row of the joined feature query.
///
/// Every column is optional so a row with a null `name` can be reported as a
/// data-integrity error instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeatureRow {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub feature_type: Option<String>,
    pub project: Option<String>,
    pub stale: Option<bool>,
    pub impression_data: Option<bool>,
    pub created_at: Option<String>,
    pub last_seen_at: Option<String>,
    pub favorite: Option<bool>,

    pub enabled: Option<bool>,
    pub environment: Option<String>,
    pub variants: Option<Vec<JsonValue>>,

    pub strategy_id: Option<StrategyId>,
    pub strategy_name: Option<String>,
    pub strategy_title: Option<String>,
    pub strategy_disabled: Option<bool>,
    pub parameters: Option<IndexMap<String, JsonValue>>,
    pub constraints: Option<Vec<JsonValue>>,
    #[serde(deserialize_with = "lenient_sort_order")]
    pub sort_order: Option<Number>,
    pub strategy_variants: Option<Vec<JsonValue>>,

    pub segment_id: Option<SegmentId>,
    pub segment_constraints: Option<Vec<JsonValue>>,

    pub tag_type: Option<String>,
    pub tag_value: Option<String>,

    pub parent: Option<String>,
    pub parent_variants: Option<Vec<JsonValue>>,
    pub parent_enabled: Option<bool>,
}

/// Sort orders that are not numbers are treated as missing. Numbers are kept
/// as given so they leave the engine unchanged.
fn lenient_sort_order<'de, D>(deserializer: D) -> Result<Option<Number>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<JsonValue>::deserialize(deserializer)? {
        Some(JsonValue::Number(n)) => Ok(Some(n)),
        _ => Ok(None),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Tag {
    #[serde(rename = "type")]
    pub tag_type: String,
    pub value: String,
}

/// An edge from a child feature to the parent it depends on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dependency {
    pub feature: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<JsonValue>>,
}

/// A segment reference carried by a row, along with the strategy it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentFragment<'a> {
    pub id: SegmentId,
    pub strategy_id: Option<&'a str>,
    pub constraints: &'a [JsonValue],
}

impl FeatureRow {
    /// Tag fragment, present only when both type and value are set.
    pub fn tag(&self) -> Option<Tag> {
        match (&self.tag_type, &self.tag_value) {
            (Some(tag_type), Some(value)) => Some(Tag {
                tag_type: tag_type.clone(),
                value: value.clone(),
            }),
            _ => None,
        }
    }

    /// Dependency fragment. A disabled parent never exposes its variants, and
    /// a null `parent_enabled` takes the column default of `true`.
    pub fn dependency(&self) -> Option<Dependency> {
        let parent = self.parent.as_ref()?;
        let enabled = self.parent_enabled.unwrap_or(true);
        Some(Dependency {
            feature: parent.clone(),
            enabled,
            variants: enabled.then(|| self.parent_variants.clone().unwrap_or_default()),
        })
    }

    pub fn segment(&self) -> Option<SegmentFragment<'_>> {
        Some(SegmentFragment {
            id: self.segment_id?,
            strategy_id: self.strategy_id.as_deref(),
            constraints: self.segment_constraints.as_deref().unwrap_or_default(),
        })
    }

    pub fn is_strategy_disabled(&self) -> bool {
        self.strategy_disabled.unwrap_or(false)
    }
}
