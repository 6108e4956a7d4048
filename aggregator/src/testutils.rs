use crate::row::FeatureRow;
use serde_json::{Number, Value as JsonValue};

/// Builds rows for tests, one fragment at a time.
pub struct RowBuilder {
    row: FeatureRow,
}

fn json_list(value: JsonValue) -> Vec<JsonValue> {
    match value {
        JsonValue::Array(items) => items,
        other => panic!("expected a JSON array, got {other}"),
    }
}

impl RowBuilder {
    pub fn new(name: &str) -> Self {
        RowBuilder {
            row: FeatureRow {
                name: Some(name.to_string()),
                ..Default::default()
            },
        }
    }

    pub fn nameless() -> Self {
        RowBuilder {
            row: FeatureRow::default(),
        }
    }

    pub fn project(mut self, project: &str) -> Self {
        self.row.project = Some(project.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.row.description = Some(description.to_string());
        self
    }

    pub fn feature_type(mut self, feature_type: &str) -> Self {
        self.row.feature_type = Some(feature_type.to_string());
        self
    }

    pub fn stale(mut self, stale: bool) -> Self {
        self.row.stale = Some(stale);
        self
    }

    pub fn created_at(mut self, created_at: &str) -> Self {
        self.row.created_at = Some(created_at.to_string());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.row.enabled = Some(enabled);
        self
    }

    pub fn environment(mut self, environment: &str) -> Self {
        self.row.environment = Some(environment.to_string());
        self
    }

    pub fn variants(mut self, variants: JsonValue) -> Self {
        self.row.variants = Some(json_list(variants));
        self
    }

    pub fn strategy(mut self, id: &str, name: &str) -> Self {
        self.row.strategy_id = Some(id.to_string());
        self.row.strategy_name = Some(name.to_string());
        self
    }

    pub fn strategy_id_only(mut self, id: &str) -> Self {
        self.row.strategy_id = Some(id.to_string());
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.row.strategy_title = Some(title.to_string());
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.row.strategy_disabled = Some(disabled);
        self
    }

    pub fn parameters(mut self, parameters: JsonValue) -> Self {
        self.row.parameters =
            Some(serde_json::from_value(parameters).expect("parameters must be an object"));
        self
    }

    pub fn constraints(mut self, constraints: JsonValue) -> Self {
        self.row.constraints = Some(json_list(constraints));
        self
    }

    pub fn sort_order<N: Into<Number>>(mut self, sort_order: N) -> Self {
        self.row.sort_order = Some(sort_order.into());
        self
    }

    pub fn strategy_variants(mut self, variants: JsonValue) -> Self {
        self.row.strategy_variants = Some(json_list(variants));
        self
    }

    pub fn segment(mut self, id: i64, constraints: JsonValue) -> Self {
        self.row.segment_id = Some(id);
        self.row.segment_constraints = Some(json_list(constraints));
        self
    }

    pub fn tag(mut self, tag_type: &str, value: &str) -> Self {
        self.row.tag_type = Some(tag_type.to_string());
        self.row.tag_value = Some(value.to_string());
        self
    }

    pub fn parent(mut self, parent: &str, enabled: bool, variants: JsonValue) -> Self {
        self.row.parent = Some(parent.to_string());
        self.row.parent_enabled = Some(enabled);
        self.row.parent_variants = Some(json_list(variants));
        self
    }

    pub fn build(self) -> FeatureRow {
        self.row
    }
}
