use crate::errors::QueryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Project filter value that matches every project.
pub const ALL_PROJECTS: &str = "*";

pub const DEFAULT_ENVIRONMENT: &str = "default";

/// Which consumer the output is shaped for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeMode {
    /// Admin listings: strategy ids, titles and sort orders, plus tags.
    Full,
    /// Client SDKs: administrative strategy fields stripped, dependencies included.
    #[default]
    Client,
    /// Evaluation playground: like `Client`, but keeps strategy ids and titles.
    Playground,
}

impl ShapeMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ShapeMode::Full => "full",
            ShapeMode::Client => "client",
            ShapeMode::Playground => "playground",
        }
    }
}

impl fmt::Display for ShapeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapeMode {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(ShapeMode::Full),
            "client" => Ok(ShapeMode::Client),
            "playground" => Ok(ShapeMode::Playground),
            other => Err(QueryError::UnknownShape(other.to_string())),
        }
    }
}

/// How segments attach to strategies for one aggregation call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentMode {
    /// Segment constraints are appended to the strategy's own constraints.
    Inline,
    /// Only segment ids are recorded, for the client to resolve.
    Reference,
}

impl SegmentMode {
    pub fn from_inline_flag(inline_segment_constraints: bool) -> Self {
        if inline_segment_constraints {
            SegmentMode::Inline
        } else {
            SegmentMode::Reference
        }
    }
}

/// A `type:value` tag filter.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct TagFilter {
    pub tag_type: String,
    pub value: String,
}

impl TagFilter {
    pub fn matches(&self, tag_type: &str, value: &str) -> bool {
        self.tag_type == tag_type && self.value == value
    }
}

impl FromStr for TagFilter {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((tag_type, value)) if !tag_type.is_empty() && !value.is_empty() => Ok(TagFilter {
                tag_type: tag_type.to_string(),
                value: value.to_string(),
            }),
            _ => Err(QueryError::InvalidTagFilter(s.to_string())),
        }
    }
}

impl TryFrom<String> for TagFilter {
    type Error = QueryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TagFilter> for String {
    fn from(filter: TagFilter) -> Self {
        format!("{}:{}", filter.tag_type, filter.value)
    }
}

/// Feature query parameters.
///
/// The filters are honored by the row source; the engine only reads
/// `inline_segment_constraints`. The query is echoed back in the response.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct FeatureQuery {
    pub environment: String,
    pub inline_segment_constraints: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
    #[serde(rename(serialize = "tag"), skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagFilter>,
    #[serde(rename(serialize = "project"), skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_prefix: Option<String>,
}

impl Default for FeatureQuery {
    fn default() -> Self {
        FeatureQuery {
            environment: DEFAULT_ENVIRONMENT.to_string(),
            inline_segment_constraints: false,
            names: Vec::new(),
            tags: Vec::new(),
            projects: Vec::new(),
            name_prefix: None,
        }
    }
}

impl FeatureQuery {
    pub fn segment_mode(&self) -> SegmentMode {
        SegmentMode::from_inline_flag(self.inline_segment_constraints)
    }

    /// Project filter, or `None` when every project is requested.
    pub fn project_filter(&self) -> Option<&[String]> {
        if self.projects.is_empty() || self.projects.iter().any(|p| p == ALL_PROJECTS) {
            None
        } else {
            Some(&self.projects)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_shape() {
        assert_eq!("full".parse::<ShapeMode>().unwrap(), ShapeMode::Full);
        assert_eq!("client".parse::<ShapeMode>().unwrap(), ShapeMode::Client);
        assert_eq!(
            "playground".parse::<ShapeMode>().unwrap(),
            ShapeMode::Playground
        );
        assert_eq!(
            "admin".parse::<ShapeMode>(),
            Err(QueryError::UnknownShape("admin".into()))
        );
    }

    #[test]
    fn test_parse_tag_filter() {
        let filter: TagFilter = "simple:web".parse().unwrap();
        assert!(filter.matches("simple", "web"));
        assert!(!filter.matches("simple", "api"));

        // Only the first colon separates type from value.
        let filter: TagFilter = "team:a:b".parse().unwrap();
        assert_eq!(filter.value, "a:b");

        assert!("simple".parse::<TagFilter>().is_err());
        assert!(":web".parse::<TagFilter>().is_err());
    }

    #[test]
    fn test_query_from_yaml() {
        let yaml = r#"
environment: production
inline_segment_constraints: true
tags:
    - simple:web
projects:
    - default
name_prefix: checkout
"#;
        let query: FeatureQuery = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(query.environment, "production");
        assert_eq!(query.segment_mode(), SegmentMode::Inline);
        assert_eq!(query.tags[0].tag_type, "simple");
        assert_eq!(query.project_filter(), Some(&["default".to_string()][..]));
        assert_eq!(query.name_prefix.as_deref(), Some("checkout"));
    }

    #[test]
    fn test_wildcard_project_disables_filter() {
        let query = FeatureQuery {
            projects: vec!["default".into(), ALL_PROJECTS.into()],
            ..Default::default()
        };
        assert_eq!(query.project_filter(), None);
    }

    #[test]
    fn test_query_echo_uses_camel_case() {
        let query = FeatureQuery {
            tags: vec!["simple:web".parse().unwrap()],
            name_prefix: Some("check".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({
                "environment": "default",
                "inlineSegmentConstraints": false,
                "tag": ["simple:web"],
                "namePrefix": "check"
            })
        );
    }
}
