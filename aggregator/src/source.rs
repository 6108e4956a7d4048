//! Row sources.
//!
//! The engine consumes rows that are already fetched and filtered. Sources
//! deliver them and honor the query's filters the way the feature query
//! would: name, project and prefix filters per row, tag filters per feature.

use crate::errors::SourceError;
use crate::query::FeatureQuery;
use crate::row::FeatureRow;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Supplies the rows for one query.
pub trait RowSource {
    fn fetch(&self, query: &FeatureQuery) -> Result<Vec<FeatureRow>, SourceError>;
}

/// Reads a JSON array of rows from a file.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        JsonFileSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RowSource for JsonFileSource {
    fn fetch(&self, query: &FeatureQuery) -> Result<Vec<FeatureRow>, SourceError> {
        let file = File::open(&self.path)?;
        let rows = read_rows(BufReader::new(file))?;
        let total = rows.len();
        let rows = apply_filters(query, rows);

        tracing::debug!(
            path = %self.path.display(),
            total,
            kept = rows.len(),
            "Loaded feature rows"
        );
        Ok(rows)
    }
}

/// Parses a JSON array of rows.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<FeatureRow>, SourceError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Keeps only the rows the query selects, preserving stream order.
///
/// Rows without a name are always kept so the engine can reject them.
pub fn apply_filters(query: &FeatureQuery, rows: Vec<FeatureRow>) -> Vec<FeatureRow> {
    let tagged = (!query.tags.is_empty()).then(|| {
        rows.iter()
            .filter(|row| match (&row.tag_type, &row.tag_value) {
                (Some(tag_type), Some(value)) => {
                    query.tags.iter().any(|tag| tag.matches(tag_type, value))
                }
                _ => false,
            })
            .filter_map(|row| row.name.clone())
            .collect::<HashSet<String>>()
    });
    let projects = query.project_filter();

    rows.into_iter()
        .filter(|row| {
            let Some(name) = row.name.as_deref() else {
                return true;
            };
            if !query.names.is_empty() && !query.names.iter().any(|n| n == name) {
                return false;
            }
            if let Some(prefix) = &query.name_prefix
                && !name.starts_with(prefix.as_str())
            {
                return false;
            }
            if let Some(projects) = projects
                && !row
                    .project
                    .as_ref()
                    .is_some_and(|project| projects.contains(project))
            {
                return false;
            }
            if let Some(tagged) = &tagged
                && !tagged.contains(name)
            {
                return false;
            }
            row.environment
                .as_ref()
                .is_none_or(|environment| *environment == query.environment)
        })
        .collect()
}
