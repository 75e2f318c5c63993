//! Dataset metadata served by the columns-info endpoint

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Column name to backend metadata (usually the column dtype)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnsInfo(BTreeMap<String, JsonValue>);

impl ColumnsInfo {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Metadata of a column rendered as text, if the column exists
    pub fn describe(&self, column: &str) -> Option<String> {
        self.0.get(column).map(|meta| match meta {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
