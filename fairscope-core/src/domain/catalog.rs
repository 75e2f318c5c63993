//! Clustering algorithm catalog
//!
//! The backend publishes the clustering algorithms it can run together with a
//! schema for each of their parameters. Front-ends use it to offer choices
//! and to reject obviously wrong parameters before a task is submitted.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Schema of a single clustering parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireParameterKind", into = "WireParameterKind")]
pub enum ParameterKind {
    /// A boolean switch (sent by the backend as the string `"bool"`)
    Bool,
    /// Free-form input with a hint text
    Hint(String),
    /// One of an enumerated list of values
    Choice(Vec<JsonValue>),
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum WireParameterKind {
    Choice(Vec<JsonValue>),
    Text(String),
}

impl From<WireParameterKind> for ParameterKind {
    fn from(wire: WireParameterKind) -> Self {
        match wire {
            WireParameterKind::Choice(values) => ParameterKind::Choice(values),
            WireParameterKind::Text(text) if text == "bool" => ParameterKind::Bool,
            WireParameterKind::Text(text) => ParameterKind::Hint(text),
        }
    }
}

impl From<ParameterKind> for WireParameterKind {
    fn from(kind: ParameterKind) -> Self {
        match kind {
            ParameterKind::Bool => WireParameterKind::Text("bool".to_string()),
            ParameterKind::Hint(text) => WireParameterKind::Text(text),
            ParameterKind::Choice(values) => WireParameterKind::Choice(values),
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterKind::Bool => f.write_str("bool"),
            ParameterKind::Hint(hint) if hint.is_empty() => f.write_str("any"),
            ParameterKind::Hint(hint) => write!(f, "{}", hint),
            ParameterKind::Choice(values) => {
                let rendered: Vec<String> = values.iter().map(choice_text).collect();
                write!(f, "one of [{}]", rendered.join(", "))
            }
        }
    }
}

/// Parameter rejected by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("unknown clustering algorithm `{0}`")]
    UnknownAlgorithm(String),

    #[error("algorithm `{algorithm}` has no parameter `{parameter}`")]
    UnknownParameter { algorithm: String, parameter: String },

    #[error("parameter `{parameter}` expects {expected}, got {got}")]
    InvalidValue {
        parameter: String,
        expected: String,
        got: String,
    },
}

/// Algorithm name to parameter schema, as served by the clustering-info endpoint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusteringCatalog(BTreeMap<String, BTreeMap<String, ParameterKind>>);

impl ClusteringCatalog {
    pub fn new(algorithms: BTreeMap<String, BTreeMap<String, ParameterKind>>) -> Self {
        Self(algorithms)
    }

    pub fn algorithms(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn parameters(&self, algorithm: &str) -> Option<&BTreeMap<String, ParameterKind>> {
        self.0.get(algorithm)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check an algorithm and its parameter values against the schema
    pub fn validate(
        &self,
        algorithm: &str,
        parameters: &[(String, JsonValue)],
    ) -> Result<(), CatalogError> {
        let schema = self
            .parameters(algorithm)
            .ok_or_else(|| CatalogError::UnknownAlgorithm(algorithm.to_string()))?;

        for (name, value) in parameters {
            let kind = schema
                .get(name)
                .ok_or_else(|| CatalogError::UnknownParameter {
                    algorithm: algorithm.to_string(),
                    parameter: name.clone(),
                })?;

            let accepted = match kind {
                ParameterKind::Bool => value.is_boolean(),
                ParameterKind::Hint(_) => true,
                ParameterKind::Choice(choices) => choices.contains(value),
            };

            if !accepted {
                return Err(CatalogError::InvalidValue {
                    parameter: name.clone(),
                    expected: kind.to_string(),
                    got: value.to_string(),
                });
            }
        }

        Ok(())
    }
}

fn choice_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
