//! Fairness task submission request

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Threshold used when none is given (backend default)
pub const DEFAULT_THRESHOLD: f64 = 0.65;

/// Errors raised while building a [`TaskRequest`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("dataset id cannot be empty")]
    EmptyDatasetId,

    #[error("positive class must be 0 or 1, got {0}")]
    InvalidPositiveClass(u8),

    #[error("entropy threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f64),

    #[error("clustering parameters given without an algorithm")]
    ParametersWithoutAlgorithm,

    #[error("clustering parameter `{0}` given twice")]
    DuplicateParameter(String),
}

/// Clustering algorithm and the parameter values to run it with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringChoice {
    pub algorithm: String,
    pub parameters: Vec<(String, JsonValue)>,
}

/// Parameters of one fairness evaluation
///
/// Built through [`TaskRequest::builder`] and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    dataset_id: String,
    positive_class: u8,
    threshold: f64,
    categorical_columns: Vec<String>,
    clustering: Option<ClusteringChoice>,
}

impl TaskRequest {
    pub fn builder(dataset_id: impl Into<String>) -> TaskRequestBuilder {
        TaskRequestBuilder {
            dataset_id: dataset_id.into(),
            positive_class: 1,
            threshold: DEFAULT_THRESHOLD,
            categorical_columns: Vec::new(),
            algorithm: None,
            parameters: Vec::new(),
        }
    }

    /// Preset used for automatic evaluation: single-linkage agglomerative
    /// clustering into ten clusters
    pub fn automatic(
        dataset_id: impl Into<String>,
        positive_class: u8,
        threshold: f64,
    ) -> Result<Self, RequestError> {
        Self::builder(dataset_id)
            .positive_class(positive_class)
            .threshold(threshold)
            .algorithm("agglomerative")
            .parameter("linkage", "single")
            .parameter("n_clusters", 10)
            .build()
    }

    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    pub fn positive_class(&self) -> u8 {
        self.positive_class
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn categorical_columns(&self) -> &[String] {
        &self.categorical_columns
    }

    pub fn clustering(&self) -> Option<&ClusteringChoice> {
        self.clustering.as_ref()
    }

    /// Form fields in the order the backend reads them
    ///
    /// Lists are sent as repeated `name[]` fields; parameter values are sent
    /// as plain text for strings and as JSON text otherwise.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("dataset_id".to_string(), self.dataset_id.clone()),
            ("positive_class".to_string(), self.positive_class.to_string()),
            ("threshold".to_string(), self.threshold.to_string()),
        ];

        for column in &self.categorical_columns {
            fields.push(("categ_columns[]".to_string(), column.clone()));
        }

        if let Some(choice) = &self.clustering {
            fields.push(("algorithm".to_string(), choice.algorithm.clone()));
            for (name, _) in &choice.parameters {
                fields.push(("parameters[]".to_string(), name.clone()));
            }
            for (_, value) in &choice.parameters {
                fields.push(("values[]".to_string(), form_value(value)));
            }
        }

        fields
    }
}

/// Builder for [`TaskRequest`]
#[derive(Debug, Clone)]
pub struct TaskRequestBuilder {
    dataset_id: String,
    positive_class: u8,
    threshold: f64,
    categorical_columns: Vec<String>,
    algorithm: Option<String>,
    parameters: Vec<(String, JsonValue)>,
}

impl TaskRequestBuilder {
    pub fn positive_class(mut self, label: u8) -> Self {
        self.positive_class = label;
        self
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn categorical_column(mut self, column: impl Into<String>) -> Self {
        self.categorical_columns.push(column.into());
        self
    }

    pub fn categorical_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categorical_columns
            .extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = Some(algorithm.into());
        self
    }

    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }

    pub fn build(self) -> Result<TaskRequest, RequestError> {
        let dataset_id = self.dataset_id.trim().to_string();
        if dataset_id.is_empty() {
            return Err(RequestError::EmptyDatasetId);
        }

        if self.positive_class > 1 {
            return Err(RequestError::InvalidPositiveClass(self.positive_class));
        }

        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(RequestError::ThresholdOutOfRange(self.threshold));
        }

        for (i, (name, _)) in self.parameters.iter().enumerate() {
            if self.parameters[..i].iter().any(|(other, _)| other == name) {
                return Err(RequestError::DuplicateParameter(name.clone()));
            }
        }

        let clustering = match (self.algorithm, self.parameters.is_empty()) {
            (Some(algorithm), _) => Some(ClusteringChoice {
                algorithm,
                parameters: self.parameters,
            }),
            (None, true) => None,
            (None, false) => return Err(RequestError::ParametersWithoutAlgorithm),
        };

        Ok(TaskRequest {
            dataset_id,
            positive_class: self.positive_class,
            threshold: self.threshold,
            categorical_columns: self.categorical_columns,
            clustering,
        })
    }
}

/// Interpret user input for a parameter value
///
/// Text that parses as JSON (`10`, `true`, `0.5`, `"x"`) keeps its JSON type;
/// anything else is taken as a plain string.
pub fn parse_parameter_value(text: &str) -> JsonValue {
    serde_json::from_str(text).unwrap_or_else(|_| JsonValue::String(text.to_string()))
}

fn form_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
