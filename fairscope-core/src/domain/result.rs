//! Fairness result schemas
//!
//! The terminal payload of a fairness task is a JSON document whose members
//! are themselves JSON-encoded documents (dataframe dumps keyed by column,
//! then by row index). Everything is decoded here, once, into typed
//! structures; renderers never touch raw JSON.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while decoding a fairness result payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResultParseError {
    /// The task succeeded but the status response carried no result
    #[error("task reported success without a result payload")]
    MissingPayload,

    /// A document is not valid JSON or does not have the expected shape
    #[error("malformed `{document}` document: {reason}")]
    Malformed {
        document: &'static str,
        reason: String,
    },

    /// A document lacks a required key
    #[error("`{document}` document is missing `{field}`")]
    MissingField {
        document: &'static str,
        field: String,
    },
}

impl ResultParseError {
    fn malformed(document: &'static str, reason: impl fmt::Display) -> Self {
        Self::Malformed {
            document,
            reason: reason.to_string(),
        }
    }

    fn missing(document: &'static str, field: impl Into<String>) -> Self {
        Self::MissingField {
            document,
            field: field.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ResultParseError>;

// =============================================================================
// Metrics
// =============================================================================

/// How the rows of a dataset were partitioned into groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Groups are the clusters found by the clustering algorithm
    Cluster,
    /// Groups are attribute patterns found by the entropy heuristic
    Entropy,
}

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::Cluster, Strategy::Entropy];

    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Cluster => "Clustering-based Fairness",
            Strategy::Entropy => "Entropy-based Fairness",
        }
    }

    /// The four per-group metrics of this strategy, in display order
    pub fn metrics(&self) -> [Metric; 4] {
        match self {
            Strategy::Cluster => [
                Metric::ClusterStatPar,
                Metric::ClusterEqOpp,
                Metric::ClusterAvgOdds,
                Metric::ClusterAccuracy,
            ],
            Strategy::Entropy => [
                Metric::GroupStatPar,
                Metric::GroupEqOpp,
                Metric::GroupAvgOdds,
                Metric::GroupAccuracy,
            ],
        }
    }
}

/// One of the eight per-group fairness metrics computed by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "c_stat_par")]
    ClusterStatPar,
    #[serde(rename = "c_eq_opp")]
    ClusterEqOpp,
    #[serde(rename = "c_avg_odds")]
    ClusterAvgOdds,
    #[serde(rename = "c_acc")]
    ClusterAccuracy,
    #[serde(rename = "g_stat_par")]
    GroupStatPar,
    #[serde(rename = "g_eq_opp")]
    GroupEqOpp,
    #[serde(rename = "g_avg_odds")]
    GroupAvgOdds,
    #[serde(rename = "g_acc")]
    GroupAccuracy,
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::ClusterStatPar,
        Metric::ClusterEqOpp,
        Metric::ClusterAvgOdds,
        Metric::ClusterAccuracy,
        Metric::GroupStatPar,
        Metric::GroupEqOpp,
        Metric::GroupAvgOdds,
        Metric::GroupAccuracy,
    ];

    /// Column name used by the backend
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::ClusterStatPar => "c_stat_par",
            Metric::ClusterEqOpp => "c_eq_opp",
            Metric::ClusterAvgOdds => "c_avg_odds",
            Metric::ClusterAccuracy => "c_acc",
            Metric::GroupStatPar => "g_stat_par",
            Metric::GroupEqOpp => "g_eq_opp",
            Metric::GroupAvgOdds => "g_avg_odds",
            Metric::GroupAccuracy => "g_acc",
        }
    }

    /// Short column header
    pub fn label(&self) -> &'static str {
        match self {
            Metric::ClusterStatPar | Metric::GroupStatPar => "Stat. Parity",
            Metric::ClusterEqOpp | Metric::GroupEqOpp => "Eq. Opportunity",
            Metric::ClusterAvgOdds | Metric::GroupAvgOdds => "(Avg.) Eq. Odds",
            Metric::ClusterAccuracy | Metric::GroupAccuracy => "Accuracy",
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            Metric::ClusterStatPar
            | Metric::ClusterEqOpp
            | Metric::ClusterAvgOdds
            | Metric::ClusterAccuracy => Strategy::Cluster,
            _ => Strategy::Entropy,
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a metric name is not one of the eight backend columns
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown metric `{0}` (expected one of c_stat_par, c_eq_opp, c_avg_odds, c_acc, g_stat_par, g_eq_opp, g_avg_odds, g_acc)")]
pub struct UnknownMetric(pub String);

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

/// A value for each of the eight metrics
#[derive(Debug, Clone, PartialEq)]
pub struct PerMetric<T> {
    values: Vec<T>,
}

impl<T> PerMetric<T> {
    /// Build from a document keyed by metric column, requiring every column
    fn from_map(document: &'static str, mut map: BTreeMap<String, T>) -> Result<Self> {
        let mut values = Vec::with_capacity(Metric::ALL.len());
        for metric in Metric::ALL {
            let value = map
                .remove(metric.as_str())
                .ok_or_else(|| ResultParseError::missing(document, metric.as_str()))?;
            values.push(value);
        }
        Ok(Self { values })
    }

    pub fn get(&self, metric: Metric) -> &T {
        &self.values[metric.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, &T)> {
        Metric::ALL.into_iter().zip(self.values.iter())
    }
}

// =============================================================================
// Nested documents
// =============================================================================

/// Aggregates of the per-group metrics over all groups (`fair` document)
#[derive(Debug, Clone, PartialEq)]
pub struct FairnessSummary {
    pub mean: PerMetric<Option<f64>>,
    pub std: PerMetric<Option<f64>>,
    pub abs_mean: PerMetric<Option<f64>>,
    pub abs_std: PerMetric<Option<f64>>,
}

impl FairnessSummary {
    const DOCUMENT: &'static str = "fair";

    fn parse(value: JsonValue) -> Result<Self> {
        let mut stats: BTreeMap<String, BTreeMap<String, Option<f64>>> =
            decode_nested(Self::DOCUMENT, value)?;
        let mut take = |name: &str| {
            stats
                .remove(name)
                .ok_or_else(|| ResultParseError::missing(Self::DOCUMENT, name))
                .and_then(|map| PerMetric::from_map(Self::DOCUMENT, map))
        };

        Ok(Self {
            mean: take("mean")?,
            std: take("std")?,
            abs_mean: take("abs_mean")?,
            abs_std: take("abs_std")?,
        })
    }
}

/// Deviation of per-group accuracy from overall accuracy (`c_acc` / `g_acc`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyError {
    pub min_err: Option<f64>,
    pub max_err: Option<f64>,
    pub mean_err: Option<f64>,
    pub std_err: Option<f64>,
    pub mean_abs_err: Option<f64>,
    pub std_abs_err: Option<f64>,
}

impl AccuracyError {
    fn parse(document: &'static str, value: JsonValue) -> Result<Self> {
        let mut series: BTreeMap<String, Option<f64>> = decode_nested(document, value)?;
        let mut take = |name: &str| {
            series
                .remove(name)
                .ok_or_else(|| ResultParseError::missing(document, name))
        };

        Ok(Self {
            min_err: take("min_err")?,
            max_err: take("max_err")?,
            mean_err: take("mean_err")?,
            std_err: take("std_err")?,
            mean_abs_err: take("mean_abs_err")?,
            std_abs_err: take("std_abs_err")?,
        })
    }
}

/// Per-group metric values, keyed by group index
///
/// `None` marks groups the backend could not evaluate (duplicate or empty
/// entropy-based subgroups).
pub type GroupValues = BTreeMap<usize, Option<f64>>;

/// Attribute patterns describing the entropy-based subgroups
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Subgroups {
    columns: BTreeMap<String, BTreeMap<usize, JsonValue>>,
}

impl Subgroups {
    fn parse(value: JsonValue) -> Result<Self> {
        Ok(Self {
            columns: decode_nested("subgroups", value)?,
        })
    }

    /// Attribute names, in column order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Value of one attribute for one group; `Null` when absent
    pub fn value(&self, column: &str, index: usize) -> &JsonValue {
        self.columns
            .get(column)
            .and_then(|rows| rows.get(&index))
            .unwrap_or(&JsonValue::Null)
    }

    /// The attribute-value assignments that define subgroup `index`
    pub fn pattern(&self, index: usize) -> Vec<(&str, &JsonValue)> {
        self.columns
            .iter()
            .filter_map(|(column, rows)| match rows.get(&index) {
                Some(JsonValue::Null) | None => None,
                Some(value) => Some((column.as_str(), value)),
            })
            .collect()
    }
}

// =============================================================================
// FairnessResult
// =============================================================================

/// Top-level shape of the payload; nested documents are decoded afterwards
#[derive(Debug, Deserialize)]
struct Envelope {
    fair: JsonValue,
    c_acc: JsonValue,
    g_acc: JsonValue,
    subgroups: JsonValue,
    raw: JsonValue,
    clustering: Vec<i64>,
    #[serde(default)]
    group_sizes: Option<Vec<Option<u64>>>,
    #[serde(default)]
    duplication: Option<f64>,
    #[serde(default)]
    cvi: Option<JsonValue>,
}

/// Parsed terminal payload of a successful fairness task
#[derive(Debug, Clone, PartialEq)]
pub struct FairnessResult {
    pub fair: FairnessSummary,
    pub cluster_accuracy: AccuracyError,
    pub group_accuracy: AccuracyError,
    pub raw: PerMetric<GroupValues>,
    pub subgroups: Subgroups,
    /// Cluster label of every dataset row; negative labels are outliers
    pub clustering: Vec<i64>,
    /// Population of each entropy-based subgroup, `None` for skipped duplicates
    pub group_sizes: Vec<Option<u64>>,
    /// Share of entropy-based subgroups that duplicated another one
    pub duplication: Option<f64>,
    /// Cluster validation indices, when the backend computed them
    pub cvi: Option<BTreeMap<String, Option<f64>>>,
}

impl FairnessResult {
    /// Decode a payload given as JSON text
    pub fn from_json(payload: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(payload)
            .map_err(|e| ResultParseError::malformed("result", e))?;
        Self::from_value(value)
    }

    /// Decode a payload that was already parsed into a JSON value
    pub fn from_value(value: JsonValue) -> Result<Self> {
        let envelope: Envelope =
            serde_json::from_value(value).map_err(|e| ResultParseError::malformed("result", e))?;

        let rows = envelope.clustering.len();
        if let Some(label) = envelope.clustering.iter().find(|l| **l >= rows as i64) {
            return Err(ResultParseError::malformed(
                "clustering",
                format!("cluster label {} out of range for {} rows", label, rows),
            ));
        }

        let raw_columns: BTreeMap<String, GroupValues> = decode_nested("raw", envelope.raw)?;
        let cvi = match envelope.cvi {
            None | Some(JsonValue::Null) => None,
            Some(value) => Some(decode_nested("cvi", value)?),
        };

        Ok(Self {
            fair: FairnessSummary::parse(envelope.fair)?,
            cluster_accuracy: AccuracyError::parse("c_acc", envelope.c_acc)?,
            group_accuracy: AccuracyError::parse("g_acc", envelope.g_acc)?,
            raw: PerMetric::from_map("raw", raw_columns)?,
            subgroups: Subgroups::parse(envelope.subgroups)?,
            clustering: envelope.clustering,
            group_sizes: envelope.group_sizes.unwrap_or_default(),
            duplication: envelope.duplication,
            cvi,
        })
    }

    /// Number of clusters `k`, i.e. the largest cluster label plus one
    pub fn cluster_count(&self) -> usize {
        self.clustering
            .iter()
            .copied()
            .filter(|label| *label >= 0)
            .max()
            .map_or(0, |max| max as usize + 1)
    }

    pub fn accuracy(&self, strategy: Strategy) -> &AccuracyError {
        match strategy {
            Strategy::Cluster => &self.cluster_accuracy,
            Strategy::Entropy => &self.group_accuracy,
        }
    }

    /// Per-group values of one metric
    pub fn raw_values(&self, metric: Metric) -> &GroupValues {
        self.raw.get(metric)
    }

    /// Value of one metric for one group
    pub fn raw_value(&self, metric: Metric, index: usize) -> Option<f64> {
        self.raw.get(metric).get(&index).copied().flatten()
    }
}

/// Decode a nested document, given either as JSON text or as an inline value
fn decode_nested<T: DeserializeOwned>(document: &'static str, value: JsonValue) -> Result<T> {
    match value {
        JsonValue::String(text) => {
            serde_json::from_str(&text).map_err(|e| ResultParseError::malformed(document, e))
        }
        other => serde_json::from_value(other).map_err(|e| ResultParseError::malformed(document, e)),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE: &str = include_str!("../../../fixtures/fairness_result.json");

    pub(crate) fn sample() -> FairnessResult {
        FairnessResult::from_json(SAMPLE).unwrap()
    }

    #[test]
    fn test_parse_sample_payload() {
        let result = sample();

        assert_eq!(result.clustering, vec![0, 2, 2, 1, 0, 0]);
        assert_eq!(result.cluster_count(), 3);
        assert_eq!(result.group_sizes, vec![Some(3), Some(2), None]);
        assert_eq!(result.duplication, Some(0.3333));
        assert_eq!(result.cluster_accuracy.mean_err, Some(0.0167));
        assert_eq!(result.group_accuracy.mean_err, Some(-0.055));
        assert_eq!(
            *result.fair.abs_mean.get(Metric::ClusterEqOpp),
            Some(0.2333)
        );
        assert_eq!(result.raw_value(Metric::ClusterAccuracy, 1), Some(0.74));
        assert_eq!(result.raw_value(Metric::GroupAccuracy, 2), None);
        assert_eq!(
            result.cvi.as_ref().and_then(|c| c.get("silhouette")).copied(),
            Some(Some(0.42))
        );
    }

    #[test]
    fn test_subgroup_patterns_skip_null_attributes() {
        let result = sample();

        let columns: Vec<&str> = result.subgroups.columns().collect();
        assert_eq!(columns, vec!["race", "sex"]);

        let pattern = result.subgroups.pattern(0);
        assert_eq!(pattern, vec![("sex", &JsonValue::from("Male"))]);

        let pattern = result.subgroups.pattern(1);
        assert_eq!(pattern.len(), 2);
        assert_eq!(result.subgroups.value("race", 7), &JsonValue::Null);
    }

    #[test]
    fn test_inline_nested_documents_are_accepted() {
        let mut value: JsonValue = serde_json::from_str(SAMPLE).unwrap();
        let raw_text = value["raw"].as_str().unwrap().to_string();
        value["raw"] = serde_json::from_str(&raw_text).unwrap();

        let result = FairnessResult::from_value(value).unwrap();
        assert_eq!(result.raw_value(Metric::ClusterStatPar, 1), Some(-0.3));
    }

    #[test]
    fn test_missing_metric_column_is_reported() {
        let mut value: JsonValue = serde_json::from_str(SAMPLE).unwrap();
        let mut raw: JsonValue = serde_json::from_str(value["raw"].as_str().unwrap()).unwrap();
        raw.as_object_mut().unwrap().remove("g_eq_opp");
        value["raw"] = JsonValue::String(raw.to_string());

        let err = FairnessResult::from_value(value).unwrap_err();
        assert_eq!(
            err,
            ResultParseError::MissingField {
                document: "raw",
                field: "g_eq_opp".to_string()
            }
        );
    }

    #[test]
    fn test_missing_accuracy_field_is_reported() {
        let mut value: JsonValue = serde_json::from_str(SAMPLE).unwrap();
        value["c_acc"] = JsonValue::String(r#"{"min_err": 0.1}"#.to_string());

        let err = FairnessResult::from_value(value).unwrap_err();
        assert!(matches!(
            err,
            ResultParseError::MissingField { document: "c_acc", .. }
        ));
    }

    #[test]
    fn test_missing_envelope_member_is_malformed() {
        let mut value: JsonValue = serde_json::from_str(SAMPLE).unwrap();
        value.as_object_mut().unwrap().remove("fair");

        let err = FairnessResult::from_value(value).unwrap_err();
        assert!(matches!(err, ResultParseError::Malformed { document: "result", .. }));
    }

    #[test]
    fn test_nested_garbage_is_malformed() {
        let mut value: JsonValue = serde_json::from_str(SAMPLE).unwrap();
        value["fair"] = JsonValue::String("{not json".to_string());

        let err = FairnessResult::from_value(value).unwrap_err();
        assert!(matches!(err, ResultParseError::Malformed { document: "fair", .. }));
    }

    #[test]
    fn test_group_sizes_are_optional() {
        let mut value: JsonValue = serde_json::from_str(SAMPLE).unwrap();
        value.as_object_mut().unwrap().remove("group_sizes");
        value.as_object_mut().unwrap().remove("cvi");

        let result = FairnessResult::from_value(value).unwrap();
        assert!(result.group_sizes.is_empty());
        assert!(result.cvi.is_none());
    }

    #[test]
    fn test_cluster_count_ignores_outliers() {
        let mut result = sample();
        result.clustering = vec![-1, -1];
        assert_eq!(result.cluster_count(), 0);

        result.clustering = vec![-1, 4, 0];
        assert_eq!(result.cluster_count(), 5);
    }

    #[test]
    fn test_cluster_label_beyond_row_count_is_malformed() {
        let mut value: JsonValue = serde_json::from_str(SAMPLE).unwrap();
        value["clustering"] = serde_json::json!([0, 1, 9_000_000_000_000_000_000i64]);

        let err = FairnessResult::from_value(value).unwrap_err();
        assert!(matches!(err, ResultParseError::Malformed { document: "clustering", .. }));

        let mut value: JsonValue = serde_json::from_str(SAMPLE).unwrap();
        value["clustering"] = serde_json::json!([0, -1, 2]);
        assert_eq!(FairnessResult::from_value(value).unwrap().cluster_count(), 3);
    }

    #[test]
    fn test_metric_names_round_trip_through_from_str() {
        for metric in Metric::ALL {
            assert_eq!(metric.as_str().parse::<Metric>().unwrap(), metric);
        }
        assert!("accuracy".parse::<Metric>().is_err());
        assert_eq!(Metric::GroupAvgOdds.strategy(), Strategy::Entropy);
        assert_eq!(Metric::ClusterAccuracy.strategy(), Strategy::Cluster);
    }
}
