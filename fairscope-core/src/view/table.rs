//! Per-group detail table

use serde_json::Value as JsonValue;

use crate::domain::result::{FairnessResult, Metric};

/// One group: its entropy-based attribute pattern plus the raw metrics
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    pub id: usize,
    /// Attribute values, aligned with [`DetailTable::columns`]
    pub attributes: Vec<JsonValue>,
    /// The eight raw metric values shown when the row is expanded
    pub metrics: Vec<(Metric, Option<f64>)>,
}

impl GroupRow {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        self.metrics
            .iter()
            .find(|(m, _)| *m == metric)
            .and_then(|(_, v)| *v)
    }
}

/// Table with one row per group index `0..k`
#[derive(Debug, Clone, PartialEq)]
pub struct DetailTable {
    /// Subgroup attribute names (the `id` column is implicit)
    pub columns: Vec<String>,
    pub rows: Vec<GroupRow>,
}

impl DetailTable {
    pub fn from_result(result: &FairnessResult) -> Self {
        let columns: Vec<String> = result.subgroups.columns().map(str::to_string).collect();

        let rows = (0..result.cluster_count())
            .map(|id| GroupRow {
                id,
                attributes: columns
                    .iter()
                    .map(|c| result.subgroups.value(c, id).clone())
                    .collect(),
                metrics: Metric::ALL
                    .into_iter()
                    .map(|m| (m, result.raw_value(m, id)))
                    .collect(),
            })
            .collect();

        Self { columns, rows }
    }

    pub fn row(&self, id: usize) -> Option<&GroupRow> {
        self.rows.get(id)
    }
}

/// Locate a row in a paginated table: 1-based page and row within that page
pub fn page_of(index: usize, page_size: usize) -> (usize, usize) {
    let page_size = page_size.max(1);
    (index / page_size + 1, index % page_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::result::tests::sample;

    #[test]
    fn test_table_has_one_row_per_cluster() {
        let table = DetailTable::from_result(&sample());

        assert_eq!(table.columns, vec!["race", "sex"]);
        assert_eq!(table.rows.len(), 3);

        let row = table.row(1).unwrap();
        assert_eq!(row.id, 1);
        assert_eq!(
            row.attributes,
            vec![JsonValue::from("White"), JsonValue::from("Female")]
        );
        assert_eq!(row.metrics.len(), 8);
        assert_eq!(row.metric(Metric::ClusterStatPar), Some(-0.3));
        assert_eq!(row.metric(Metric::GroupAccuracy), Some(0.7));
    }

    #[test]
    fn test_duplicate_subgroup_row_has_empty_group_metrics() {
        let table = DetailTable::from_result(&sample());
        let row = table.row(2).unwrap();

        assert_eq!(row.attributes[0], JsonValue::Null);
        assert_eq!(row.metric(Metric::ClusterAccuracy), Some(0.9));
        assert_eq!(row.metric(Metric::GroupStatPar), None);
    }

    #[test]
    fn test_page_of() {
        assert_eq!(page_of(0, 10), (1, 0));
        assert_eq!(page_of(9, 10), (1, 9));
        assert_eq!(page_of(10, 10), (2, 0));
        assert_eq!(page_of(23, 10), (3, 3));
        assert_eq!(page_of(3, 0), (4, 0));
    }
}
