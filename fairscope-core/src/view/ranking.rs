//! Top-N ranking of groups by one metric

use std::cmp::Ordering;
use std::fmt;

use crate::domain::result::{FairnessResult, Metric};

/// Direction of a ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Ascending => f.write_str("Ascending"),
            SortOrder::Descending => f.write_str("Descending"),
        }
    }
}

/// Order `(id, value)` pairs by value
///
/// Missing values always sort last: as `+inf` when ascending and as `-inf`
/// when descending. Ties keep their input order.
pub fn sort_ranking<K, I>(items: I, order: SortOrder) -> Vec<(K, Option<f64>)>
where
    I: IntoIterator<Item = (K, Option<f64>)>,
{
    let mut items: Vec<_> = items.into_iter().collect();
    items.sort_by(|(_, a), (_, b)| match (a, b) {
        (Some(a), Some(b)) => match order {
            SortOrder::Ascending => a.total_cmp(b),
            SortOrder::Descending => b.total_cmp(a),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    items
}

/// The first `n` entries of [`sort_ranking`]
pub fn top_n<K, I>(items: I, order: SortOrder, n: usize) -> Vec<(K, Option<f64>)>
where
    I: IntoIterator<Item = (K, Option<f64>)>,
{
    let mut ranked = sort_ranking(items, order);
    ranked.truncate(n);
    ranked
}

/// Best (or worst) groups for a selected metric
#[derive(Debug, Clone, PartialEq)]
pub struct RankingChart {
    pub metric: Metric,
    pub order: SortOrder,
    /// Group index and value, in rank order
    pub entries: Vec<(usize, Option<f64>)>,
}

impl RankingChart {
    /// Number of bars shown when the caller does not choose
    pub const DEFAULT_TOP: usize = 5;

    pub fn from_result(result: &FairnessResult, metric: Metric, order: SortOrder, top: usize) -> Self {
        let values = result.raw_values(metric).iter().map(|(id, v)| (*id, *v));
        Self {
            metric,
            order,
            entries: top_n(values, order, top),
        }
    }

    /// Group index shown at a bar position
    pub fn group_at(&self, position: usize) -> Option<usize> {
        self.entries.get(position).map(|(id, _)| *id)
    }

    pub fn title(&self) -> String {
        format!("Subgroup ranking by {} ({})", self.metric, self.order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::result::tests::sample;

    fn items() -> Vec<(&'static str, Option<f64>)> {
        vec![("a", Some(3.0)), ("b", None), ("c", Some(1.0))]
    }

    #[test]
    fn test_ascending_top_two() {
        assert_eq!(
            top_n(items(), SortOrder::Ascending, 2),
            vec![("c", Some(1.0)), ("a", Some(3.0))]
        );
    }

    #[test]
    fn test_descending_top_two() {
        assert_eq!(
            top_n(items(), SortOrder::Descending, 2),
            vec![("a", Some(3.0)), ("c", Some(1.0))]
        );
    }

    #[test]
    fn test_nulls_sort_last_in_both_directions() {
        for order in [SortOrder::Ascending, SortOrder::Descending] {
            let ranked = sort_ranking(items(), order);
            assert_eq!(ranked.last(), Some(&("b", None)));
        }

        let ranked = sort_ranking(
            vec![(1, None), (2, Some(-5.0)), (3, None), (4, Some(0.0))],
            SortOrder::Descending,
        );
        assert_eq!(
            ranked,
            vec![(4, Some(0.0)), (2, Some(-5.0)), (1, None), (3, None)]
        );
    }

    #[test]
    fn test_ties_keep_input_order() {
        let ranked = sort_ranking(
            vec![("x", Some(1.0)), ("y", Some(1.0)), ("z", Some(0.5))],
            SortOrder::Ascending,
        );
        assert_eq!(
            ranked,
            vec![("z", Some(0.5)), ("x", Some(1.0)), ("y", Some(1.0))]
        );
    }

    #[test]
    fn test_top_larger_than_input() {
        assert_eq!(top_n(items(), SortOrder::Ascending, 10).len(), 3);
        assert!(top_n(items(), SortOrder::Ascending, 0).is_empty());
    }

    #[test]
    fn test_ranking_chart_from_result() {
        let result = sample();

        let chart = RankingChart::from_result(&result, Metric::GroupAccuracy, SortOrder::Ascending, 5);
        assert_eq!(chart.entries, vec![(1, Some(0.7)), (0, Some(0.79)), (2, None)]);
        assert_eq!(chart.group_at(0), Some(1));
        assert_eq!(chart.group_at(9), None);

        let chart = RankingChart::from_result(&result, Metric::ClusterAccuracy, SortOrder::Descending, 2);
        assert_eq!(chart.entries, vec![(2, Some(0.9)), (0, Some(0.81))]);
        assert_eq!(chart.title(), "Subgroup ranking by c_acc (Descending)");
    }
}
