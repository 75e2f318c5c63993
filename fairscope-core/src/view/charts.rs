//! Chart view models

use crate::domain::result::{FairnessResult, Metric, Strategy};

/// Axes of the radar comparison
pub const RADAR_AXES: [&str; 5] = [
    "Accuracy Error",
    "Statistical Parity",
    "Equal Opportunity",
    "Equalized odds",
    "Accuracy",
];

/// Bars of the selection chart
pub const SELECTION_AXES: [&str; 4] = [
    "Statistical Parity",
    "Equal Opportunity",
    "Equalized odds",
    "Accuracy",
];

/// Count rows per cluster label, densely over `0..=max`
///
/// Negative (outlier) labels are not counted; see [`count_outliers`].
pub fn count_values(labels: &[i64]) -> Vec<u64> {
    let k = labels
        .iter()
        .copied()
        .filter(|label| *label >= 0)
        .max()
        .map_or(0, |max| max as usize + 1);

    let mut counts = vec![0u64; k];
    for label in labels.iter().copied().filter(|label| *label >= 0) {
        counts[label as usize] += 1;
    }
    counts
}

/// Number of rows the clustering marked as outliers
pub fn count_outliers(labels: &[i64]) -> usize {
    labels.iter().filter(|label| **label < 0).count()
}

/// One strategy's five aggregate values
#[derive(Debug, Clone, PartialEq)]
pub struct RadarSeries {
    pub strategy: Strategy,
    pub label: &'static str,
    /// Values in [`RADAR_AXES`] order; `None` leaves a gap
    pub points: [Option<f64>; 5],
}

/// Aggregate fairness of the two subgrouping strategies side by side
#[derive(Debug, Clone, PartialEq)]
pub struct RadarChart {
    pub axes: [&'static str; 5],
    pub series: [RadarSeries; 2],
}

impl RadarChart {
    pub fn from_result(result: &FairnessResult) -> Self {
        let series = Strategy::ALL.map(|strategy| {
            let [stat_par, eq_opp, avg_odds, acc] = strategy.metrics();
            let abs_mean = &result.fair.abs_mean;
            RadarSeries {
                strategy,
                label: strategy.label(),
                points: [
                    result.accuracy(strategy).mean_err,
                    *abs_mean.get(stat_par),
                    *abs_mean.get(eq_opp),
                    *abs_mean.get(avg_odds),
                    *abs_mean.get(acc),
                ],
            }
        });

        Self {
            axes: RADAR_AXES,
            series,
        }
    }
}

/// Population of every cluster and entropy-based subgroup
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSizeChart {
    /// Group indices `0..k`
    pub labels: Vec<usize>,
    /// Rows per cluster
    pub clusters: Vec<u64>,
    /// Rows per entropy-based subgroup, `None` for skipped duplicates
    pub subgroups: Vec<Option<u64>>,
    /// Rows left unclustered
    pub outliers: usize,
}

impl GroupSizeChart {
    pub fn from_result(result: &FairnessResult) -> Self {
        let clusters = count_values(&result.clustering);
        Self {
            labels: (0..clusters.len()).collect(),
            clusters,
            subgroups: result.group_sizes.clone(),
            outliers: count_outliers(&result.clustering),
        }
    }

    /// Largest bar, used to scale drawings
    pub fn max_size(&self) -> u64 {
        let clusters = self.clusters.iter().copied();
        let subgroups = self.subgroups.iter().copied().flatten();
        clusters.chain(subgroups).max().unwrap_or(0)
    }
}

/// Per-metric values of one selected cluster and subgroup
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChart {
    pub index: usize,
    /// Cluster values in [`SELECTION_AXES`] order
    pub cluster: [Option<f64>; 4],
    /// Subgroup values in [`SELECTION_AXES`] order
    pub subgroup: [Option<f64>; 4],
}

impl SelectionChart {
    pub fn from_result(result: &FairnessResult, index: usize) -> Self {
        let values = |strategy: Strategy| {
            strategy
                .metrics()
                .map(|metric: Metric| result.raw_value(metric, index))
        };

        Self {
            index,
            cluster: values(Strategy::Cluster),
            subgroup: values(Strategy::Entropy),
        }
    }

    pub fn title(&self) -> String {
        format!(
            "Subgroup fairness metrics for cluster/entropy-based subgroup {}",
            self.index
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::result::tests::sample;

    #[test]
    fn test_count_values_is_dense() {
        assert_eq!(count_values(&[0, 2, 2, 1, 0, 0]), vec![3, 1, 2]);
        assert_eq!(count_values(&[3]), vec![0, 0, 0, 1]);
        assert!(count_values(&[]).is_empty());
    }

    #[test]
    fn test_outliers_are_counted_separately() {
        assert_eq!(count_values(&[-1, 0, 1, -1, 1]), vec![1, 2]);
        assert_eq!(count_outliers(&[-1, 0, 1, -1, 1]), 2);
    }

    #[test]
    fn test_radar_has_five_points_per_strategy() {
        let chart = RadarChart::from_result(&sample());

        assert_eq!(chart.series.len(), 2);
        let cluster = &chart.series[0];
        assert_eq!(cluster.label, "Clustering-based Fairness");
        assert_eq!(
            cluster.points,
            [Some(0.0167), Some(0.1567), Some(0.2333), Some(0.15), Some(0.8167)]
        );

        let entropy = &chart.series[1];
        assert_eq!(entropy.strategy, Strategy::Entropy);
        assert_eq!(
            entropy.points,
            [Some(-0.055), Some(0.15), Some(0.155), Some(0.1), Some(0.745)]
        );
    }

    #[test]
    fn test_group_sizes_span_all_clusters() {
        let result = sample();
        let chart = GroupSizeChart::from_result(&result);

        assert_eq!(chart.labels, vec![0, 1, 2]);
        assert_eq!(chart.clusters.len(), result.cluster_count());
        assert_eq!(chart.clusters, vec![3, 1, 2]);
        assert_eq!(chart.subgroups, vec![Some(3), Some(2), None]);
        assert_eq!(chart.outliers, 0);
        assert_eq!(chart.max_size(), 3);
    }

    #[test]
    fn test_selection_reads_raw_values() {
        let chart = SelectionChart::from_result(&sample(), 2);

        assert_eq!(chart.cluster, [Some(0.05), Some(-0.4), Some(-0.25), Some(0.9)]);
        assert_eq!(chart.subgroup, [None, None, None, None]);
        assert!(chart.title().ends_with(" 2"));
    }

    #[test]
    fn test_selection_out_of_range_is_empty() {
        let chart = SelectionChart::from_result(&sample(), 42);
        assert_eq!(chart.cluster, [None; 4]);
    }
}
