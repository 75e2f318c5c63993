//! Analysis session
//!
//! The result of the most recent successful task, together with what produced
//! it. A front-end holds at most one session and replaces it wholesale when a
//! newer task succeeds; every view is computed from the session it is given.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::domain::result::{FairnessResult, Metric};
use crate::dto::task::TaskRequest;
use crate::view::{
    DetailTable, GroupSizeChart, RadarChart, RankingChart, SelectionChart, SortOrder,
};

/// A completed analysis, read-only once created
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    generation: u64,
    request: Option<TaskRequest>,
    result: Arc<FairnessResult>,
    received_at: DateTime<Utc>,
}

impl AnalysisSession {
    /// Create a session for a result delivered by polling loop `generation`
    ///
    /// `request` is `None` when polling was resumed from a bare status URL.
    pub fn new(generation: u64, request: Option<TaskRequest>, result: FairnessResult) -> Self {
        Self {
            generation,
            request,
            result: Arc::new(result),
            received_at: Utc::now(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn request(&self) -> Option<&TaskRequest> {
        self.request.as_ref()
    }

    pub fn result(&self) -> &FairnessResult {
        &self.result
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    pub fn radar(&self) -> RadarChart {
        RadarChart::from_result(&self.result)
    }

    pub fn group_sizes(&self) -> GroupSizeChart {
        GroupSizeChart::from_result(&self.result)
    }

    pub fn selection(&self, index: usize) -> SelectionChart {
        SelectionChart::from_result(&self.result, index)
    }

    pub fn table(&self) -> DetailTable {
        DetailTable::from_result(&self.result)
    }

    pub fn ranking(&self, metric: Metric, order: SortOrder, top: usize) -> RankingChart {
        RankingChart::from_result(&self.result, metric, order, top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::result::tests::sample;

    #[test]
    fn test_session_exposes_views() {
        let request = TaskRequest::builder("d1").threshold(0.5).build().unwrap();
        let session = AnalysisSession::new(3, Some(request), sample());

        assert_eq!(session.generation(), 3);
        assert_eq!(session.request().map(|r| r.dataset_id()), Some("d1"));
        assert_eq!(session.radar().series.len(), 2);
        assert_eq!(session.group_sizes().clusters.len(), 3);
        assert_eq!(session.table().rows.len(), 3);
        assert_eq!(session.selection(0).index, 0);
        assert_eq!(
            session
                .ranking(Metric::ClusterAccuracy, SortOrder::Ascending, 1)
                .entries,
            vec![(1, Some(0.74))]
        );
        assert!(session.received_at() <= Utc::now());
    }
}
