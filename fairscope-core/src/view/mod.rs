//! View models derived from a fairness result
//!
//! Each view is plain data: a front-end decides how to draw it. Views are
//! built from a borrowed [`FairnessResult`](crate::domain::result::FairnessResult)
//! and never mutate it.

mod charts;
mod ranking;
mod table;

pub use charts::{
    GroupSizeChart, RADAR_AXES, RadarChart, RadarSeries, SELECTION_AXES, SelectionChart,
    count_outliers, count_values,
};
pub use ranking::{RankingChart, SortOrder, sort_ranking, top_n};
pub use table::{DetailTable, GroupRow, page_of};
