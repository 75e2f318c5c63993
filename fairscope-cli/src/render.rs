//! Terminal rendering of the view models
//!
//! Everything here prints; the data comes from `fairscope_core::view`.

use colored::*;
use fairscope_core::domain::catalog::ClusteringCatalog;
use fairscope_core::domain::dataset::ColumnsInfo;
use fairscope_core::domain::result::{Metric, Strategy};
use fairscope_core::domain::task::{TaskState, TaskStatusSnapshot};
use fairscope_core::session::AnalysisSession;
use fairscope_core::view::{
    DetailTable, GroupSizeChart, RadarChart, RankingChart, SELECTION_AXES, SelectionChart,
    page_of,
};
use serde_json::Value as JsonValue;

/// Rows per detail table page
pub const PAGE_SIZE: usize = 10;

const BAR_WIDTH: usize = 40;

/// Print one status snapshot as a progress line
pub fn print_snapshot(snapshot: &TaskStatusSnapshot) {
    let state = match snapshot.state {
        TaskState::Success => snapshot.state.to_string().green(),
        TaskState::Failure => snapshot.state.to_string().red(),
        TaskState::Progress => snapshot.state.to_string().cyan(),
        TaskState::Pending | TaskState::Other => snapshot.state.to_string().yellow(),
    };
    println!("  {} State={}: {}", "▸".cyan(), state, snapshot.status);
}

pub fn print_session_header(session: &AnalysisSession) {
    println!();
    println!("{}", "Fairness Analysis:".bold());
    if let Some(request) = session.request() {
        println!("  Dataset:        {}", request.dataset_id().cyan());
        println!("  Positive class: {}", request.positive_class());
        println!("  Threshold:      {}", request.threshold());
        if let Some(choice) = request.clustering() {
            println!("  Clustering:     {}", choice.algorithm);
        }
    }
    println!("  Groups:         {}", session.result().cluster_count());
    println!("  Duplication:    {}", fmt_value(session.result().duplication));
    for (index, value) in session.result().cvi.iter().flatten() {
        println!("  {:<15} {}", format!("{}:", index), fmt_value(*value));
    }
    println!(
        "  Received:       {}",
        session
            .received_at()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!();
}

/// Print the two strategies' aggregate metrics side by side
pub fn print_radar(chart: &RadarChart) {
    println!("{}", "Aggregate fairness".bold());
    println!(
        "  {:<20} {:>14} {:>14}",
        "",
        chart.series[0].label.split(' ').next().unwrap_or_default(),
        chart.series[1].label.split(' ').next().unwrap_or_default()
    );
    println!("{}", format!("  {}", "─".repeat(50)).dimmed());
    for (axis, name) in chart.axes.iter().enumerate() {
        println!(
            "  {:<20} {:>14} {:>14}",
            name,
            fmt_value(chart.series[0].points[axis]),
            fmt_value(chart.series[1].points[axis])
        );
    }
    println!();
}

/// Print cluster and subgroup sizes as horizontal bars
pub fn print_group_sizes(chart: &GroupSizeChart) {
    println!("{}", "Group sizes".bold());
    let max = chart.max_size();
    for label in &chart.labels {
        let cluster = chart.clusters.get(*label).copied().unwrap_or(0);
        let subgroup = chart.subgroups.get(*label).copied().flatten();

        println!(
            "  {:>4} {} {} {}",
            label,
            "C".cyan(),
            bar(cluster, max, BAR_WIDTH).cyan(),
            cluster
        );
        match subgroup {
            Some(size) => println!(
                "       {} {} {}",
                "E".magenta(),
                bar(size, max, BAR_WIDTH).magenta(),
                size
            ),
            None => println!("       {} {}", "E".magenta(), "skipped".dimmed()),
        }
    }
    if chart.outliers > 0 {
        println!("  {} {} rows not clustered", "!".yellow(), chart.outliers);
    }
    println!();
}

/// Print the metrics of one selected group under both strategies
pub fn print_selection(chart: &SelectionChart) {
    println!("{}", chart.title().bold());
    println!("  {:<20} {:>14} {:>14}", "", "Cluster", "Entropy");
    println!("{}", format!("  {}", "─".repeat(50)).dimmed());
    for (i, name) in SELECTION_AXES.iter().enumerate() {
        println!(
            "  {:<20} {:>14} {:>14}",
            name,
            fmt_value(chart.cluster[i]),
            fmt_value(chart.subgroup[i])
        );
    }
    println!();
}

/// Print the attribute values that define subgroup `index`
pub fn print_pattern(index: usize, pattern: &[(&str, &JsonValue)]) {
    println!("  {} {}", format!("Subgroup {}:", index).dimmed(), fmt_pattern(pattern));
    println!();
}

/// Print the page of the detail table holding `selected`, with that row expanded
pub fn print_table(table: &DetailTable, selected: usize) {
    if table.rows.is_empty() {
        println!("{}", "No groups in this result.".yellow());
        return;
    }

    let (page, _) = page_of(selected.min(table.rows.len() - 1), PAGE_SIZE);
    let pages = table.rows.len().div_ceil(PAGE_SIZE);
    println!(
        "{}",
        format!("Groups (page {} of {})", page, pages).bold()
    );

    let header: Vec<String> = std::iter::once(format!("{:>4}", "id"))
        .chain(table.columns.iter().map(|c| format!("{:<14}", c)))
        .collect();
    println!("  {}", header.join(" ").dimmed());

    for row in table.rows.iter().skip((page - 1) * PAGE_SIZE).take(PAGE_SIZE) {
        let cells: Vec<String> = std::iter::once(format!("{:>4}", row.id))
            .chain(row.attributes.iter().map(|v| format!("{:<14}", fmt_attribute(v))))
            .collect();
        let line = cells.join(" ");

        if row.id == selected {
            println!("{} {}", "▸".cyan(), line.bold());
            for metric in Metric::ALL {
                println!(
                    "        {:<12} {:<16} {:>10}",
                    metric.as_str().dimmed(),
                    metric.label(),
                    fmt_value(row.metric(metric))
                );
            }
        } else {
            println!("  {}", line);
        }
    }
    println!();
}

/// Print the top-N bars for one metric
pub fn print_ranking(chart: &RankingChart) {
    println!("{}", chart.title().bold());
    if chart.entries.is_empty() {
        println!("  {}", "No values.".yellow());
        println!();
        return;
    }

    let max = chart
        .entries
        .iter()
        .filter_map(|(_, v)| v.map(f64::abs))
        .fold(0.0, f64::max);

    for (group, value) in &chart.entries {
        let (page, row) = page_of(*group, PAGE_SIZE);
        let drawn = match value {
            Some(v) if max > 0.0 => {
                "█".repeat(((v.abs() / max) * BAR_WIDTH as f64).round() as usize)
            }
            _ => String::new(),
        };
        println!(
            "  {:>4} {} {:>10} {}",
            group,
            colorize_metric(chart.metric, drawn),
            fmt_value(*value),
            format!("(page {}, row {})", page, row + 1).dimmed()
        );
    }
    println!();
}

pub fn print_columns(dataset_id: &str, columns: &ColumnsInfo) {
    if columns.is_empty() {
        println!(
            "{}",
            format!("Dataset {} has no columns.", dataset_id).yellow()
        );
        return;
    }

    println!(
        "{}",
        format!("Dataset {} ({} column(s)):", dataset_id, columns.len()).bold()
    );
    for name in columns.names() {
        println!(
            "  {} {:<24} {}",
            "▸".cyan(),
            name,
            columns.describe(name).unwrap_or_default().dimmed()
        );
    }
}

pub fn print_catalog(catalog: &ClusteringCatalog) {
    if catalog.is_empty() {
        println!("{}", "No clustering algorithms available.".yellow());
        return;
    }

    println!("{}", "Clustering algorithms:".bold());
    for algorithm in catalog.algorithms() {
        println!("  {} {}", "▸".cyan(), algorithm.bold());
        for (name, kind) in catalog.parameters(algorithm).into_iter().flatten() {
            println!("    {:<20} {}", name, kind.to_string().dimmed());
        }
    }
}

/// Metric value with three decimals, or `n/a`
fn fmt_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.3}", v),
        None => "n/a".to_string(),
    }
}

/// `column=value` pairs; a pattern without fixed attributes covers every row
fn fmt_pattern(pattern: &[(&str, &JsonValue)]) -> String {
    if pattern.is_empty() {
        return "all rows".to_string();
    }
    pattern
        .iter()
        .map(|(column, value)| format!("{}={}", column, fmt_attribute(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn fmt_attribute(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "*".to_string(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Bar of `value` scaled so that `max` fills `width` cells
fn bar(value: u64, max: u64, width: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let cells = (value as f64 / max as f64 * width as f64).round() as usize;
    "█".repeat(cells.min(width))
}

fn colorize_metric(metric: Metric, text: String) -> ColoredString {
    match metric.strategy() {
        Strategy::Cluster => text.cyan(),
        Strategy::Entropy => text.magenta(),
    }
}
