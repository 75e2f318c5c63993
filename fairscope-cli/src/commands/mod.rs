//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod evaluate;
mod metadata;
mod task;

pub use evaluate::EvaluateArgs;

use anyhow::Result;
use clap::{Args, Subcommand};
use fairscope_core::domain::result::Metric;
use fairscope_core::view::{RankingChart, SortOrder};

use crate::config::Config;
use crate::controller::ViewOptions;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Submit a fairness evaluation and show its result
    Evaluate(EvaluateArgs),
    /// Resume polling an already submitted task
    Watch {
        /// Status URL returned on submission
        status_url: String,

        #[command(flatten)]
        view: ViewArgs,
    },
    /// Poll a task once and print its state
    Status {
        /// Status URL returned on submission
        status_url: String,
    },
    /// List the columns of a dataset
    Columns {
        /// Dataset identifier
        dataset: String,
    },
    /// List the clustering algorithms and their parameters
    Algorithms,
}

/// Options controlling which result views are printed
#[derive(Args, Debug, Clone)]
pub struct ViewArgs {
    /// Group shown in the selection chart and expanded in the table
    #[arg(long, default_value_t = 0)]
    pub select: usize,

    /// Rank groups by this metric (c_stat_par, c_eq_opp, c_avg_odds, c_acc,
    /// g_stat_par, g_eq_opp, g_avg_odds, g_acc)
    #[arg(long, value_name = "METRIC")]
    pub rank_by: Option<Metric>,

    /// Rank in descending order
    #[arg(long)]
    pub descending: bool,

    /// Number of ranked groups to show
    #[arg(long, default_value_t = RankingChart::DEFAULT_TOP)]
    pub top: usize,
}

impl From<ViewArgs> for ViewOptions {
    fn from(args: ViewArgs) -> Self {
        Self {
            select: args.select,
            rank_by: args.rank_by,
            order: if args.descending {
                SortOrder::Descending
            } else {
                SortOrder::Ascending
            },
            top: args.top,
        }
    }
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Evaluate(args) => evaluate::handle_evaluate(args, config).await,
        Commands::Watch { status_url, view } => {
            task::watch_task(config, &status_url, view.into()).await
        }
        Commands::Status { status_url } => task::task_status(config, &status_url).await,
        Commands::Columns { dataset } => metadata::list_columns(config, &dataset).await,
        Commands::Algorithms => metadata::list_algorithms(config).await,
    }
}
