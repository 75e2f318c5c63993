//! Evaluate command handler
//!
//! Builds a fairness request from the command line, checks it against the
//! backend's metadata, submits it and follows the task to its result.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use fairscope_core::dto::task::{DEFAULT_THRESHOLD, TaskRequest, parse_parameter_value};
use fairscope_client::{FairnessClient, PollOutcome, TaskPoller};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::warn;

use super::ViewArgs;
use super::task::outcome_to_result;
use crate::config::Config;
use crate::controller::ViewController;

/// Arguments of `fairscope evaluate`
#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    /// Dataset identifier
    #[arg(long)]
    pub dataset: String,

    /// Label of the positive outcome (0 or 1)
    #[arg(long, default_value_t = 1)]
    pub positive_class: u8,

    /// Entropy threshold in [0, 1]
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Categorical column (repeatable)
    #[arg(long = "categorical", value_name = "COLUMN")]
    pub categorical: Vec<String>,

    /// Clustering algorithm
    #[arg(long, conflicts_with = "auto")]
    pub algorithm: Option<String>,

    /// Clustering parameter as name=value (repeatable)
    #[arg(long = "param", value_name = "NAME=VALUE", requires = "algorithm")]
    pub params: Vec<String>,

    /// Use the automatic clustering preset
    #[arg(long)]
    pub auto: bool,

    #[command(flatten)]
    pub view: ViewArgs,
}

/// Handle the evaluate command
pub async fn handle_evaluate(args: EvaluateArgs, config: &Config) -> Result<()> {
    let client = config.client()?;
    let request = build_request(&args)?;

    check_against_backend(&client, &request).await?;

    let poller = TaskPoller::new(Arc::new(client)).with_interval(config.poll_interval);
    let mut controller = ViewController::new();

    let outcome = controller
        .evaluate(&poller, request)
        .await
        .context("Failed to submit fairness task")?;

    if outcome == PollOutcome::Succeeded {
        controller.show(&args.view.into());
    }
    outcome_to_result(outcome)
}

/// Turn command-line arguments into a validated request
fn build_request(args: &EvaluateArgs) -> Result<TaskRequest> {
    if args.auto {
        let request = TaskRequest::automatic(&args.dataset, args.positive_class, args.threshold)?;
        return with_columns(request, &args.categorical);
    }

    let mut builder = TaskRequest::builder(&args.dataset)
        .positive_class(args.positive_class)
        .threshold(args.threshold)
        .categorical_columns(args.categorical.iter().cloned());

    if let Some(algorithm) = &args.algorithm {
        builder = builder.algorithm(algorithm);
    }

    for param in &args.params {
        let (name, value) = parse_param(param)?;
        builder = builder.parameter(name, value);
    }

    Ok(builder.build()?)
}

/// The automatic preset plus the user's categorical columns
fn with_columns(request: TaskRequest, columns: &[String]) -> Result<TaskRequest> {
    if columns.is_empty() {
        return Ok(request);
    }

    let mut builder = TaskRequest::builder(request.dataset_id())
        .positive_class(request.positive_class())
        .threshold(request.threshold())
        .categorical_columns(columns.iter().cloned());

    if let Some(choice) = request.clustering() {
        builder = builder.algorithm(&choice.algorithm);
        for (name, value) in &choice.parameters {
            builder = builder.parameter(name, value.clone());
        }
    }

    Ok(builder.build()?)
}

/// Split `name=value`, typing the value as JSON when it parses as such
fn parse_param(text: &str) -> Result<(String, JsonValue)> {
    let (name, value) = text
        .split_once('=')
        .with_context(|| format!("Invalid parameter `{}`, expected NAME=VALUE", text))?;

    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Invalid parameter `{}`, name is empty", text);
    }

    Ok((name.to_string(), parse_parameter_value(value.trim())))
}

/// Reject unknown columns and invalid clustering parameters before submitting
///
/// Metadata that cannot be fetched is skipped; the backend has the last word.
async fn check_against_backend(client: &FairnessClient, request: &TaskRequest) -> Result<()> {
    if !request.categorical_columns().is_empty() {
        match client.columns_info(request.dataset_id()).await {
            Ok(columns) => {
                for column in request.categorical_columns() {
                    if !columns.contains(column) {
                        anyhow::bail!(
                            "Dataset {} has no column `{}`",
                            request.dataset_id(),
                            column
                        );
                    }
                }
            }
            Err(e) if e.is_not_found() => {
                anyhow::bail!("Dataset {} not found", request.dataset_id());
            }
            Err(e) => warn!("Could not check dataset columns: {}", e),
        }
    }

    if let Some(choice) = request.clustering() {
        match client.clustering_info().await {
            Ok(catalog) => catalog
                .validate(&choice.algorithm, &choice.parameters)
                .context("Invalid clustering settings")?,
            Err(e) => {
                warn!("Could not check clustering parameters: {}", e);
                println!(
                    "{}",
                    "⚠ Clustering parameters not checked, backend catalog unavailable".yellow()
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serde_json::json;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: EvaluateArgs,
    }

    fn parse(argv: &[&str]) -> EvaluateArgs {
        let argv = std::iter::once("evaluate").chain(argv.iter().copied());
        TestCli::try_parse_from(argv).unwrap().args
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("n_clusters=10").unwrap(),
            ("n_clusters".to_string(), json!(10))
        );
        assert_eq!(
            parse_param("linkage = single").unwrap(),
            ("linkage".to_string(), json!("single"))
        );
        assert!(parse_param("n_clusters").is_err());
        assert!(parse_param("=3").is_err());
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["--dataset", "d1"]);
        let request = build_request(&args).unwrap();

        assert_eq!(request.positive_class(), 1);
        assert_eq!(request.threshold(), DEFAULT_THRESHOLD);
        assert!(request.clustering().is_none());
        assert_eq!(args.view.top, 5);
    }

    #[test]
    fn test_custom_clustering() {
        let args = parse(&[
            "--dataset",
            "adult",
            "--categorical",
            "sex",
            "--categorical",
            "race",
            "--algorithm",
            "dbscan",
            "--param",
            "eps=0.5",
            "--param",
            "min_samples=5",
            "--rank-by",
            "g_acc",
            "--descending",
        ]);
        let request = build_request(&args).unwrap();

        assert_eq!(request.categorical_columns(), ["sex", "race"]);
        let choice = request.clustering().unwrap();
        assert_eq!(choice.algorithm, "dbscan");
        assert_eq!(
            choice.parameters,
            vec![
                ("eps".to_string(), json!(0.5)),
                ("min_samples".to_string(), json!(5)),
            ]
        );
        assert!(args.view.descending);
    }

    #[test]
    fn test_auto_keeps_categorical_columns() {
        let args = parse(&["--dataset", "d1", "--auto", "--categorical", "sex"]);
        let request = build_request(&args).unwrap();

        assert_eq!(request.clustering().unwrap().algorithm, "agglomerative");
        assert_eq!(request.categorical_columns(), ["sex"]);
    }

    #[test]
    fn test_invalid_arguments() {
        let args = parse(&["--dataset", "d1", "--threshold", "1.5"]);
        assert!(build_request(&args).is_err());

        let argv = ["evaluate", "--dataset", "d1", "--auto", "--algorithm", "kmeans"];
        assert!(TestCli::try_parse_from(argv).is_err());

        let argv = ["evaluate", "--dataset", "d1", "--param", "eps=0.5"];
        assert!(TestCli::try_parse_from(argv).is_err());

        let argv = ["evaluate", "--dataset", "d1", "--rank-by", "accuracy"];
        assert!(TestCli::try_parse_from(argv).is_err());
    }
}
