//! Metadata command handlers

use anyhow::{Context, Result};

use crate::config::Config;
use crate::render;

/// List the columns of a dataset
pub async fn list_columns(config: &Config, dataset_id: &str) -> Result<()> {
    let client = config.client()?;
    let columns = client
        .columns_info(dataset_id)
        .await
        .with_context(|| format!("Failed to fetch columns of dataset {}", dataset_id))?;

    render::print_columns(dataset_id, &columns);
    Ok(())
}

/// List the clustering algorithms the backend offers
pub async fn list_algorithms(config: &Config) -> Result<()> {
    let client = config.client()?;
    let catalog = client
        .clustering_info()
        .await
        .context("Failed to fetch clustering algorithms")?;

    render::print_catalog(&catalog);
    Ok(())
}
