//! Dataset and clustering metadata endpoints

use fairscope_core::domain::catalog::ClusteringCatalog;
use fairscope_core::domain::dataset::ColumnsInfo;

use crate::FairnessClient;
use crate::error::Result;

impl FairnessClient {
    // =============================================================================
    // Metadata
    // =============================================================================

    /// Get the columns of a dataset
    ///
    /// # Arguments
    /// * `dataset_id` - The dataset identifier
    ///
    /// # Returns
    /// Column names with their backend metadata
    pub async fn columns_info(&self, dataset_id: &str) -> Result<ColumnsInfo> {
        let url = self.url_for(&self.endpoints.columns_info);
        let response = self
            .client
            .get(&url)
            .query(&[("id", dataset_id)])
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get the clustering algorithms the backend can run
    ///
    /// # Returns
    /// Algorithm names with the schema of their parameters
    pub async fn clustering_info(&self) -> Result<ClusteringCatalog> {
        let url = self.url_for(&self.endpoints.clustering_info);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
