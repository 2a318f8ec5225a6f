//! Datasets API service.

use crate::client::RequestExecutor;
use crate::errors::BigQueryResult;
use crate::types::{CreateDatasetRequest, Dataset, DatasetReference};
use std::sync::Arc;

/// Service for dataset operations.
pub struct DatasetsService {
    executor: Arc<RequestExecutor>,
}

impl DatasetsService {
    /// Creates a new datasets service.
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self { executor }
    }

    /// Gets a dataset.
    pub async fn get(&self, dataset_id: &str) -> BigQueryResult<Dataset> {
        self.executor
            .get(&format!("datasets/{}", dataset_id))
            .await
    }

    /// Creates a dataset in the client's project.
    pub async fn insert(&self, dataset_id: &str) -> BigQueryResult<Dataset> {
        let request = CreateDatasetRequest {
            dataset_reference: DatasetReference {
                dataset_id: dataset_id.to_string(),
                project_id: None,
            },
        };
        self.executor.post("datasets", &request).await
    }

    /// Creates the dataset unless it already exists.
    ///
    /// Only a structured 404 from the lookup leads to creation; every other lookup
    /// failure is returned unchanged.
    pub async fn create_if_not_exists(&self, dataset_id: &str) -> BigQueryResult<()> {
        match self.get(dataset_id).await {
            Ok(_) => {
                tracing::debug!(dataset = %dataset_id, "Dataset already exists");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                tracing::info!(dataset = %dataset_id, "Creating dataset");
                self.insert(dataset_id).await?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
