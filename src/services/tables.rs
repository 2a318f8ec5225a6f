//! Tables API service.

use crate::client::RequestExecutor;
use crate::errors::BigQueryResult;
use crate::types::{Table, TableDefinition, TableReference, TableSchema};
use std::sync::Arc;

/// Service for table operations.
pub struct TablesService {
    executor: Arc<RequestExecutor>,
}

impl TablesService {
    /// Creates a new tables service.
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self { executor }
    }

    fn definition<'a>(
        &self,
        dataset_id: &str,
        table_id: &str,
        schema: &'a TableSchema,
    ) -> TableDefinition<'a> {
        TableDefinition {
            table_reference: TableReference {
                project_id: self.executor.config().project_id().to_string(),
                dataset_id: dataset_id.to_string(),
                table_id: table_id.to_string(),
            },
            schema,
        }
    }

    /// Gets a table.
    pub async fn get(&self, dataset_id: &str, table_id: &str) -> BigQueryResult<Table> {
        self.executor
            .get(&format!("datasets/{}/tables/{}", dataset_id, table_id))
            .await
    }

    /// Creates a table with the given schema.
    pub async fn insert(
        &self,
        dataset_id: &str,
        table_id: &str,
        schema: &TableSchema,
    ) -> BigQueryResult<Table> {
        let definition = self.definition(dataset_id, table_id, schema);
        self.executor
            .post(&format!("datasets/{}/tables", dataset_id), &definition)
            .await
    }

    /// Replaces the definition of an existing table.
    pub async fn patch(
        &self,
        dataset_id: &str,
        table_id: &str,
        schema: &TableSchema,
    ) -> BigQueryResult<Table> {
        let definition = self.definition(dataset_id, table_id, schema);
        self.executor
            .patch(
                &format!("datasets/{}/tables/{}", dataset_id, table_id),
                &definition,
            )
            .await
    }

    /// Updates the table's schema, creating the table when it does not exist.
    pub async fn create_or_update_schema(
        &self,
        dataset_id: &str,
        table_id: &str,
        schema: &TableSchema,
    ) -> BigQueryResult<()> {
        let exists = match self.get(dataset_id, table_id).await {
            Ok(_) => true,
            Err(e) if e.is_not_found() => false,
            Err(e) => return Err(e),
        };

        if exists {
            tracing::info!(dataset = %dataset_id, table = %table_id, "Updating table schema");
            self.patch(dataset_id, table_id, schema).await?;
        } else {
            tracing::info!(dataset = %dataset_id, table = %table_id, "Creating table");
            self.insert(dataset_id, table_id, schema).await?;
        }

        Ok(())
    }
}
