//! Tabledata API service (streaming inserts).

use crate::client::RequestExecutor;
use crate::errors::{BigQueryResult, InsertPartialFailureError};
use crate::resilience::{BackoffRetryOptions, RetryExecutor};
use crate::types::{InsertAllRequest, InsertAllResponse};
use serde::Serialize;
use std::sync::Arc;

/// Service for streaming row inserts.
pub struct TabledataService {
    executor: Arc<RequestExecutor>,
}

impl TabledataService {
    /// Creates a new tabledata service.
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self { executor }
    }

    /// Streams `rows` into a table.
    ///
    /// The call runs through a [`RetryExecutor`] built from `options` (a single attempt
    /// when `None`). Rejected rows fail the whole call with
    /// [`InsertPartialFailureError`]. A retried attempt resends every row, including
    /// those the previous attempt got accepted. An unusable private key fails the call
    /// before the first attempt and is never retried.
    pub async fn insert_all<R: Serialize>(
        &self,
        dataset_id: &str,
        table_id: &str,
        rows: &[R],
        options: Option<BackoffRetryOptions>,
    ) -> BigQueryResult<()> {
        let path = format!("datasets/{}/tables/{}/insertAll", dataset_id, table_id);
        let body = InsertAllRequest::new(rows);
        let retry = RetryExecutor::new(options.unwrap_or_default());

        self.executor.tokens().issuer().key()?;

        retry
            .execute(|attempt| {
                let path = &path;
                let body = &body;
                async move {
                    tracing::debug!(
                        dataset = %dataset_id,
                        table = %table_id,
                        rows = body.rows.len(),
                        attempt,
                        "Inserting rows"
                    );

                    let response: InsertAllResponse = self.executor.post(path, body).await?;

                    match response.insert_errors {
                        Some(errors) if !errors.is_empty() => Err(InsertPartialFailureError {
                            dataset_id: dataset_id.to_string(),
                            table_id: table_id.to_string(),
                            errors,
                        }
                        .into()),
                        _ => Ok(()),
                    }
                }
            })
            .await
    }
}
