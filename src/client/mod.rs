//! BigQuery API client implementation.

use crate::auth::{TokenCache, TokenIssuer};
use crate::config::{BigQueryConfig, BigQueryConfigBuilder};
use crate::credentials::{Credentials, CredentialsSource};
use crate::errors::{BigQueryError, BigQueryResult};
use crate::resilience::BackoffRetryOptions;
use crate::services::*;
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::types::{QueryOptions, TableSchema};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

mod executor;
pub use executor::RequestExecutor;

/// BigQuery API client.
///
/// This is the main entry point. It owns one token cache, so every call made through
/// the same client shares issued tokens.
pub struct BigQueryClient {
    config: BigQueryConfig,
    executor: Arc<RequestExecutor>,
}

impl BigQueryClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use integrations_bigquery::{BigQueryClient, BigQueryConfig};
    /// use integrations_bigquery::credentials::Credentials;
    ///
    /// # fn example(json: &str) -> Result<(), Box<dyn std::error::Error>> {
    /// let config = BigQueryConfig::builder()
    ///     .credentials(Credentials::from_json(json)?)
    ///     .build()?;
    ///
    /// let client = BigQueryClient::new(config)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(config: BigQueryConfig) -> BigQueryResult<Self> {
        config.validate()?;

        let transport = ReqwestTransport::with_settings(config.connect_timeout, &config.user_agent)
            .map_err(|e| {
                BigQueryError::configuration(format!("Failed to create transport: {}", e))
            })?;

        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Creates a client that sends every request, token exchanges included, through
    /// `transport`.
    pub fn with_transport(config: BigQueryConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let issuer = TokenIssuer::new(config.credentials.clone(), transport.clone())
            .with_timeout(config.timeout);
        let tokens = Arc::new(TokenCache::new(issuer));
        let executor = Arc::new(RequestExecutor::new(config.clone(), transport, tokens));

        Self { config, executor }
    }

    /// Resolves credentials from `source` and builds a client with default settings.
    pub async fn from_source(source: &dyn CredentialsSource) -> BigQueryResult<Self> {
        let credentials = source.resolve().await?;
        Self::builder().credentials(credentials).build()
    }

    /// Creates a new client builder.
    pub fn builder() -> BigQueryClientBuilder {
        BigQueryClientBuilder::new()
    }

    // Service accessors

    /// Access the datasets service.
    pub fn datasets(&self) -> DatasetsService {
        DatasetsService::new(self.executor.clone())
    }

    /// Access the tables service.
    pub fn tables(&self) -> TablesService {
        TablesService::new(self.executor.clone())
    }

    /// Access the tabledata service for streaming inserts.
    pub fn tabledata(&self) -> TabledataService {
        TabledataService::new(self.executor.clone())
    }

    /// Access the jobs service for queries.
    pub fn jobs(&self) -> JobsService {
        JobsService::new(self.executor.clone())
    }

    // Domain operations

    /// Creates the dataset unless it already exists.
    pub async fn create_dataset_if_not_exists(&self, dataset_id: &str) -> BigQueryResult<()> {
        self.datasets().create_if_not_exists(dataset_id).await
    }

    /// Creates the table, or replaces its schema when it already exists.
    pub async fn create_or_update_table_schema(
        &self,
        dataset_id: &str,
        table_id: &str,
        schema: &TableSchema,
    ) -> BigQueryResult<()> {
        self.tables()
            .create_or_update_schema(dataset_id, table_id, schema)
            .await
    }

    /// Streams rows into a table, retrying according to `options`.
    pub async fn insert<R: Serialize>(
        &self,
        dataset_id: &str,
        table_id: &str,
        rows: &[R],
        options: Option<BackoffRetryOptions>,
    ) -> BigQueryResult<()> {
        self.tabledata()
            .insert_all(dataset_id, table_id, rows, options)
            .await
    }

    /// Runs a query and parses the response body as `T`.
    pub async fn query_raw<T: DeserializeOwned>(
        &self,
        query: &str,
        options: QueryOptions,
    ) -> BigQueryResult<T> {
        self.jobs().query(query, options).await
    }

    /// Gets the project every request is scoped to.
    pub fn project_id(&self) -> &str {
        self.config.project_id()
    }

    /// Gets the configuration.
    pub fn config(&self) -> &BigQueryConfig {
        &self.config
    }

    /// Gets the request executor (for advanced use cases).
    pub fn executor(&self) -> &Arc<RequestExecutor> {
        &self.executor
    }
}

/// Builder for BigQueryClient.
pub struct BigQueryClientBuilder {
    config_builder: BigQueryConfigBuilder,
}

impl BigQueryClientBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            config_builder: BigQueryConfig::builder(),
        }
    }

    /// Sets the credentials.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.config_builder = self.config_builder.credentials(credentials);
        self
    }

    /// Sets the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.base_url(url);
        self
    }

    /// Replaces the requested scopes.
    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config_builder = self.config_builder.scopes(scopes);
        self
    }

    /// Sets the timeout.
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config_builder = self.config_builder.timeout(timeout);
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config_builder = self.config_builder.connect_timeout(timeout);
        self
    }

    /// Sets the user agent.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.user_agent(ua);
        self
    }

    /// Builds the client.
    pub fn build(self) -> BigQueryResult<BigQueryClient> {
        let config = self.config_builder.build()?;
        BigQueryClient::new(config)
    }
}

impl Default for BigQueryClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
