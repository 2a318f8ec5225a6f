//! BigQuery Integration Module
//!
//! This module provides a type-safe interface to the BigQuery REST API v2,
//! authenticated with a service account through the signed-JWT-bearer grant.
//!
//! # Features
//!
//! - **Authentication**: RS256-signed assertions exchanged for access tokens, cached per
//!   scope set with single-flight refresh
//! - **Datasets and Tables**: idempotent dataset creation and table schema upsert
//! - **Streaming Inserts**: `insertAll` with row-level error reporting
//! - **Queries**: standard SQL with typed named parameters
//! - **Resilience**: bounded retry with fixed or exponential backoff and per-attempt timeout
//! - **Schema Sync**: load `*.schema.json` files and apply them to a dataset
//!
//! # Example
//!
//! ```no_run
//! use integrations_bigquery::prelude::*;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = BigQueryClient::from_source(&EnvironmentCredentials::new()).await?;
//!
//! client.create_dataset_if_not_exists("analytics").await?;
//!
//! let rows = vec![json!({"id": "1", "kind": "signup"})];
//! let retry = BackoffRetryOptions::new()
//!     .max_attempts(3)
//!     .delay(std::time::Duration::from_millis(200))
//!     .exponential(true);
//! client.insert("analytics", "events", &rows, Some(retry)).await?;
//!
//! let result: QueryResponse = client
//!     .query_raw(
//!         "SELECT COUNT(*) FROM analytics.events WHERE kind = @kind",
//!         QueryOptions::new().parameter("kind", "signup"),
//!     )
//!     .await?;
//! println!("{} rows", result.rows.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

// Core modules
pub mod auth;
pub mod client;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod resilience;
pub mod schema;
pub mod services;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use auth::{AccessToken, TokenCache, TokenIssuer};
pub use client::BigQueryClient;
pub use config::{BigQueryConfig, BigQueryConfigBuilder};
pub use errors::{BigQueryError, BigQueryResult};
pub use resilience::{BackoffRetryOptions, RetryExecutor};
pub use types::{QueryOptions, QueryResponse, TableFieldSchema, TableSchema};

/// Prelude module with commonly used types and traits.
///
/// ```no_run
/// use integrations_bigquery::prelude::*;
/// ```
pub mod prelude {
    // Client
    pub use crate::client::{BigQueryClient, BigQueryClientBuilder};

    // Configuration
    pub use crate::config::{BigQueryConfig, BigQueryConfigBuilder};

    // Credentials
    pub use crate::credentials::{
        Credentials, CredentialsFile, CredentialsSource, EncodedCredentials,
        EnvironmentCredentials,
    };

    // Authentication
    pub use crate::auth::{scopes, AccessToken, TokenCache, TokenIssuer};

    // Services
    pub use crate::services::{DatasetsService, JobsService, TabledataService, TablesService};

    // Resilience
    pub use crate::resilience::{BackoffRetryOptions, RetryExecutor};

    // Common types
    pub use crate::types::{
        Dataset, ParameterValue, QueryOptions, QueryResponse, Table, TableFieldSchema,
        TableSchema,
    };

    // Errors
    pub use crate::errors::{BigQueryError, BigQueryResult};
}
