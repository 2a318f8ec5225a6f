//! Jobs API service (synchronous queries).

use crate::client::RequestExecutor;
use crate::errors::{BigQueryResult, UnsupportedParameterTypeError};
use crate::types::{
    ParameterValue, QueryOptions, QueryParameter, QueryParameterType, QueryParameterValue,
    QueryRequest, DEFAULT_QUERY_TIMEOUT_MS,
};
use chrono::SecondsFormat;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Service for running queries.
pub struct JobsService {
    executor: Arc<RequestExecutor>,
}

impl JobsService {
    /// Creates a new jobs service.
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self { executor }
    }

    /// Runs a standard-SQL query and returns the response body parsed as `T`.
    ///
    /// Use [`crate::types::QueryResponse`] for the typed shape or `serde_json::Value`
    /// for the raw document.
    pub async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        options: QueryOptions,
    ) -> BigQueryResult<T> {
        let request = build_query_request(query, &options)?;

        tracing::debug!(
            parameters = options.parameters.len(),
            timeout_ms = request.timeout_ms,
            "Running query"
        );

        self.executor.post("queries", &request).await
    }
}

/// Builds the body of a `queries` call.
///
/// Parameters keep the order in which they were added. A parameter that cannot be
/// typed fails the whole call before anything is sent.
pub fn build_query_request(query: &str, options: &QueryOptions) -> BigQueryResult<QueryRequest> {
    let query_parameters = if options.parameters.is_empty() {
        None
    } else {
        Some(
            options
                .parameters
                .iter()
                .map(|(name, value)| format_query_parameter(name, value))
                .collect::<BigQueryResult<Vec<_>>>()?,
        )
    };

    Ok(QueryRequest {
        query: query.to_string(),
        max_results: options.max_results,
        timeout_ms: options.timeout_ms.unwrap_or(DEFAULT_QUERY_TIMEOUT_MS),
        query_parameters,
        use_legacy_sql: false,
        use_query_cache: true,
    })
}

/// Types a single named parameter.
pub fn format_query_parameter(
    name: &str,
    value: &ParameterValue,
) -> BigQueryResult<QueryParameter> {
    let (type_name, rendered) = match value {
        ParameterValue::Bool(b) => ("BOOL", b.to_string()),
        ParameterValue::String(s) => ("STRING", s.clone()),
        ParameterValue::Number(n) => ("INT64", n.to_string()),
        ParameterValue::Timestamp(ts) => (
            "TIMESTAMP",
            ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        ),
        ParameterValue::Other(_) => {
            return Err(UnsupportedParameterTypeError {
                name: name.to_string(),
                kind: value.kind().to_string(),
            }
            .into());
        }
    };

    Ok(QueryParameter {
        name: name.to_string(),
        parameter_type: QueryParameterType {
            type_name: type_name.to_string(),
        },
        parameter_value: QueryParameterValue { value: rendered },
    })
}
