//! Request executor with auth and error classification.

use crate::auth::TokenCache;
use crate::config::BigQueryConfig;
use crate::errors::{
    BigQueryError, BigQueryResult, ConfigurationError, NetworkError, ParseError,
    RequestFailedError, ServiceError, ServiceErrorItem,
};
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use bytes::Bytes;
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    code: Option<u16>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    errors: Vec<ServiceErrorItem>,
}

/// Executes authenticated JSON requests against the project's REST resources.
///
/// This is the core component that:
/// - Obtains a bearer token for the configured scopes
/// - Executes requests through the HTTP transport
/// - Maps non-success responses to [`ServiceError`] or [`RequestFailedError`]
///
/// No call is retried here; retrying is opt-in at the call site.
pub struct RequestExecutor {
    config: BigQueryConfig,
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<TokenCache>,
}

impl RequestExecutor {
    /// Creates a new request executor.
    pub fn new(
        config: BigQueryConfig,
        transport: Arc<dyn HttpTransport>,
        tokens: Arc<TokenCache>,
    ) -> Self {
        Self {
            config,
            transport,
            tokens,
        }
    }

    /// The client configuration.
    pub fn config(&self) -> &BigQueryConfig {
        &self.config
    }

    /// The token cache used for every request.
    pub fn tokens(&self) -> &TokenCache {
        &self.tokens
    }

    /// Builds the URL of a project-relative path.
    ///
    /// `datasets/x` becomes `<base>/projects/<project>/datasets/x`.
    pub fn build_url(&self, path: &str) -> BigQueryResult<Url> {
        let relative = format!(
            "projects/{}/{}",
            self.config.project_id(),
            path.trim_start_matches('/')
        );

        self.config.base_url.join(&relative).map_err(|e| {
            BigQueryError::configuration(format!("Invalid request path '{}': {}", relative, e))
        })
    }

    /// Sends a GET request and parses the response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> BigQueryResult<T> {
        self.request::<T, ()>(HttpMethod::Get, path, None).await
    }

    /// Sends a POST request with a JSON body and parses the response.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> BigQueryResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(HttpMethod::Post, path, Some(body)).await
    }

    /// Sends a PATCH request with a JSON body and parses the response.
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> BigQueryResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(HttpMethod::Patch, path, Some(body)).await
    }

    /// Executes a request and parses the JSON response as `T`.
    ///
    /// The body is read in full before parsing, so a body that fails to parse surfaces
    /// as [`ParseError`] and never as a transport failure.
    pub async fn request<T, B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> BigQueryResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.build_url(path)?;

        let body = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| ParseError {
                message: "Failed to serialize request body".to_string(),
                source: e,
            })?;

        let token = self.tokens.get_token(&self.config.scopes, false).await?;
        let mut authorization = HeaderValue::from_str(&token.authorization_header())
            .map_err(|_| {
                ConfigurationError::InvalidCredentials(
                    "access token is not a valid header value".to_string(),
                )
            })?;
        authorization.set_sensitive(true);

        let mut request = HttpRequest::new(method, url);
        request.headers.insert(AUTHORIZATION, authorization);
        request
            .headers
            .insert(ACCEPT, HeaderValue::from_static("application/json"));
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        request.body = body.map(Bytes::from);
        request.timeout = Some(self.config.timeout);

        tracing::debug!(method = %method, path = %path, "Sending BigQuery request");

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| NetworkError {
                message: format!("Failed to perform request {} {}", method, path),
                source: e,
            })?;

        tracing::debug!(
            method = %method,
            path = %path,
            status = %response.status,
            "Received BigQuery response"
        );

        if !response.status.is_success() {
            return Err(classify_error(response));
        }

        serde_json::from_slice(&response.body).map_err(|e| {
            ParseError {
                message: format!("Failed to parse response of {} {}", method, path),
                source: e,
            }
            .into()
        })
    }
}

/// Maps a non-success response to a domain error.
///
/// A body of the form `{"error": {...}}` becomes a [`ServiceError`]; anything else,
/// including a non-JSON body, becomes a [`RequestFailedError`] carrying the raw text.
fn classify_error(response: HttpResponse) -> BigQueryError {
    let text = response.text();

    match serde_json::from_str::<ErrorResponse>(&text) {
        Ok(ErrorResponse { error }) => {
            let error = ServiceError {
                code: error.code.unwrap_or_else(|| response.status.as_u16()),
                message: error.message,
                status: error.status,
                errors: error.errors,
            };
            tracing::debug!(code = error.code, status = %error.status, "BigQuery service error");
            error.into()
        }
        Err(_) => RequestFailedError {
            status: response.status,
            body: text,
        }
        .into(),
    }
}
