//! Error types for the BigQuery integration.
//!
//! Every failure the client can surface maps onto one variant of [`BigQueryError`].
//! Callers that need to branch (for example on a 404 from an existence check) match
//! on the variant or use the helpers on [`BigQueryError`].

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Result type for BigQuery operations.
pub type BigQueryResult<T> = Result<T, BigQueryError>;

/// Top-level error type for the BigQuery integration.
#[derive(Debug, Error)]
pub enum BigQueryError {
    /// Configuration or credential bundle problem.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The private key could not be imported or the assertion could not be signed.
    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    /// The token endpoint rejected the assertion.
    #[error("Authentication error: {0}")]
    Authentication(#[from] AuthenticationError),

    /// The HTTP exchange itself failed.
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// A successful response carried a body that is not valid JSON for the expected type.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Structured error returned by the BigQuery API.
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// Non-success response whose body is not a BigQuery error document.
    #[error("Request failed: {0}")]
    RequestFailed(#[from] RequestFailedError),

    /// One or more rows of an `insertAll` call were rejected.
    #[error("Insert error: {0}")]
    InsertPartialFailure(#[from] InsertPartialFailureError),

    /// A query parameter value has no BigQuery scalar type.
    #[error("Query parameter error: {0}")]
    UnsupportedParameterType(#[from] UnsupportedParameterTypeError),

    /// An attempt exceeded its configured duration.
    #[error("Timeout: {0}")]
    Timeout(#[from] TimeoutError),
}

impl BigQueryError {
    /// Creates a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        BigQueryError::Configuration(ConfigurationError::InvalidConfiguration(msg.into()))
    }

    /// Creates a timeout error with the given message.
    pub fn timeout(msg: impl Into<String>) -> Self {
        BigQueryError::Timeout(TimeoutError::new(msg))
    }

    /// Returns the HTTP status code of a remote failure, if there is one.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            BigQueryError::Service(e) => StatusCode::from_u16(e.code).ok(),
            BigQueryError::RequestFailed(e) => Some(e.status),
            BigQueryError::Authentication(AuthenticationError::TokenRejected { status, .. }) => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// True only for a structured service error with code 404.
    ///
    /// Existence checks rely on this: a 404 without a BigQuery error body is not
    /// treated as "does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(self, BigQueryError::Service(e) if e.code == 404)
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Missing credentials.
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// Invalid credentials.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Failure to import the private key or to sign an assertion.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SigningError {
    /// Description of the failed step.
    pub message: String,
    /// Underlying JWT library error.
    #[source]
    pub source: jsonwebtoken::errors::Error,
}

/// Token endpoint failures.
#[derive(Debug, Error)]
pub enum AuthenticationError {
    /// The token endpoint answered with a non-success status.
    #[error("token request rejected ({status}): {description}")]
    TokenRejected {
        /// HTTP status returned by the token endpoint.
        status: StatusCode,
        /// The endpoint's `error_description`, or the raw body when absent.
        description: String,
    },
}

/// Transport failure with its cause.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct NetworkError {
    /// Description of the failed request.
    pub message: String,
    /// Underlying transport error.
    #[source]
    pub source: TransportError,
}

/// A body that could not be parsed as JSON of the expected shape.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ParseError {
    /// Description of what was being parsed.
    pub message: String,
    /// Underlying JSON error.
    #[source]
    pub source: serde_json::Error,
}

/// One entry of a BigQuery error document's `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ServiceErrorItem {
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Error domain, usually `global`.
    #[serde(default)]
    pub domain: String,
    /// Machine-readable reason such as `notFound` or `invalid`.
    #[serde(default)]
    pub reason: String,
}

/// Structured BigQuery API error (`{"error": {...}}`).
#[derive(Debug, Clone, Error)]
#[error("{message} (code {code}, status {status})")]
pub struct ServiceError {
    /// HTTP code reported in the error document.
    pub code: u16,
    /// Top-level error message.
    pub message: String,
    /// Canonical status tag such as `NOT_FOUND`.
    pub status: String,
    /// Detailed sub-errors.
    pub errors: Vec<ServiceErrorItem>,
}

/// Non-success response without a recognizable error document.
#[derive(Debug, Clone, Error)]
#[error("HTTP {status}")]
pub struct RequestFailedError {
    /// HTTP status.
    pub status: StatusCode,
    /// Raw response body.
    pub body: String,
}

/// Detail of a single rejected row.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertErrorDetail {
    /// Reason code.
    #[serde(default)]
    pub reason: String,
    /// Field location, when reported.
    #[serde(default)]
    pub location: String,
    /// Debug information (not for end users).
    #[serde(default)]
    pub debug_info: String,
    /// Error message.
    #[serde(default)]
    pub message: String,
}

/// All errors reported for one row of an insert.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RowInsertErrors {
    /// Zero-based index of the row in the request.
    pub index: u64,
    /// Errors for that row.
    #[serde(default)]
    pub errors: Vec<InsertErrorDetail>,
}

/// Row-level rejection of an `insertAll` call.
#[derive(Debug, Clone, Error)]
#[error("Failed to insert into table {dataset_id}.{table_id} ({} rows rejected)", .errors.len())]
pub struct InsertPartialFailureError {
    /// Target dataset.
    pub dataset_id: String,
    /// Target table.
    pub table_id: String,
    /// Per-row errors exactly as returned by the API.
    pub errors: Vec<RowInsertErrors>,
}

/// Query parameter of a kind BigQuery cannot type.
#[derive(Debug, Clone, Error)]
#[error("Unsupported value type for parameter '{name}': {kind}")]
pub struct UnsupportedParameterTypeError {
    /// Parameter name.
    pub name: String,
    /// Kind of the offending value (`null`, `array`, `object`).
    pub kind: String,
}

/// Attempt exceeded its configured duration.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TimeoutError {
    /// Error message.
    pub message: String,
    /// The limit that was exceeded, when known.
    pub limit: Option<Duration>,
}

impl TimeoutError {
    /// Creates a timeout error without a recorded limit.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            limit: None,
        }
    }

    /// Creates the default error used when a retry attempt times out.
    pub fn execution(limit: Duration) -> Self {
        Self {
            message: format!("Execution timeout after {:?}", limit),
            limit: Some(limit),
        }
    }
}

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection-level failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Timeout error.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Any other HTTP client failure.
    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Network(err.to_string())
        } else {
            TransportError::Http(err.to_string())
        }
    }
}
