//! Configuration for the BigQuery client.

use crate::auth::scopes;
use crate::credentials::Credentials;
use crate::errors::{BigQueryError, BigQueryResult, ConfigurationError};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default REST base URL. Project paths are joined onto it.
pub const DEFAULT_BASE_URL: &str = "https://bigquery.googleapis.com/bigquery/v2/";

/// Configuration for the BigQuery client.
#[derive(Clone, Debug)]
pub struct BigQueryConfig {
    /// Service account credentials.
    pub credentials: Arc<Credentials>,

    /// Base URL for the API (always ends with `/`).
    pub base_url: Url,

    /// Scopes requested for every REST call.
    pub scopes: Vec<String>,

    /// HTTP timeout per request.
    pub timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl BigQueryConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> BigQueryConfigBuilder {
        BigQueryConfigBuilder::new()
    }

    /// Project every request is scoped to.
    pub fn project_id(&self) -> &str {
        &self.credentials.project_id
    }

    /// Validates the configuration.
    pub fn validate(&self) -> BigQueryResult<()> {
        self.credentials.validate()?;

        if self.scopes.is_empty() {
            return Err(BigQueryError::configuration(
                "At least one scope is required",
            ));
        }

        match self.base_url.scheme() {
            "https" => {}
            "http" if is_loopback(&self.base_url) => {}
            _ => {
                return Err(BigQueryError::configuration(
                    "Base URL must use HTTPS",
                ));
            }
        }

        Ok(())
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host_str() {
        Some("localhost") => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false),
        None => false,
    }
}

/// Builder for BigQueryConfig.
pub struct BigQueryConfigBuilder {
    credentials: Option<Arc<Credentials>>,
    base_url: Option<String>,
    scopes: Vec<String>,
    timeout: Duration,
    connect_timeout: Duration,
    user_agent: Option<String>,
}

impl BigQueryConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            credentials: None,
            base_url: None,
            scopes: vec![scopes::BIGQUERY.to_string()],
            timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(30),
            user_agent: None,
        }
    }

    /// Sets the credentials.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(Arc::new(credentials));
        self
    }

    /// Sets shared credentials.
    pub fn credentials_arc(mut self, credentials: Arc<Credentials>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Replaces the requested scopes.
    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the user agent string.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> BigQueryResult<BigQueryConfig> {
        let credentials = self.credentials.ok_or_else(|| {
            BigQueryError::Configuration(ConfigurationError::MissingCredentials(
                "Credentials are required".to_string(),
            ))
        })?;

        let mut raw_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !raw_url.ends_with('/') {
            raw_url.push('/');
        }
        let base_url = Url::parse(&raw_url).map_err(|e| {
            BigQueryError::configuration(format!("Invalid base URL '{}': {}", raw_url, e))
        })?;

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("integrations-bigquery/{}", env!("CARGO_PKG_VERSION")));

        let config = BigQueryConfig {
            credentials,
            base_url,
            scopes: self.scopes,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            user_agent,
        };

        config.validate()?;

        Ok(config)
    }
}

impl Default for BigQueryConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
