//! Service account credential bundles and the strategies that resolve them.
//!
//! The client only ever sees a [`Credentials`] value. Where it comes from is decided
//! by a [`CredentialsSource`]: a JSON key file, a base64-encoded blob, or the process
//! environment.

use crate::errors::{BigQueryError, BigQueryResult, ConfigurationError};
use async_trait::async_trait;
use base64::Engine;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable holding a base64-encoded credential bundle.
pub const ENCODED_CREDENTIALS_ENV: &str = "ADC_ENCODED";

/// Environment variable holding the path of a credential bundle file.
pub const CREDENTIALS_PATH_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Service account key bundle as downloaded from the cloud console.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    /// Account type, normally `service_account`.
    #[serde(rename = "type", default)]
    pub account_type: String,
    /// Project that scopes every REST call.
    pub project_id: String,
    /// Key id placed in the assertion header.
    #[serde(default)]
    pub private_key_id: String,
    /// PKCS#8 PEM private key.
    pub private_key: SecretString,
    /// Service account email (issuer and subject of the assertion).
    pub client_email: String,
    /// Numeric client id.
    #[serde(default)]
    pub client_id: String,
    /// Authorization endpoint.
    #[serde(default)]
    pub auth_uri: String,
    /// Token endpoint the assertion is exchanged at.
    pub token_uri: String,
    /// Provider certificate URL.
    #[serde(default)]
    pub auth_provider_x509_cert_url: String,
    /// Client certificate URL.
    #[serde(default)]
    pub client_x509_cert_url: String,
    /// Universe domain, `googleapis.com` for the public cloud.
    #[serde(default)]
    pub universe_domain: String,
}

impl Credentials {
    /// Parses a JSON credential bundle.
    pub fn from_json(json: &str) -> BigQueryResult<Self> {
        let credentials: Credentials = serde_json::from_str(json).map_err(|e| {
            ConfigurationError::InvalidCredentials(format!("malformed credential bundle: {}", e))
        })?;
        credentials.validate()?;
        Ok(credentials)
    }

    /// Decodes a standard base64 blob holding a JSON credential bundle.
    pub fn from_base64(value: &str) -> BigQueryResult<Self> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(value.trim())
            .map_err(|e| {
                ConfigurationError::InvalidCredentials(format!("invalid base64 encoding: {}", e))
            })?;
        let json = String::from_utf8(bytes).map_err(|e| {
            ConfigurationError::InvalidCredentials(format!("credential bundle is not UTF-8: {}", e))
        })?;
        Self::from_json(&json)
    }

    /// Checks the fields the token flow and the REST paths depend on.
    pub fn validate(&self) -> BigQueryResult<()> {
        use secrecy::ExposeSecret;

        let missing = [
            ("project_id", self.project_id.is_empty()),
            ("client_email", self.client_email.is_empty()),
            ("token_uri", self.token_uri.is_empty()),
            ("private_key", self.private_key.expose_secret().is_empty()),
        ]
        .into_iter()
        .find(|(_, empty)| *empty);

        match missing {
            Some((field, _)) => Err(ConfigurationError::InvalidCredentials(format!(
                "credential bundle has an empty '{}'",
                field
            ))
            .into()),
            None => Ok(()),
        }
    }
}

/// Strategy producing a [`Credentials`] value before the client is built.
#[async_trait]
pub trait CredentialsSource: Send + Sync {
    /// Resolves the credential bundle.
    async fn resolve(&self) -> BigQueryResult<Credentials>;
}

/// Reads a JSON credential bundle from a file.
#[derive(Debug, Clone)]
pub struct CredentialsFile {
    path: PathBuf,
}

impl CredentialsFile {
    /// Creates a source for the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialsSource for CredentialsFile {
    async fn resolve(&self) -> BigQueryResult<Credentials> {
        let json = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ConfigurationError::MissingCredentials(format!(
                "unable to read {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Credentials::from_json(&json)
    }
}

/// Decodes a base64-encoded credential bundle held in memory.
#[derive(Clone)]
pub struct EncodedCredentials {
    value: SecretString,
}

impl EncodedCredentials {
    /// Creates a source for an encoded bundle.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: SecretString::new(value.into()),
        }
    }
}

#[async_trait]
impl CredentialsSource for EncodedCredentials {
    async fn resolve(&self) -> BigQueryResult<Credentials> {
        use secrecy::ExposeSecret;
        Credentials::from_base64(self.value.expose_secret())
    }
}

/// Resolves credentials from the process environment.
///
/// `ADC_ENCODED` wins over `GOOGLE_APPLICATION_CREDENTIALS`.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentCredentials;

impl EnvironmentCredentials {
    /// Creates the environment source.
    pub fn new() -> Self {
        Self
    }

    fn non_empty_var(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }
}

#[async_trait]
impl CredentialsSource for EnvironmentCredentials {
    async fn resolve(&self) -> BigQueryResult<Credentials> {
        if let Some(encoded) = Self::non_empty_var(ENCODED_CREDENTIALS_ENV) {
            tracing::debug!("Resolving credentials from {}", ENCODED_CREDENTIALS_ENV);
            return EncodedCredentials::new(encoded).resolve().await;
        }

        if let Some(path) = Self::non_empty_var(CREDENTIALS_PATH_ENV) {
            tracing::debug!("Resolving credentials from file {}", path);
            return CredentialsFile::new(path).resolve().await;
        }

        Err(BigQueryError::Configuration(
            ConfigurationError::MissingCredentials(format!(
                "credentials must be specified via {} or {}",
                ENCODED_CREDENTIALS_ENV, CREDENTIALS_PATH_ENV
            )),
        ))
    }
}
