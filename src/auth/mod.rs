//! Service account authentication for the BigQuery API.
//!
//! [`TokenIssuer`] signs a JWT assertion with the service account's private key and
//! exchanges it for an access token. [`TokenCache`] sits in front of it and hands out
//! cached tokens per scope set until they come within [`TOKEN_EXPIRY_SKEW_SECONDS`] of
//! expiry.
//!
//! # Example
//!
//! ```no_run
//! use integrations_bigquery::auth::{scopes, TokenCache, TokenIssuer};
//! use integrations_bigquery::credentials::Credentials;
//! use integrations_bigquery::transport::ReqwestTransport;
//! use std::sync::Arc;
//!
//! # async fn example(json: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Arc::new(Credentials::from_json(json)?);
//! let transport = Arc::new(ReqwestTransport::new(reqwest::Client::new()));
//! let cache = TokenCache::new(TokenIssuer::new(credentials, transport));
//!
//! let token = cache.get_token(&[scopes::BIGQUERY], false).await?;
//! println!("expires at {}", token.expires);
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

mod cache;
mod issuer;

pub use cache::{canonical_scope_key, TokenCache};
pub use issuer::{TokenIssuer, JWT_BEARER_GRANT_TYPE};

/// Safety margin subtracted from a token's expiry before it is considered unusable.
pub const TOKEN_EXPIRY_SKEW_SECONDS: i64 = 10;

/// Lifetime requested for every assertion (1 hour, the endpoint's ceiling).
pub const JWT_LIFETIME_SECONDS: i64 = 3600;

/// OAuth 2.0 scopes for BigQuery.
pub mod scopes {
    /// Full access to BigQuery.
    pub const BIGQUERY: &str = "https://www.googleapis.com/auth/bigquery";

    /// Insert-only access to table data.
    pub const BIGQUERY_INSERTDATA: &str = "https://www.googleapis.com/auth/bigquery.insertdata";

    /// Read-only access to BigQuery.
    pub const BIGQUERY_READONLY: &str = "https://www.googleapis.com/auth/bigquery.readonly";
}

/// Access token with metadata.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// The token string.
    pub token: SecretString,

    /// Token type reported by the endpoint (usually "Bearer").
    pub token_type: String,

    /// Absolute expiry in epoch seconds.
    pub expires: i64,
}

impl AccessToken {
    /// Creates a new access token.
    pub fn new(token: impl Into<String>, token_type: impl Into<String>, expires: i64) -> Self {
        Self {
            token: SecretString::new(token.into()),
            token_type: token_type.into(),
            expires,
        }
    }

    /// Expiry as a timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires, 0)
    }

    /// True while `now < expires - skew`.
    pub fn is_usable_at(&self, now: i64) -> bool {
        now < self.expires - TOKEN_EXPIRY_SKEW_SECONDS
    }

    /// Checks usability against the current clock.
    pub fn is_usable(&self) -> bool {
        self.is_usable_at(Utc::now().timestamp())
    }

    /// Returns the authorization header value.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }
}
