//! Signed-JWT-bearer token issuance.

use super::{AccessToken, JWT_LIFETIME_SECONDS};
use crate::credentials::Credentials;
use crate::errors::{
    AuthenticationError, BigQueryError, BigQueryResult, NetworkError, ParseError, SigningError,
};
use crate::transport::{HttpMethod, HttpRequest, HttpTransport};
use bytes::Bytes;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use once_cell::sync::OnceCell;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Grant type of the assertion exchange.
pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    sub: &'a str,
    aud: &'a str,
    scope: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error_description: Option<String>,
    error: Option<String>,
}

/// Turns a credential bundle into freshly issued access tokens.
///
/// The private key is imported on first use and kept for the issuer's lifetime.
/// `jsonwebtoken::EncodingKey` exposes no way to read the key material back.
pub struct TokenIssuer {
    credentials: Arc<Credentials>,
    transport: Arc<dyn HttpTransport>,
    timeout: Option<Duration>,
    key: OnceCell<EncodingKey>,
}

impl TokenIssuer {
    /// Creates an issuer for the given credentials.
    pub fn new(credentials: Arc<Credentials>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            credentials,
            transport,
            timeout: None,
            key: OnceCell::new(),
        }
    }

    /// Sets the HTTP timeout of the token exchange.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The credentials this issuer signs for.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns the signing key, importing it from PEM on first call.
    ///
    /// An import failure is not cached; it is returned to the caller as is.
    pub fn key(&self) -> Result<&EncodingKey, SigningError> {
        self.key.get_or_try_init(|| {
            tracing::debug!(
                client_email = %self.credentials.client_email,
                "Importing service account private key"
            );
            EncodingKey::from_rsa_pem(self.credentials.private_key.expose_secret().as_bytes())
                .map_err(|e| SigningError {
                    message: "Failed to import private key".to_string(),
                    source: e,
                })
        })
    }

    /// Builds the signed assertion for `scope`, issued at `issued_at`.
    pub fn sign_assertion(&self, scope: &str, issued_at: i64) -> BigQueryResult<SecretString> {
        let key = self.key()?;
        let credentials = &self.credentials;

        let claims = Claims {
            iss: &credentials.client_email,
            sub: &credentials.client_email,
            aud: &credentials.token_uri,
            scope,
            iat: issued_at,
            exp: issued_at + JWT_LIFETIME_SECONDS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.typ = Some("JWT".to_string());
        if !credentials.private_key_id.is_empty() {
            header.kid = Some(credentials.private_key_id.clone());
        }

        let jwt = encode(&header, &claims, key).map_err(|e| SigningError {
            message: "Failed to sign auth token payload".to_string(),
            source: e,
        })?;

        Ok(SecretString::new(jwt))
    }

    /// Issues a new access token for a space-separated scope string.
    pub async fn issue(&self, scope: &str) -> BigQueryResult<AccessToken> {
        let issued_at = Utc::now().timestamp();
        let assertion = self.sign_assertion(scope, issued_at)?;

        let url = Url::parse(&self.credentials.token_uri).map_err(|e| {
            BigQueryError::configuration(format!(
                "Invalid token URI '{}': {}",
                self.credentials.token_uri, e
            ))
        })?;

        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", JWT_BEARER_GRANT_TYPE)
            .append_pair("assertion", assertion.expose_secret())
            .finish();

        let mut request = HttpRequest::new(HttpMethod::Post, url);
        request.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        request
            .headers
            .insert(ACCEPT, HeaderValue::from_static("application/json"));
        request.body = Some(Bytes::from(body));
        request.timeout = self.timeout;

        tracing::debug!(scope = %scope, "Requesting access token");

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| NetworkError {
                message: "Failed to request access token".to_string(),
                source: e,
            })?;

        if !response.status.is_success() {
            let text = response.text();
            let description = serde_json::from_str::<TokenErrorResponse>(&text)
                .ok()
                .and_then(|r| r.error_description.or(r.error))
                .unwrap_or(text);

            tracing::warn!(status = %response.status, "Token endpoint rejected assertion");

            return Err(AuthenticationError::TokenRejected {
                status: response.status,
                description,
            }
            .into());
        }

        let token_response: TokenResponse =
            serde_json::from_slice(&response.body).map_err(|e| ParseError {
                message: "Failed to parse token response".to_string(),
                source: e,
            })?;

        tracing::debug!(
            expires_in = ?token_response.expires_in,
            "Access token issued"
        );

        // Some issuers pad the token with trailing dots.
        let token = token_response.access_token.trim_end_matches('.');

        Ok(AccessToken::new(
            token,
            token_response.token_type,
            issued_at + JWT_LIFETIME_SECONDS,
        ))
    }
}
