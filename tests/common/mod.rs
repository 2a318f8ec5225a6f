//! Shared helpers for the WireMock integration tests.
//!
//! Every test starts its own mock server that plays both the token endpoint and the
//! BigQuery REST API.

#![allow(dead_code)]

use integrations_bigquery::auth::TokenIssuer;
use integrations_bigquery::credentials::Credentials;
use integrations_bigquery::transport::{HttpTransport, ReqwestTransport};
use integrations_bigquery::BigQueryClient;
use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const PRIVATE_KEY: &str = include_str!("../fixtures/service_account_key.pem");
pub const PUBLIC_KEY: &str = include_str!("../fixtures/service_account_pub.pem");

pub const PROJECT_ID: &str = "analytics-test";
pub const CLIENT_EMAIL: &str = "loader@analytics-test.iam.gserviceaccount.com";
pub const KEY_ID: &str = "3f1c0de9a8";
pub const TOKEN_PATH: &str = "/token";
pub const ACCESS_TOKEN: &str = "ya29.test-token";

/// Claims carried by the signed assertion.
#[derive(Debug, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub scope: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn token_uri(server: &MockServer) -> String {
    format!("{}{}", server.uri(), TOKEN_PATH)
}

/// Credential bundle whose token endpoint is the mock server.
pub fn credentials_with(server: &MockServer, private_key: &str, key_id: &str) -> Credentials {
    let bundle = json!({
        "type": "service_account",
        "project_id": PROJECT_ID,
        "private_key_id": key_id,
        "private_key": private_key,
        "client_email": CLIENT_EMAIL,
        "client_id": "118234567890",
        "auth_uri": "https://accounts.google.com/o/oauth2/auth",
        "token_uri": token_uri(server),
        "universe_domain": "googleapis.com"
    });
    Credentials::from_json(&bundle.to_string()).unwrap()
}

pub fn credentials(server: &MockServer) -> Credentials {
    credentials_with(server, PRIVATE_KEY, KEY_ID)
}

pub fn issuer(credentials: Credentials) -> TokenIssuer {
    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(reqwest::Client::new()));
    TokenIssuer::new(Arc::new(credentials), transport)
}

/// Client whose REST base URL is the mock server.
pub fn client(server: &MockServer) -> BigQueryClient {
    BigQueryClient::builder()
        .credentials(credentials(server))
        .base_url(format!("{}/bigquery/v2", server.uri()))
        .build()
        .unwrap()
}

/// Project-scoped REST path as seen by the mock server.
pub fn api_path(relative: &str) -> String {
    format!("/bigquery/v2/projects/{}/{}", PROJECT_ID, relative)
}

pub fn token_response(access_token: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": access_token,
        "expires_in": 3599,
        "token_type": "Bearer"
    }))
}

/// Mounts a token endpoint that accepts any assertion.
pub async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response(ACCESS_TOKEN))
        .mount(server)
        .await;
}

/// Structured BigQuery error body.
pub fn service_error(code: u16, status: &str, reason: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(code).set_body_json(json!({
        "error": {
            "code": code,
            "message": message,
            "status": status,
            "errors": [{"message": message, "domain": "global", "reason": reason}]
        }
    }))
}

pub fn not_found(message: &str) -> ResponseTemplate {
    service_error(404, "NOT_FOUND", "notFound", message)
}

/// Decodes the form body of a token request.
pub fn form(request: &Request) -> HashMap<String, String> {
    serde_urlencoded::from_bytes(&request.body).unwrap()
}

/// Verifies an assertion against the fixture public key.
pub fn decode_assertion(assertion: &str, audience: &str) -> TokenData<AssertionClaims> {
    let key = DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap();
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[audience]);
    validation.set_issuer(&[CLIENT_EMAIL]);
    decode::<AssertionClaims>(assertion, &key, &validation).unwrap()
}

/// Requests the mock server received on `request_path`.
pub async fn requests_to(server: &MockServer, request_path: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == request_path)
        .collect()
}
