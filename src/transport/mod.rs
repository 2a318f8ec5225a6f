//! HTTP transport layer shared by the token issuer and the REST executor.

use crate::errors::TransportError;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header::HeaderMap, Client, Method, StatusCode};
use std::time::Duration;
use url::Url;

/// HTTP transport abstraction for testability.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send an HTTP request and receive the fully buffered response.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// HTTP request representation.
#[derive(Debug)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Request URL.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Option<Bytes>,
    /// Request timeout.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Creates a request without headers, body or timeout.
    pub fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
        }
    }
}

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET method.
    Get,
    /// POST method.
    Post,
    /// PATCH method.
    Patch,
}

impl HttpMethod {
    /// Upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Patch => Method::PATCH,
        }
    }
}

/// HTTP response representation.
#[derive(Debug)]
pub struct HttpResponse {
    /// Response status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Creates a new HTTP response.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Reqwest-based HTTP transport implementation.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a new reqwest transport.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a transport whose client applies the given connect timeout and user agent.
    pub fn with_settings(
        connect_timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportError::Http(format!("Failed to create client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method: Method = request.method.into();
        let mut req = self.client.request(method, request.url);

        for (key, value) in request.headers.iter() {
            req = req.header(key, value);
        }

        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        if let Some(body) = request.body {
            req = req.body(body);
        }

        let response = req.send().await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(HttpResponse::new(status, headers, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_method_conversion() {
        assert_eq!(Method::from(HttpMethod::Get), Method::GET);
        assert_eq!(Method::from(HttpMethod::Post), Method::POST);
        assert_eq!(Method::from(HttpMethod::Patch), Method::PATCH);
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
    }

    #[test]
    fn test_response_text_is_lossy() {
        let response = HttpResponse::new(
            StatusCode::OK,
            HeaderMap::new(),
            Bytes::from_static(b"ok\xff"),
        );
        assert_eq!(response.text(), "ok\u{fffd}");
    }
}
