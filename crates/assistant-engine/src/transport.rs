//! HTTP transport used by the API client.
//!
//! The client only speaks to the service through [`Transport`], so tests can
//! substitute scripted responses and callers can wrap their own HTTP stack.
//! [`ReqwestTransport`] is the production implementation.

use std::future::Future;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;

use crate::error::{Error, Result};

/// Secondary credential attached to endpoints that run model inference.
pub const LLM_KEY_HEADER: &str = "x-llm-key";

/// Base URL and credentials a transport is built from.
#[derive(Clone, PartialEq, Eq)]
pub struct TransportConfig {
    base_url: String,
    api_token: String,
    basic_auth: Option<String>,
    timeout: Option<Duration>,
}

impl TransportConfig {
    pub fn new(api_url: &str, api_token: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(api_url),
            api_token: api_token.into(),
            basic_auth: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_basic_auth(mut self, basic_auth: Option<String>) -> Self {
        self.basic_auth = basic_auth;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn set_api_token(&mut self, api_token: impl Into<String>) {
        self.api_token = api_token.into();
    }

    pub fn set_basic_auth(&mut self, basic_auth: Option<String>) {
        self.basic_auth = basic_auth;
    }

    /// Base URL, always ending in a single `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Value of the `Authorization` header.
    ///
    /// With basic auth configured both schemes are sent comma-joined:
    /// `Basic <credentials>, Bearer <token>`.
    pub fn authorization_header(&self) -> String {
        match self.basic_auth.as_deref() {
            Some(basic) if !basic.is_empty() => {
                format!("Basic {basic}, Bearer {}", self.api_token)
            }
            _ => format!("Bearer {}", self.api_token),
        }
    }
}

impl std::fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &"<redacted>")
            .field("basic_auth", &self.basic_auth.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn normalize_base_url(api_url: &str) -> String {
    format!("{}/", api_url.trim_end_matches('/'))
}

/// A single request, with a path relative to the base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub json: Option<Value>,
    pub headers: Vec<(&'static str, String)>,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            json: None,
            headers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// First value of a per-request header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw status and body as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Capability to send HTTP requests to the service.
///
/// Implementations return any status code as a response; only failures to
/// obtain a response at all are errors.
pub trait Transport: Send + Sync {
    /// Rebuild connection state for a new base URL or credentials.
    fn configure(&mut self, config: &TransportConfig) -> Result<()>;

    fn send(&self, request: HttpRequest) -> impl Future<Output = Result<HttpResponse>> + Send;
}

/// [`Transport`] backed by a `reqwest` client with default auth headers.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            base_url: config.base_url().to_string(),
        })
    }
}

impl Transport for ReqwestTransport {
    fn configure(&mut self, config: &TransportConfig) -> Result<()> {
        self.client = build_client(config)?;
        self.base_url = config.base_url().to_string();
        Ok(())
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.client.request(request.method, url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        if let Some(body) = &request.json {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

fn build_client(config: &TransportConfig) -> Result<reqwest::Client> {
    let mut authorization = HeaderValue::from_str(&config.authorization_header())
        .map_err(|e| Error::Config(format!("Invalid authorization header: {e}")))?;
    authorization.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, authorization);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let mut builder = reqwest::Client::builder().default_headers(headers);
    if let Some(timeout) = config.timeout() {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_single_trailing_slash() {
        assert_eq!(
            TransportConfig::new("https://api.example.com", "t").base_url(),
            "https://api.example.com/"
        );
        assert_eq!(
            TransportConfig::new("https://api.example.com/v1///", "t").base_url(),
            "https://api.example.com/v1/"
        );
    }

    #[test]
    fn authorization_is_bearer_only_by_default() {
        let config = TransportConfig::new("https://api.example.com", "secret");
        assert_eq!(config.authorization_header(), "Bearer secret");
    }

    #[test]
    fn authorization_prefixes_basic_auth() {
        let config = TransportConfig::new("https://api.example.com", "secret")
            .with_basic_auth(Some("dXNlcjpwYXNz".to_string()));
        assert_eq!(
            config.authorization_header(),
            "Basic dXNlcjpwYXNz, Bearer secret"
        );
    }

    #[test]
    fn empty_basic_auth_is_ignored() {
        let config = TransportConfig::new("https://api.example.com", "secret")
            .with_basic_auth(Some(String::new()));
        assert_eq!(config.authorization_header(), "Bearer secret");
    }

    #[test]
    fn debug_redacts_credentials() {
        let config = TransportConfig::new("https://api.example.com", "secret")
            .with_basic_auth(Some("creds".to_string()));
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret"));
        assert!(!rendered.contains("creds"));
        assert!(rendered.contains("https://api.example.com/"));
    }

    #[test]
    fn request_header_lookup_is_case_insensitive() {
        let request = HttpRequest::new(Method::GET, "conversations/1")
            .with_header(LLM_KEY_HEADER, "llm");
        assert_eq!(request.header("X-LLM-Key"), Some("llm"));
        assert_eq!(request.header("authorization"), None);
    }

    #[test]
    fn success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(302, "").is_success());
        assert!(!HttpResponse::new(404, "").is_success());
    }

    #[test]
    fn invalid_token_is_config_error() {
        let config = TransportConfig::new("https://api.example.com", "bad\ntoken");
        let err = ReqwestTransport::new(&config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
