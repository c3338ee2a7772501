//! Transport abstraction for outbound API calls.
//!
//! Implement [Transport] to plug in a different HTTP stack or a test double.
//! One attempt per call; retries are layered on top by [crate::retry].

use crate::config::ClientConfig;
use crate::error::{ConfigError, TransportError};
use crate::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Header carrying the gateway API key.
pub const API_KEY_HEADER: &str = "apikey";

/// A fully resolved API call.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, url).with_body(body)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }
}

/// Status and body of a completed call, whatever the status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 200 or 201. Callers decide what success means for other 2xx codes.
    pub fn is_success(&self) -> bool {
        matches!(self.status, 200 | 201)
    }

    /// Decode the body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Async trait for issuing one HTTP request.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` once. Any HTTP status is a successful call.
    async fn execute(
        &self,
        request: &ApiRequest,
    ) -> std::result::Result<ApiResponse, TransportError>;

    /// Release underlying resources.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Default headers for every request: api key, JSON content type, extras.
pub(crate) fn default_headers(config: &ClientConfig) -> std::result::Result<HeaderMap, ConfigError> {
    let invalid = |name: &str, reason: String| ConfigError::InvalidHeader {
        name: name.to_string(),
        reason,
    };
    let mut headers = HeaderMap::new();
    headers.insert(
        API_KEY_HEADER,
        HeaderValue::from_str(&config.api_key)
            .map_err(|e| invalid(API_KEY_HEADER, e.to_string()))?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    for (name, value) in &config.headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(name, e.to_string()))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|e| invalid(name, e.to_string()))?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

/// [Transport] over a shared `reqwest::Client` (one connection pool per SDK client).
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> std::result::Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .default_headers(default_headers(config)?)
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        request: &ApiRequest,
    ) -> std::result::Result<ApiResponse, TransportError> {
        let mut builder = self.client.request(request.method.clone(), &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let resp = builder.send().await.map_err(TransportError::from_reqwest)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(TransportError::from_reqwest)?;
        Ok(ApiResponse { status, body })
    }
}
