//! Blocking client with the same retry semantics as [Client](crate::Client).
//!
//! Do not use from inside an async runtime; `reqwest::blocking` spawns its own.

use crate::api::Endpoints;
use crate::config::ClientConfig;
use crate::error::{ConfigError, Error, TransportError};
use crate::retry::{RetryPolicy, Step};
use crate::transport::{default_headers, ApiRequest, ApiResponse};
use crate::types::Message;
use crate::Result;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// Blocking counterpart of [Transport](crate::Transport).
pub trait BlockingTransport: Send + Sync {
    fn execute(&self, request: &ApiRequest) -> std::result::Result<ApiResponse, TransportError>;
}

/// [BlockingTransport] over `reqwest::blocking::Client`.
#[derive(Clone, Debug)]
pub struct HttpBlockingTransport {
    client: reqwest::blocking::Client,
}

impl HttpBlockingTransport {
    pub fn new(config: &ClientConfig) -> std::result::Result<Self, ConfigError> {
        let client = reqwest::blocking::Client::builder()
            .default_headers(default_headers(config)?)
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self { client })
    }
}

impl BlockingTransport for HttpBlockingTransport {
    fn execute(&self, request: &ApiRequest) -> std::result::Result<ApiResponse, TransportError> {
        let mut builder = self.client.request(request.method.clone(), &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let resp = builder.send().map_err(TransportError::from_reqwest)?;
        let status = resp.status().as_u16();
        let body = resp.text().map_err(TransportError::from_reqwest)?;
        Ok(ApiResponse { status, body })
    }
}

/// Retry loop identical to the async one, with `std::thread::sleep` backoff.
pub fn execute_with_retry_blocking(
    transport: &dyn BlockingTransport,
    policy: &RetryPolicy,
    request: &ApiRequest,
) -> Result<ApiResponse> {
    let mut attempt = 1;
    loop {
        debug!(method = %request.method, url = %request.url, attempt, "sending request");
        let outcome = transport.execute(request);
        match policy.next_step(attempt, outcome) {
            Step::Return(result) => return result,
            Step::Retry { delay, failure } => {
                warn!(url = %request.url, attempt, %failure, ?delay, "transient failure; retrying");
                std::thread::sleep(delay);
            }
        }
        attempt += 1;
    }
}

/// Blocking gateway client. Management calls go through [BlockingClient::execute]
/// with a request built from [BlockingClient::endpoints].
pub struct BlockingClient {
    config: ClientConfig,
    endpoints: Endpoints,
    policy: RetryPolicy,
    transport: RwLock<Option<Arc<dyn BlockingTransport>>>,
}

impl BlockingClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpBlockingTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn BlockingTransport>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            endpoints: Endpoints::from_config(&config),
            policy: config.retry_policy(),
            config,
            transport: RwLock::new(Some(transport)),
        })
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn execute(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let transport = self
            .transport
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Arc::clone)
            .ok_or(Error::Closed)?;
        execute_with_retry_blocking(transport.as_ref(), &self.policy, request)
    }

    pub fn send_message(&self, message: &Message, instance: Option<&str>) -> Result<ApiResponse> {
        message.validate()?;
        self.execute(&self.endpoints.message(message, instance))
    }

    pub fn send(&self, message: impl Into<Message>) -> Result<ApiResponse> {
        self.send_message(&message.into(), None)
    }

    pub fn close(&self) {
        self.transport
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}
