//! Async client.

mod manage;

use crate::api::Endpoints;
use crate::config::ClientConfig;
use crate::error::Error;
use crate::retry::{execute_with_retry, RetryPolicy};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
use crate::types::{
    AudioMessage, ButtonsMessage, ListMessage, LocationMessage, MediaMessage, Message,
    PollMessage, ReactionMessage, ReplyMessage, StickerMessage, TextMessage,
};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Client for the Evolution messaging gateway.
///
/// Every call goes through the retry policy (see [crate::retry]). Operations
/// that act on an instance take an optional override and otherwise use
/// [ClientConfig::instance].
pub struct Client {
    config: ClientConfig,
    endpoints: Endpoints,
    policy: RetryPolicy,
    /// Cleared by [Client::close]; calls after that fail with [Error::Closed].
    transport: Arc<RwLock<Option<Arc<dyn Transport>>>>,
}

impl Client {
    /// Create a client with a reqwest-backed transport. Fails fast on bad config.
    pub fn new(config: ClientConfig) -> crate::Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over a custom transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self {
            endpoints: Endpoints::from_config(&config),
            policy: config.retry_policy(),
            config,
            transport: Arc::new(RwLock::new(Some(transport))),
        })
    }

    /// Replace the retry policy derived from the config.
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

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run any request through the retrying transport.
    pub async fn execute(&self, request: &ApiRequest) -> crate::Result<ApiResponse> {
        let transport = self
            .transport
            .read()
            .await
            .as_ref()
            .map(Arc::clone)
            .ok_or(Error::Closed)?;
        execute_with_retry(transport.as_ref(), &self.policy, request).await
    }

    /// Release the transport. Idempotent.
    pub async fn close(&self) -> crate::Result<()> {
        let transport = self.transport.write().await.take();
        if let Some(t) = transport {
            t.close().await?;
        }
        Ok(())
    }

    pub async fn is_closed(&self) -> bool {
        self.transport.read().await.is_none()
    }

    /// Validate and send any message kind.
    pub async fn send_message(
        &self,
        message: &Message,
        instance: Option<&str>,
    ) -> crate::Result<ApiResponse> {
        message.validate()?;
        self.execute(&self.endpoints.message(message, instance)).await
    }

    pub async fn send_text(&self, msg: TextMessage) -> crate::Result<ApiResponse> {
        self.send_message(&msg.into(), None).await
    }

    pub async fn send_buttons(&self, msg: ButtonsMessage) -> crate::Result<ApiResponse> {
        self.send_message(&msg.into(), None).await
    }

    pub async fn send_poll(&self, msg: PollMessage) -> crate::Result<ApiResponse> {
        self.send_message(&msg.into(), None).await
    }

    /// Without an explicit `media_type` the type is sniffed from the URL extension.
    pub async fn send_media(&self, msg: MediaMessage) -> crate::Result<ApiResponse> {
        self.send_message(&msg.into(), None).await
    }

    pub async fn send_audio(&self, msg: AudioMessage) -> crate::Result<ApiResponse> {
        self.send_message(&msg.into(), None).await
    }

    pub async fn send_sticker(&self, msg: StickerMessage) -> crate::Result<ApiResponse> {
        self.send_message(&msg.into(), None).await
    }

    pub async fn send_location(&self, msg: LocationMessage) -> crate::Result<ApiResponse> {
        self.send_message(&msg.into(), None).await
    }

    pub async fn send_list(&self, msg: ListMessage) -> crate::Result<ApiResponse> {
        self.send_message(&msg.into(), None).await
    }

    pub async fn send_reaction(&self, msg: ReactionMessage) -> crate::Result<ApiResponse> {
        self.send_message(&msg.into(), None).await
    }

    pub async fn reply_message(&self, msg: ReplyMessage) -> crate::Result<ApiResponse> {
        self.send_message(&msg.into(), None).await
    }
}
