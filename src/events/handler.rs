//! Dispatch router: parse a delivery, then run the callbacks registered for
//! its raw `event` string.

use super::parse::parse;
use super::signature::verify_signature;
use super::WebhookEvent;
use crate::error::WebhookError;
use crate::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, error, warn};

/// Error a callback may return. Logged, never propagated.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Subscriber for one event type.
pub type Callback = Arc<dyn Fn(&WebhookEvent) -> std::result::Result<(), CallbackError> + Send + Sync>;

/// Parses webhook deliveries and fans them out to registered callbacks.
///
/// Callbacks are selected by the raw payload's `event` string, even when the
/// payload degraded to [WebhookEvent::Raw]: a `messages.upsert` subscriber
/// must handle receiving the fallback.
#[derive(Default)]
pub struct WebhookHandler {
    secret: Option<String>,
    callbacks: RwLock<HashMap<String, Vec<Callback>>>,
}

impl WebhookHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a valid HMAC-SHA256 signature in [WebhookHandler::handle_body].
    /// An empty secret disables verification.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        Self {
            secret: (!secret.is_empty()).then_some(secret),
            callbacks: RwLock::default(),
        }
    }

    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref()
    }

    /// Append `callback` to the list for `event_type`. No de-duplication.
    pub fn register<F>(&self, event_type: impl Into<String>, callback: F)
    where
        F: Fn(&WebhookEvent) -> std::result::Result<(), CallbackError> + Send + Sync + 'static,
    {
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event_type.into())
            .or_default()
            .push(Arc::new(callback));
    }

    /// Drop every callback for `event_type`; returns how many were removed.
    pub fn remove(&self, event_type: &str) -> usize {
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(event_type)
            .map_or(0, |list| list.len())
    }

    pub fn callback_count(&self, event_type: &str) -> usize {
        self.callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .map_or(0, Vec::len)
    }

    /// Parse `payload` and dispatch it. Always returns the parsed event.
    pub fn handle(&self, payload: &Value) -> WebhookEvent {
        let event = parse(payload);
        match payload
            .get("event")
            .and_then(Value::as_str)
            .filter(|e| !e.is_empty())
        {
            Some(key) => self.dispatch(key, &event),
            None => warn!("received webhook without usable 'event' field"),
        }
        event
    }

    /// Verify the signature of a raw request body (when a secret is set),
    /// then decode and [handle](WebhookHandler::handle) it.
    ///
    /// A body that is not JSON is not an error: it yields a fallback event
    /// whose `raw_payload` is the body text.
    pub fn handle_body(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookEvent> {
        if let Some(secret) = self.secret.as_deref() {
            let signature = signature.ok_or(WebhookError::MissingSignature)?;
            if !verify_signature(body, signature, Some(secret)) {
                return Err(WebhookError::InvalidSignature.into());
            }
        }
        match serde_json::from_slice::<Value>(body) {
            Ok(payload) => Ok(self.handle(&payload)),
            Err(e) => {
                warn!(error = %e, "webhook body is not valid JSON");
                Ok(WebhookEvent::Raw(super::RawWebhookPayload {
                    raw_payload: Value::String(String::from_utf8_lossy(body).into_owned()),
                    event_type: None,
                    parse_error: format!("invalid JSON: {e}"),
                }))
            }
        }
    }

    fn dispatch(&self, key: &str, event: &WebhookEvent) {
        // Snapshot so callbacks can register without deadlocking.
        let callbacks: Vec<Callback> = self
            .callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .unwrap_or_default();
        debug!(event = key, callbacks = callbacks.len(), "dispatching webhook");
        for (index, callback) in callbacks.iter().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| callback(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(event = key, index, error = %e, "webhook callback failed"),
                Err(_) => error!(event = key, index, "webhook callback panicked"),
            }
        }
    }
}
