//! High-level send facade.

use crate::client::Client;
use crate::types::Message;
use crate::Result;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Routes any [Message] to its send operation and tags the call with a
/// correlation id in the logs. Persistence and de-duplication are left to
/// the caller; see [idempotency_from_payload].
#[derive(Clone)]
pub struct MessagingService {
    client: Arc<Client>,
}

impl MessagingService {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Send `message` and return `(status, body)`.
    ///
    /// `idempotency_key` is only recorded in the log line; the gateway has no
    /// idempotency header.
    pub async fn send(
        &self,
        message: impl Into<Message>,
        idempotency_key: Option<&str>,
    ) -> Result<(u16, String)> {
        let message = message.into();
        let correlation_id = correlation_id();
        info!(
            correlation_id = %correlation_id,
            kind = message.kind(),
            number = message.number().unwrap_or("-"),
            idempotency_key = idempotency_key.unwrap_or("-"),
            "sending message"
        );
        let resp = self.client.send_message(&message, None).await?;
        Ok((resp.status, resp.body))
    }
}

fn correlation_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(16);
    id
}

/// Deterministic key for a payload: SHA-256 hex of `prefix|<json>`.
/// `serde_json` maps are key-ordered, so field order does not matter.
pub fn idempotency_from_payload(prefix: &str, payload: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(b"|");
    hasher.update(payload.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::retry::tests::ScriptedTransport;
    use crate::types::{PollMessage, TextMessage};
    use serde_json::json;

    fn service(transport: Arc<ScriptedTransport>) -> MessagingService {
        let config = ClientConfig::new("https://api.example.com", "default", "key");
        let client = Client::with_transport(config, transport).unwrap();
        MessagingService::new(Arc::new(client))
    }

    #[tokio::test]
    async fn routes_by_message_kind() {
        let transport = Arc::new(ScriptedTransport::statuses(&[201, 200]));
        let svc = service(Arc::clone(&transport));

        let (status, _) = svc.send(TextMessage::new("5511999999999", "hi"), Some("k1")).await.unwrap();
        assert_eq!(status, 201);
        let poll = PollMessage::new("5511999999999", "Lunch?", vec!["yes".into(), "no".into()]);
        let (status, body) = svc.send(poll, None).await.unwrap();
        assert_eq!(status, 200);
        assert_eq!(body, "{}");

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].url, "https://api.example.com/message/sendText/default");
        assert_eq!(seen[1].url, "https://api.example.com/message/sendPoll/default");
    }

    #[tokio::test]
    async fn non_retryable_status_is_returned() {
        let transport = Arc::new(ScriptedTransport::statuses(&[400]));
        let svc = service(Arc::clone(&transport));
        let (status, _) = svc.send(TextMessage::new("5511999999999", "hi"), None).await.unwrap();
        assert_eq!(status, 400);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn invalid_message_is_not_sent() {
        let transport = Arc::new(ScriptedTransport::statuses(&[]));
        let svc = service(Arc::clone(&transport));
        let err = svc.send(TextMessage::new("12", "hi"), None).await.unwrap_err();
        assert!(matches!(err, crate::Error::InvalidMessage(_)));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn correlation_ids_are_short_hex() {
        let id = correlation_id();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, correlation_id());
    }

    #[test]
    fn idempotency_key_ignores_key_order() {
        let a = idempotency_from_payload("send", &json!({"number": "1", "text": "hi", "opts": {"b": 1, "a": 2}}));
        let b = idempotency_from_payload("send", &json!({"opts": {"a": 2, "b": 1}, "text": "hi", "number": "1"}));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, idempotency_from_payload("other", &json!({"number": "1", "text": "hi", "opts": {"b": 1, "a": 2}})));
    }

    #[test]
    fn idempotency_key_hashes_compact_sorted_json() {
        // sha256 of `send|{"a":[1,{"x":1,"y":2}],"b":"z"}`
        assert_eq!(
            idempotency_from_payload("send", &json!({"b": "z", "a": [1, {"y": 2, "x": 1}]})),
            "3e20d0cfa89bc2fcfcd78fac4548269a9a36c75ae8bc14b6ea23398acf351f8f"
        );
    }
}
