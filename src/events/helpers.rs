//! Small helpers for bots consuming raw webhook payloads.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Coarse category of an inbound payload: `button_response`, `poll_update`
/// or `message`. The payload's `type` wins over `event`.
pub fn normalize_event_type(event: Option<&str>, payload: &Value) -> &'static str {
    let kind = payload
        .get("type")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .or(event)
        .unwrap_or("message");
    match kind {
        "button_response" => "button_response",
        "poll_update" | "poll_vote" | "poll" => "poll_update",
        _ => "message",
    }
}

/// Sender number: `from`, else the user part of a `...@c.us` `remoteJid`.
/// Empty when neither is present.
pub fn extract_from_number(payload: &Value) -> String {
    if let Some(from) = payload.get("from").and_then(Value::as_str).filter(|f| !f.is_empty()) {
        return from.to_owned();
    }
    match payload.get("remoteJid").and_then(Value::as_str) {
        Some(jid) if jid.contains("@c.us") => jid.split('@').next().unwrap_or_default().to_owned(),
        _ => String::new(),
    }
}

/// Stable key for de-duplicating redeliveries: `id`, else `key.id`, else the
/// SHA-256 hex digest of the raw body.
pub fn dedupe_key(raw_body: &[u8], payload: &Value) -> String {
    let non_empty = |v: Option<&Value>| v.and_then(Value::as_str).filter(|s| !s.is_empty()).map(str::to_owned);
    non_empty(payload.get("id"))
        .or_else(|| non_empty(payload.get("key").and_then(|k| k.get("id"))))
        .unwrap_or_else(|| hex::encode(Sha256::digest(raw_body)))
}
