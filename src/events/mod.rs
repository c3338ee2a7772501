//! Webhook events: the closed set of known shapes plus two fallbacks.
//!
//! [parse] classifies any JSON value into exactly one [WebhookEvent];
//! [WebhookHandler] parses and dispatches to registered callbacks.

mod handler;
mod helpers;
mod parse;
mod signature;

pub use handler::{Callback, CallbackError, WebhookHandler};
pub use helpers::{dedupe_key, extract_from_number, normalize_event_type};
pub use parse::{parse, FieldIssue, ValidationError};
pub use signature::{compute_signature, verify_signature};

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Known webhook discriminators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    MessagesUpsert,
    MessagesUpdate,
    ConnectionUpdate,
    QrCodeUpdated,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        Self::MessagesUpsert,
        Self::MessagesUpdate,
        Self::ConnectionUpdate,
        Self::QrCodeUpdated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MessagesUpsert => "messages.upsert",
            Self::MessagesUpdate => "messages.update",
            Self::ConnectionUpdate => "connection.update",
            Self::QrCodeUpdated => "qrcode.updated",
        }
    }

    pub fn from_discriminator(event: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == event)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generic envelope: `messages.update`, `connection.update`, `qrcode.updated`
/// and unknown-but-valid events. `data` is not schema-constrained.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WebhookEnvelope {
    pub event: String,
    pub instance: String,
    pub data: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
}

impl WebhookEnvelope {
    /// `data.<field>` as a string, for the loosely typed variants.
    pub fn data_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }
}

/// `messageTimestamp`: an integer, or a numeric string as some gateways send it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MessageTimestamp {
    Int(i64),
    Text(String),
}

impl MessageTimestamp {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Strict payload of `messages.upsert`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageData {
    /// Always contains a string `id`; usually also `remoteJid` and `fromMe`.
    pub key: Map<String, Value>,
    pub push_name: Option<String>,
    pub message: Map<String, Value>,
    pub message_type: String,
    pub message_timestamp: MessageTimestamp,
    pub owner: bool,
    pub source: Option<String>,
    /// Fields outside the schema, kept as received.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MessageData {
    pub fn message_id(&self) -> Option<&str> {
        self.key.get("id").and_then(Value::as_str)
    }

    pub fn remote_jid(&self) -> Option<&str> {
        self.key.get("remoteJid").and_then(Value::as_str)
    }

    pub fn from_me(&self) -> bool {
        self.key.get("fromMe").and_then(Value::as_bool).unwrap_or(false)
    }

    /// Plain text body for `conversation` / `extendedTextMessage` messages.
    pub fn text(&self) -> Option<&str> {
        self.message
            .get("conversation")
            .and_then(Value::as_str)
            .or_else(|| {
                self.message
                    .get("extendedTextMessage")
                    .and_then(|m| m.get("text"))
                    .and_then(Value::as_str)
            })
    }
}

/// `messages.upsert`: a new message was received.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MessageUpsertEvent {
    pub event: String,
    pub instance: String,
    pub data: MessageData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
}

/// Payload that could not be classified or validated, preserved verbatim.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RawWebhookPayload {
    pub raw_payload: Value,
    pub event_type: Option<String>,
    pub parse_error: String,
}

/// One classified webhook delivery.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WebhookEvent {
    MessageUpsert(MessageUpsertEvent),
    MessageUpdate(WebhookEnvelope),
    ConnectionUpdate(WebhookEnvelope),
    QrCode(WebhookEnvelope),
    /// Well-formed envelope with an unrecognized `event`.
    Unknown(WebhookEnvelope),
    /// Classification or validation failed; see [RawWebhookPayload::parse_error].
    Raw(RawWebhookPayload),
}

impl WebhookEvent {
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            Self::MessageUpsert(_) => Some(EventKind::MessagesUpsert),
            Self::MessageUpdate(_) => Some(EventKind::MessagesUpdate),
            Self::ConnectionUpdate(_) => Some(EventKind::ConnectionUpdate),
            Self::QrCode(_) => Some(EventKind::QrCodeUpdated),
            Self::Unknown(_) | Self::Raw(_) => None,
        }
    }

    /// Discriminator string; for the fallback, the best-effort extracted one.
    pub fn event_type(&self) -> Option<&str> {
        match self {
            Self::MessageUpsert(e) => Some(e.event.as_str()),
            Self::MessageUpdate(e) | Self::ConnectionUpdate(e) | Self::QrCode(e) | Self::Unknown(e) => {
                Some(e.event.as_str())
            }
            Self::Raw(r) => r.event_type.as_deref(),
        }
    }

    pub fn instance(&self) -> Option<&str> {
        match self {
            Self::MessageUpsert(e) => Some(e.instance.as_str()),
            Self::MessageUpdate(e) | Self::ConnectionUpdate(e) | Self::QrCode(e) | Self::Unknown(e) => {
                Some(e.instance.as_str())
            }
            Self::Raw(_) => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Raw(_))
    }

    pub fn as_raw(&self) -> Option<&RawWebhookPayload> {
        match self {
            Self::Raw(r) => Some(r),
            _ => None,
        }
    }
}
