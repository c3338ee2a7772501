//! Tolerant webhook parser.
//!
//! [parse] is total: every JSON value maps to exactly one [WebhookEvent].
//! Strict construction reports every failing field as a [ValidationError];
//! the failure (or a panic during construction) becomes [WebhookEvent::Raw]
//! carrying the original payload.

use super::{
    EventKind, MessageData, MessageTimestamp, MessageUpsertEvent, RawWebhookPayload,
    WebhookEnvelope, WebhookEvent,
};
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt;
use std::panic;
use tracing::warn;

/// Fields of `messages.upsert` data that have a schema.
const MESSAGE_DATA_FIELDS: &[&str] = &[
    "key",
    "pushName",
    "message",
    "messageType",
    "messageTimestamp",
    "owner",
    "source",
];

/// One failing field: dotted path, expected shape, JSON kind actually found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldIssue {
    pub path: String,
    pub expected: &'static str,
    pub found: &'static str,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: expected {}, found {}", self.path, self.expected, self.found)
    }
}

/// All issues found while building one event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationError {
    /// Discriminator being validated, when there was a usable one.
    pub event: Option<String>,
    pub issues: Vec<FieldIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.issues.len();
        write!(
            f,
            "{} validation error{} for {}: ",
            n,
            if n == 1 { "" } else { "s" },
            self.event.as_deref().unwrap_or("payload")
        )?;
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// JSON kind name used in diagnostics.
fn kind_of(value: Option<&Value>) -> &'static str {
    match value {
        None => "missing",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}

/// Collects issues; every accessor records a failure instead of returning early.
#[derive(Default)]
struct Checker {
    issues: Vec<FieldIssue>,
}

impl Checker {
    fn fail(&mut self, path: impl Into<String>, expected: &'static str, found: Option<&Value>) {
        self.issues.push(FieldIssue {
            path: path.into(),
            expected,
            found: kind_of(found),
        });
    }

    fn object<'a>(&mut self, obj: &'a Map<String, Value>, key: &str, path: &str) -> Option<&'a Map<String, Value>> {
        match obj.get(key) {
            Some(Value::Object(m)) => Some(m),
            other => {
                self.fail(path, "object", other);
                None
            }
        }
    }

    fn string(&mut self, obj: &Map<String, Value>, key: &str, path: &str) -> Option<String> {
        match obj.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            other => {
                self.fail(path, "string", other);
                None
            }
        }
    }

    /// Strings as-is; numbers and booleans coerced to their text.
    fn string_like(&mut self, obj: &Map<String, Value>, key: &str, path: &str) -> Option<String> {
        match obj.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            other => {
                self.fail(path, "string", other);
                None
            }
        }
    }

    /// Absent or null is `Some(None)`; a wrong type is a failure (`None`).
    fn optional_string(&mut self, obj: &Map<String, Value>, key: &str, path: &str) -> Option<Option<String>> {
        match obj.get(key) {
            None | Some(Value::Null) => Some(None),
            Some(Value::String(s)) => Some(Some(s.clone())),
            other => {
                self.fail(path, "string or null", other);
                None
            }
        }
    }

    fn optional_bool(&mut self, obj: &Map<String, Value>, key: &str, path: &str) -> Option<Option<bool>> {
        match obj.get(key) {
            None | Some(Value::Null) => Some(None),
            Some(Value::Bool(b)) => Some(Some(*b)),
            other => {
                self.fail(path, "boolean or null", other);
                None
            }
        }
    }

    fn timestamp(&mut self, obj: &Map<String, Value>, key: &str, path: &str) -> Option<MessageTimestamp> {
        let value = obj.get(key);
        match value {
            Some(Value::Number(n)) => {
                if let Some(v) = n.as_i64().or_else(|| integral_f64(n.as_f64())) {
                    return Some(MessageTimestamp::Int(v));
                }
            }
            Some(Value::String(s)) if s.trim().parse::<i64>().is_ok() => {
                return Some(MessageTimestamp::Text(s.clone()));
            }
            _ => {}
        }
        self.fail(path, "integer or numeric string", value);
        None
    }

    fn finish<T>(self, event: Option<&str>, value: Option<T>) -> Result<T, ValidationError> {
        match value {
            Some(v) if self.issues.is_empty() => Ok(v),
            _ => Err(ValidationError {
                event: event.map(str::to_string),
                issues: self.issues,
            }),
        }
    }
}

/// Floats with no fractional part that fit in an `i64`, e.g. `1700000000.0`.
fn integral_f64(value: Option<f64>) -> Option<i64> {
    let f = value?;
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.fract() == 0.0 && in_range).then_some(f as i64)
}

/// `instance`, `data` and the optional `sender` of any envelope.
fn envelope_fields(
    checker: &mut Checker,
    obj: &Map<String, Value>,
) -> Option<(String, Map<String, Value>, Option<String>)> {
    let instance = checker.string_like(obj, "instance", "instance");
    let data = checker.object(obj, "data", "data").cloned();
    let sender = checker.optional_string(obj, "sender", "sender");
    Some((instance?, data?, sender?))
}

fn generic_envelope(event: &str, obj: &Map<String, Value>) -> Result<WebhookEnvelope, ValidationError> {
    let mut checker = Checker::default();
    let fields = envelope_fields(&mut checker, obj);
    let envelope = fields.map(|(instance, data, sender)| WebhookEnvelope {
        event: event.to_string(),
        instance,
        data,
        sender,
    });
    checker.finish(Some(event), envelope)
}

fn message_data(checker: &mut Checker, data: &Map<String, Value>) -> Option<MessageData> {
    let key = checker.object(data, "key", "data.key");
    if let Some(key) = key {
        if !matches!(key.get("id"), Some(Value::String(_))) {
            checker.fail("data.key.id", "string", key.get("id"));
        }
    }
    let message = checker.object(data, "message", "data.message");
    let message_type = checker.string(data, "messageType", "data.messageType");
    let message_timestamp = checker.timestamp(data, "messageTimestamp", "data.messageTimestamp");
    let push_name = checker.optional_string(data, "pushName", "data.pushName");
    let owner = checker.optional_bool(data, "owner", "data.owner");
    let source = checker.optional_string(data, "source", "data.source");

    let extra = data
        .iter()
        .filter(|(k, _)| !MESSAGE_DATA_FIELDS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Some(MessageData {
        key: key?.clone(),
        push_name: push_name?,
        message: message?.clone(),
        message_type: message_type?,
        message_timestamp: message_timestamp?,
        owner: owner?.unwrap_or(false),
        source: source?,
        extra,
    })
}

fn message_upsert(obj: &Map<String, Value>) -> Result<MessageUpsertEvent, ValidationError> {
    let event = EventKind::MessagesUpsert.as_str();
    let mut checker = Checker::default();
    let instance = checker.string_like(obj, "instance", "instance");
    let data = checker.object(obj, "data", "data");
    let sender = checker.optional_string(obj, "sender", "sender");
    let data = data.and_then(|d| message_data(&mut checker, d));
    let built = match (instance, data, sender) {
        (Some(instance), Some(data), Some(sender)) => Some(MessageUpsertEvent {
            event: event.to_string(),
            instance,
            data,
            sender,
        }),
        _ => None,
    };
    checker.finish(Some(event), built)
}

fn strict(kind: EventKind, obj: &Map<String, Value>) -> Result<WebhookEvent, ValidationError> {
    match kind {
        EventKind::MessagesUpsert => message_upsert(obj).map(WebhookEvent::MessageUpsert),
        EventKind::MessagesUpdate => generic_envelope(kind.as_str(), obj).map(WebhookEvent::MessageUpdate),
        EventKind::ConnectionUpdate => {
            generic_envelope(kind.as_str(), obj).map(WebhookEvent::ConnectionUpdate)
        }
        EventKind::QrCodeUpdated => generic_envelope(kind.as_str(), obj).map(WebhookEvent::QrCode),
    }
}

fn classify(raw: &Value) -> Result<WebhookEvent, ValidationError> {
    let Some(obj) = raw.as_object() else {
        return Err(ValidationError {
            event: None,
            issues: vec![FieldIssue {
                path: "payload".to_string(),
                expected: "object",
                found: kind_of(Some(raw)),
            }],
        });
    };
    match obj.get("event") {
        Some(Value::String(event)) => match EventKind::from_discriminator(event) {
            Some(kind) => strict(kind, obj),
            None => generic_envelope(event, obj).map(WebhookEvent::Unknown),
        },
        other => Err(ValidationError {
            event: None,
            issues: vec![FieldIssue {
                path: "event".to_string(),
                expected: "string",
                found: kind_of(other),
            }],
        }),
    }
}

/// `event` as text for diagnostics: strings verbatim, other values as JSON,
/// `None` when absent or null.
pub(crate) fn discriminator_text(raw: &Value) -> Option<String> {
    match raw.get("event") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

fn fallback(raw: &Value, parse_error: String) -> WebhookEvent {
    let event_type = discriminator_text(raw);
    warn!(event = ?event_type, error = %parse_error, "webhook payload degraded to raw fallback");
    WebhookEvent::Raw(RawWebhookPayload {
        raw_payload: raw.clone(),
        event_type,
        parse_error,
    })
}

/// Classify `raw` into exactly one event. Never fails and never panics.
pub fn parse(raw: &Value) -> WebhookEvent {
    match panic::catch_unwind(|| classify(raw)) {
        Ok(Ok(event)) => event,
        Ok(Err(err)) => fallback(raw, err.to_string()),
        Err(payload) => fallback(
            raw,
            format!("internal parser error: {}", panic_message(payload.as_ref())),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_upsert() -> Value {
        json!({
            "event": "messages.upsert",
            "instance": "production-instance",
            "data": {
                "key": {
                    "remoteJid": "5531999887766@s.whatsapp.net",
                    "fromMe": false,
                    "id": "3EB0C767D097B7C7C030"
                },
                "pushName": "João Silva",
                "message": {"conversation": "Olá!"},
                "messageType": "conversation",
                "messageTimestamp": 1700000000,
                "owner": false,
                "source": "android"
            },
            "sender": "5531988776655@s.whatsapp.net"
        })
    }

    fn raw(event: WebhookEvent) -> RawWebhookPayload {
        match event {
            WebhookEvent::Raw(r) => r,
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn valid_upsert_parses_strictly() {
        let WebhookEvent::MessageUpsert(event) = parse(&valid_upsert()) else {
            panic!("expected MessageUpsert");
        };
        assert_eq!(event.event, "messages.upsert");
        assert_eq!(event.instance, "production-instance");
        assert_eq!(event.sender.as_deref(), Some("5531988776655@s.whatsapp.net"));
        assert_eq!(event.data.push_name.as_deref(), Some("João Silva"));
        assert_eq!(event.data.message_type, "conversation");
        assert_eq!(event.data.remote_jid(), Some("5531999887766@s.whatsapp.net"));
        assert_eq!(event.data.message_id(), Some("3EB0C767D097B7C7C030"));
        assert_eq!(event.data.text(), Some("Olá!"));
        assert_eq!(event.data.message_timestamp, MessageTimestamp::Int(1700000000));
        assert_eq!(event.data.source.as_deref(), Some("android"));
        assert!(event.data.extra.is_empty());
    }

    #[test]
    fn numeric_string_timestamp_is_accepted() {
        let mut payload = valid_upsert();
        payload["data"]["messageTimestamp"] = json!("1700000000");
        let WebhookEvent::MessageUpsert(event) = parse(&payload) else {
            panic!("expected MessageUpsert");
        };
        assert_eq!(event.data.message_timestamp.as_i64(), Some(1700000000));
    }

    #[test]
    fn integral_float_timestamp_is_accepted() {
        let mut payload = valid_upsert();
        payload["data"]["messageTimestamp"] = json!(1700000000.0);
        let WebhookEvent::MessageUpsert(event) = parse(&payload) else {
            panic!("expected MessageUpsert");
        };
        assert_eq!(event.data.message_timestamp, MessageTimestamp::Int(1700000000));

        payload["data"]["messageTimestamp"] = json!(1700000000.25);
        assert!(parse(&payload).is_fallback());
        payload["data"]["messageTimestamp"] = json!(1e300);
        assert!(parse(&payload).is_fallback());
    }

    #[test]
    fn non_numeric_timestamp_degrades() {
        let mut payload = valid_upsert();
        payload["data"]["messageTimestamp"] = json!("yesterday");
        let r = raw(parse(&payload));
        assert!(r.parse_error.contains("data.messageTimestamp"));
    }

    #[test]
    fn each_required_field_triggers_fallback() {
        for field in ["key", "message", "messageType", "messageTimestamp"] {
            let mut payload = valid_upsert();
            payload["data"].as_object_mut().unwrap().remove(field);
            let r = raw(parse(&payload));
            assert_eq!(r.raw_payload, payload);
            assert_eq!(r.event_type.as_deref(), Some("messages.upsert"));
            assert!(
                r.parse_error.contains(&format!("data.{field}: expected")),
                "{field}: {}",
                r.parse_error
            );
        }
    }

    #[test]
    fn all_issues_are_reported() {
        let payload = json!({
            "event": "messages.upsert",
            "instance": "test",
            "data": {"key": {"id": "123"}}
        });
        let r = raw(parse(&payload));
        assert!(r.parse_error.starts_with("3 validation errors for messages.upsert"));
        assert!(r.parse_error.contains("data.message: expected object, found missing"));
        assert!(r.parse_error.contains("data.messageType"));
        assert!(r.parse_error.contains("data.messageTimestamp"));
    }

    #[test]
    fn key_without_id_is_rejected() {
        let mut payload = valid_upsert();
        payload["data"]["key"] = json!({"remoteJid": "x@s.whatsapp.net"});
        let r = raw(parse(&payload));
        assert!(r.parse_error.contains("data.key.id: expected string, found missing"));
    }

    #[test]
    fn wrong_optional_types_degrade() {
        let mut payload = valid_upsert();
        payload["data"]["pushName"] = json!(42);
        assert!(parse(&payload).is_fallback());

        let mut payload = valid_upsert();
        payload["data"]["pushName"] = Value::Null;
        payload["data"]["owner"] = Value::Null;
        let WebhookEvent::MessageUpsert(event) = parse(&payload) else {
            panic!("null optionals are allowed");
        };
        assert_eq!(event.data.push_name, None);
        assert!(!event.data.owner);
    }

    #[test]
    fn numeric_instance_is_coerced() {
        let payload = json!({"event": "connection.update", "instance": 12345, "data": {"state": "open"}});
        let WebhookEvent::ConnectionUpdate(event) = parse(&payload) else {
            panic!("expected ConnectionUpdate");
        };
        assert_eq!(event.instance, "12345");
        assert_eq!(event.data_str("state"), Some("open"));
    }

    #[test]
    fn wrong_types_return_fallback() {
        let payload = json!({"event": "messages.upsert", "instance": 12345, "data": "not a dict"});
        let r = raw(parse(&payload));
        assert_eq!(r.raw_payload, payload);
        assert_eq!(r.event_type.as_deref(), Some("messages.upsert"));
        assert!(r.parse_error.contains("data: expected object, found string"));
    }

    #[test]
    fn loose_known_events() {
        let qr = parse(&json!({"event": "qrcode.updated", "instance": "i", "data": {"qrcode": "2@abc", "pairingCode": "WZYEH1YY"}}));
        assert_eq!(qr.kind(), Some(EventKind::QrCodeUpdated));
        let update = parse(&json!({"event": "messages.update", "instance": "i", "data": {}}));
        assert!(matches!(update, WebhookEvent::MessageUpdate(_)));
        let missing = parse(&json!({"event": "connection.update"}));
        assert_eq!(missing.event_type(), Some("connection.update"));
        assert!(missing.is_fallback());
    }

    #[test]
    fn unknown_event_passes_through() {
        let payload = json!({"event": "some.future.event", "instance": "test-instance", "data": {"custom": "data"}});
        let WebhookEvent::Unknown(event) = parse(&payload) else {
            panic!("expected Unknown");
        };
        assert_eq!(event.event, "some.future.event");
        assert_eq!(event.instance, "test-instance");
        assert_eq!(event.data["custom"], "data");
    }

    #[test]
    fn unknown_event_with_bad_data_degrades() {
        let payload = json!({"event": "some.future.event", "instance": "i", "data": []});
        let r = raw(parse(&payload));
        assert_eq!(r.event_type.as_deref(), Some("some.future.event"));
    }

    #[test]
    fn parse_is_total() {
        let inputs = [
            json!({}),
            json!(null),
            json!([1, 2, 3]),
            json!("string"),
            json!(42),
            json!({"x": null}),
            json!({"a": {"b": {"c": [1, 2, 3]}}}),
            json!({"event": null, "data": []}),
            json!({"event": 123, "instance": [], "data": "string"}),
            json!({"event": "messages.upsert", "instance": null, "data": null}),
            json!({"event": "messages.upsert"}),
            json!({"event": "qrcode.updated", "invalid": true}),
            json!({"event": "messages.upsert", "instance": "i", "data": {"key": [], "message": 1, "messageType": {}, "messageTimestamp": 1.5}}),
        ];
        for input in inputs {
            let event = parse(&input);
            if let WebhookEvent::Raw(r) = &event {
                assert_eq!(r.raw_payload, input);
                assert!(!r.parse_error.is_empty());
            }
        }
    }

    #[test]
    fn discriminator_is_stringified_for_diagnostics() {
        assert_eq!(raw(parse(&json!({}))).event_type, None);
        assert_eq!(raw(parse(&json!({"event": null}))).event_type, None);
        let r = raw(parse(&json!({"event": 123, "instance": "i", "data": {}})));
        assert_eq!(r.event_type.as_deref(), Some("123"));
        assert_eq!(r.parse_error, "1 validation error for payload: event: expected string, found number");
    }

    #[test]
    fn non_object_payload() {
        let r = raw(parse(&json!(["event"])));
        assert_eq!(r.parse_error, "1 validation error for payload: payload: expected object, found array");
        assert_eq!(r.event_type, None);
    }
}
