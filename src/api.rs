//! Request construction for every gateway operation.
//!
//! Scoped paths follow `<base>/<operation>/<instance>`, where the instance is
//! the per-call override or the configured default.

use crate::config::ClientConfig;
use crate::transport::ApiRequest;
use crate::types::{resolve_media_type, ListSection, Message};
use serde_json::{json, Map, Value};

/// Builds [ApiRequest]s against one gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
    instance: String,
}

fn put_opt(body: &mut Value, key: &str, value: Option<&String>) {
    if let (Some(obj), Some(v)) = (body.as_object_mut(), value) {
        if !v.is_empty() {
            obj.insert(key.to_string(), Value::from(v.as_str()));
        }
    }
}

fn sections_json(sections: &[ListSection]) -> Value {
    sections
        .iter()
        .map(|s| {
            let rows: Vec<Value> = s
                .rows
                .iter()
                .map(|r| {
                    let mut row = json!({ "title": r.title, "rowId": r.row_id });
                    put_opt(&mut row, "description", r.description.as_ref());
                    row
                })
                .collect();
            json!({ "title": s.title, "rows": rows })
        })
        .collect()
}

/// Operation path and wire body for an outbound message.
pub fn message_body(message: &Message) -> (&'static str, Value) {
    match message {
        Message::Text(m) => (
            "/message/sendText",
            json!({ "number": m.number, "text": m.text, "delay": m.delay }),
        ),
        Message::Buttons(m) => {
            let mut body = json!({ "number": m.number, "text": m.text, "delay": m.delay });
            put_opt(&mut body, "footer", m.footer.as_ref());
            body["buttons"] = m
                .buttons
                .iter()
                .map(|b| {
                    json!({
                        "buttonId": b.id,
                        "buttonText": { "displayText": b.label },
                        "type": 1
                    })
                })
                .collect();
            ("/message/sendButtons", body)
        }
        Message::Poll(m) => (
            "/message/sendPoll",
            json!({
                "number": m.number,
                "name": m.name,
                "selectableCount": m.selectable_count,
                "values": m.values,
                "delay": m.delay
            }),
        ),
        Message::Media(m) => {
            let mut body = json!({
                "number": m.number,
                "media": m.url,
                "delay": m.delay,
                "mediatype": resolve_media_type(&m.url, m.media_type.as_deref()),
            });
            put_opt(&mut body, "caption", m.caption.as_ref());
            ("/message/sendMedia", body)
        }
        Message::Audio(m) => (
            "/message/sendWhatsAppAudio",
            json!({ "number": m.number, "audio": m.url, "delay": m.delay }),
        ),
        Message::Sticker(m) => (
            "/message/sendSticker",
            json!({ "number": m.number, "sticker": m.url, "delay": m.delay }),
        ),
        Message::Location(m) => {
            let mut body = json!({
                "number": m.number,
                "latitude": m.latitude,
                "longitude": m.longitude,
                "delay": m.delay
            });
            put_opt(&mut body, "name", m.name.as_ref());
            put_opt(&mut body, "address", m.address.as_ref());
            ("/message/sendLocation", body)
        }
        Message::List(m) => {
            let mut body = json!({
                "number": m.number,
                "title": m.title,
                "buttonText": m.button_text,
                "sections": sections_json(&m.sections),
                "delay": m.delay
            });
            put_opt(&mut body, "description", m.description.as_ref());
            put_opt(&mut body, "footer", m.footer.as_ref());
            ("/message/sendList", body)
        }
        Message::Reaction(m) => (
            "/message/sendReaction",
            json!({ "reactionMessage": { "key": m.key, "reaction": m.reaction } }),
        ),
        Message::Reply(m) => (
            "/message/reply",
            json!({
                "number": m.number,
                "reply_to": m.message_id,
                "text": m.text,
                "delay": m.delay
            }),
        ),
    }
}

impl Endpoints {
    pub fn new(base: impl Into<String>, instance: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
            instance: instance.into(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.base(), config.instance.clone())
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Default instance.
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// `<base><path>/<instance>`, falling back to the default instance.
    pub fn scoped(&self, path: &str, instance: Option<&str>) -> String {
        format!("{}{}/{}", self.base, path, instance.unwrap_or(&self.instance))
    }

    fn unscoped(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn message(&self, message: &Message, instance: Option<&str>) -> ApiRequest {
        let (path, body) = message_body(message);
        ApiRequest::post(self.scoped(path, instance), body)
    }

    // Instance management. These address the instance by name, not by default.

    pub fn create_instance(&self, name: &str, token: Option<&str>, qrcode: bool) -> ApiRequest {
        let mut body = Map::new();
        body.insert("instanceName".into(), Value::from(name));
        body.insert("qrcode".into(), Value::from(qrcode));
        if let Some(token) = token {
            body.insert("token".into(), Value::from(token));
        }
        ApiRequest::post(self.unscoped("/instance/create"), Value::Object(body))
    }

    pub fn connect_instance(&self, name: &str) -> ApiRequest {
        ApiRequest::get(self.scoped("/instance/connect", Some(name)))
    }

    pub fn connection_state(&self, name: &str) -> ApiRequest {
        ApiRequest::get(self.scoped("/instance/connectionState", Some(name)))
    }

    pub fn logout_instance(&self, name: &str) -> ApiRequest {
        ApiRequest::delete(self.scoped("/instance/logout", Some(name)))
    }

    pub fn delete_instance(&self, name: &str) -> ApiRequest {
        ApiRequest::delete(self.scoped("/instance/delete", Some(name)))
    }

    pub fn fetch_instances(&self) -> ApiRequest {
        ApiRequest::get(self.unscoped("/instance/fetchInstances"))
    }

    // Groups.

    pub fn group_create(
        &self,
        subject: &str,
        participants: &[String],
        description: Option<&str>,
        instance: Option<&str>,
    ) -> ApiRequest {
        let mut body = json!({ "subject": subject, "participants": participants });
        if let Some(d) = description {
            body["description"] = Value::from(d);
        }
        ApiRequest::post(self.scoped("/group/create", instance), body)
    }

    pub fn group_update_picture(
        &self,
        group_jid: &str,
        image_url: &str,
        instance: Option<&str>,
    ) -> ApiRequest {
        ApiRequest::post(
            self.scoped("/group/updateProfilePicture", instance),
            json!({ "image": image_url }),
        )
        .with_query("groupJid", group_jid)
    }

    pub fn group_fetch_all(&self, get_participants: bool, instance: Option<&str>) -> ApiRequest {
        ApiRequest::get(self.scoped("/group/fetchAllGroups", instance))
            .with_query("getParticipants", get_participants.to_string())
    }

    /// `action` is one of `add`, `remove`, `promote`, `demote`.
    pub fn group_participants_update(
        &self,
        group_jid: &str,
        action: &str,
        participants: &[String],
        instance: Option<&str>,
    ) -> ApiRequest {
        ApiRequest::post(
            self.scoped("/group/updateParticipant", instance),
            json!({ "action": action, "participants": participants }),
        )
        .with_query("groupJid", group_jid)
    }

    // Chats and profile.

    pub fn chat_archive(&self, number: &str, archive: bool, instance: Option<&str>) -> ApiRequest {
        ApiRequest::post(
            self.scoped("/chat/archiveChat", instance),
            json!({ "number": number, "archive": archive }),
        )
    }

    /// `read = false` goes to the separate `markMessageAsUnread` route.
    pub fn chat_mark_read(&self, number: &str, read: bool, instance: Option<&str>) -> ApiRequest {
        let path = if read {
            "/chat/markMessageAsRead"
        } else {
            "/chat/markMessageAsUnread"
        };
        ApiRequest::post(
            self.scoped(path, instance),
            json!({ "number": number, "read": read }),
        )
    }

    pub fn profile_update_name(&self, name: &str, instance: Option<&str>) -> ApiRequest {
        ApiRequest::post(
            self.scoped("/chat/updateProfileName", instance),
            json!({ "name": name }),
        )
    }

    pub fn profile_update_status(&self, status: &str, instance: Option<&str>) -> ApiRequest {
        ApiRequest::post(
            self.scoped("/chat/updateProfileStatus", instance),
            json!({ "status": status }),
        )
    }
}
