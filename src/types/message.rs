//! Outbound message records, one per message kind.

use crate::error::Error;
use crate::Result;
use serde_json::{Map, Value};

const PHONE_MIN: usize = 5;
const PHONE_MAX: usize = 32;
const MAX_BUTTONS: usize = 3;
const BUTTON_FIELD_MAX: usize = 64;
const POLL_FIELD_MAX: usize = 100;
const POLL_SELECTABLE_MAX: u8 = 5;

fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidMessage(msg.into())
}

fn check_number(number: &str) -> Result<()> {
    let len = number.trim().chars().count();
    if !(PHONE_MIN..=PHONE_MAX).contains(&len) {
        return Err(invalid(format!(
            "number must be {PHONE_MIN}-{PHONE_MAX} characters, got {len}"
        )));
    }
    Ok(())
}

fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len == 0 || len > max {
        return Err(invalid(format!("{field} must be 1-{max} characters, got {len}")));
    }
    Ok(())
}

fn check_non_empty(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(invalid(format!("{field} must not be empty")));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextMessage {
    pub number: String,
    pub text: String,
    pub delay: u32,
}

impl TextMessage {
    pub fn new(number: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            text: text.into(),
            delay: 0,
        }
    }

    pub fn with_delay(mut self, delay: u32) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ButtonItem {
    pub id: String,
    pub label: String,
}

impl ButtonItem {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Reply buttons. WhatsApp clients render 1 to 3.
#[derive(Clone, Debug, PartialEq)]
pub struct ButtonsMessage {
    pub number: String,
    pub text: String,
    pub footer: Option<String>,
    pub buttons: Vec<ButtonItem>,
    pub delay: u32,
}

impl ButtonsMessage {
    pub fn new(number: impl Into<String>, text: impl Into<String>, buttons: Vec<ButtonItem>) -> Self {
        Self {
            number: number.into(),
            text: text.into(),
            footer: None,
            buttons,
            delay: 0,
        }
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PollMessage {
    pub number: String,
    pub name: String,
    pub selectable_count: u8,
    pub values: Vec<String>,
    pub delay: u32,
}

impl PollMessage {
    pub fn new(number: impl Into<String>, name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            number: number.into(),
            name: name.into(),
            selectable_count: 1,
            values,
            delay: 0,
        }
    }

    pub fn with_selectable_count(mut self, count: u8) -> Self {
        self.selectable_count = count;
        self
    }
}

/// Media by URL. `media_type` overrides extension sniffing.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaMessage {
    pub number: String,
    pub url: String,
    pub caption: Option<String>,
    pub media_type: Option<String>,
    pub delay: u32,
}

impl MediaMessage {
    pub fn new(number: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            url: url.into(),
            caption: None,
            media_type: None,
            delay: 0,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }
}

/// Voice note.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioMessage {
    pub number: String,
    pub url: String,
    pub delay: u32,
}

impl AudioMessage {
    pub fn new(number: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            url: url.into(),
            delay: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StickerMessage {
    pub number: String,
    pub url: String,
    pub delay: u32,
}

impl StickerMessage {
    pub fn new(number: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            url: url.into(),
            delay: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LocationMessage {
    pub number: String,
    pub latitude: f64,
    pub longitude: f64,
    pub name: Option<String>,
    pub address: Option<String>,
    pub delay: u32,
}

impl LocationMessage {
    pub fn new(number: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            number: number.into(),
            latitude,
            longitude,
            name: None,
            address: None,
            delay: 0,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListRow {
    pub title: String,
    pub description: Option<String>,
    pub row_id: String,
}

impl ListRow {
    pub fn new(title: impl Into<String>, row_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            row_id: row_id.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListSection {
    pub title: String,
    pub rows: Vec<ListRow>,
}

impl ListSection {
    pub fn new(title: impl Into<String>, rows: Vec<ListRow>) -> Self {
        Self {
            title: title.into(),
            rows,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListMessage {
    pub number: String,
    pub title: String,
    pub button_text: String,
    pub sections: Vec<ListSection>,
    pub description: Option<String>,
    pub footer: Option<String>,
    pub delay: u32,
}

impl ListMessage {
    pub fn new(
        number: impl Into<String>,
        title: impl Into<String>,
        button_text: impl Into<String>,
        sections: Vec<ListSection>,
    ) -> Self {
        Self {
            number: number.into(),
            title: title.into(),
            button_text: button_text.into(),
            sections,
            description: None,
            footer: None,
            delay: 0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

/// Emoji reaction to the message identified by `key` (as received in a
/// `messages.upsert` webhook). An empty `reaction` removes it.
#[derive(Clone, Debug, PartialEq)]
pub struct ReactionMessage {
    pub key: Map<String, Value>,
    pub reaction: String,
}

impl ReactionMessage {
    pub fn new(key: Map<String, Value>, reaction: impl Into<String>) -> Self {
        Self {
            key,
            reaction: reaction.into(),
        }
    }
}

/// Text quoting an earlier message.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplyMessage {
    pub number: String,
    pub message_id: String,
    pub text: String,
    pub delay: u32,
}

impl ReplyMessage {
    pub fn new(
        number: impl Into<String>,
        message_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            number: number.into(),
            message_id: message_id.into(),
            text: text.into(),
            delay: 0,
        }
    }
}

/// Any outbound message. Routed by [MessagingService](crate::MessagingService).
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    Text(TextMessage),
    Buttons(ButtonsMessage),
    Poll(PollMessage),
    Media(MediaMessage),
    Audio(AudioMessage),
    Sticker(StickerMessage),
    Location(LocationMessage),
    List(ListMessage),
    Reaction(ReactionMessage),
    Reply(ReplyMessage),
}

impl Message {
    /// Short kind name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Buttons(_) => "buttons",
            Self::Poll(_) => "poll",
            Self::Media(_) => "media",
            Self::Audio(_) => "audio",
            Self::Sticker(_) => "sticker",
            Self::Location(_) => "location",
            Self::List(_) => "list",
            Self::Reaction(_) => "reaction",
            Self::Reply(_) => "reply",
        }
    }

    /// Recipient, when the kind has one (reactions address a message key).
    pub fn number(&self) -> Option<&str> {
        match self {
            Self::Text(m) => Some(&m.number),
            Self::Buttons(m) => Some(&m.number),
            Self::Poll(m) => Some(&m.number),
            Self::Media(m) => Some(&m.number),
            Self::Audio(m) => Some(&m.number),
            Self::Sticker(m) => Some(&m.number),
            Self::Location(m) => Some(&m.number),
            Self::List(m) => Some(&m.number),
            Self::Reply(m) => Some(&m.number),
            Self::Reaction(_) => None,
        }
    }

    /// Check field constraints before anything is sent.
    pub fn validate(&self) -> Result<()> {
        if let Some(number) = self.number() {
            check_number(number)?;
        }
        match self {
            Self::Text(m) => check_non_empty("text", &m.text),
            Self::Buttons(m) => {
                check_non_empty("text", &m.text)?;
                if m.buttons.is_empty() || m.buttons.len() > MAX_BUTTONS {
                    return Err(invalid(format!(
                        "1 to {MAX_BUTTONS} buttons allowed, got {}",
                        m.buttons.len()
                    )));
                }
                for b in &m.buttons {
                    check_len("button id", &b.id, BUTTON_FIELD_MAX)?;
                    check_len("button label", &b.label, BUTTON_FIELD_MAX)?;
                }
                Ok(())
            }
            Self::Poll(m) => {
                check_len("poll name", &m.name, POLL_FIELD_MAX)?;
                if !(1..=POLL_SELECTABLE_MAX).contains(&m.selectable_count) {
                    return Err(invalid(format!(
                        "selectable count must be 1-{POLL_SELECTABLE_MAX}, got {}",
                        m.selectable_count
                    )));
                }
                if m.values.len() < 2 {
                    return Err(invalid("poll must have at least two options"));
                }
                for v in &m.values {
                    check_len("poll option", v, POLL_FIELD_MAX)?;
                }
                Ok(())
            }
            Self::Media(m) => {
                if m.url.chars().count() < 5 {
                    return Err(invalid("media url must be at least 5 characters"));
                }
                Ok(())
            }
            Self::Audio(m) => check_non_empty("audio url", &m.url),
            Self::Sticker(m) => check_non_empty("sticker url", &m.url),
            Self::Location(m) => {
                if !(-90.0..=90.0).contains(&m.latitude) {
                    return Err(invalid(format!("latitude out of range: {}", m.latitude)));
                }
                if !(-180.0..=180.0).contains(&m.longitude) {
                    return Err(invalid(format!("longitude out of range: {}", m.longitude)));
                }
                Ok(())
            }
            Self::List(m) => {
                check_non_empty("title", &m.title)?;
                check_non_empty("button text", &m.button_text)?;
                if m.sections.is_empty() {
                    return Err(invalid("list needs at least one section"));
                }
                if let Some(section) = m.sections.iter().find(|s| s.rows.is_empty()) {
                    return Err(invalid(format!("section {:?} has no rows", section.title)));
                }
                Ok(())
            }
            Self::Reaction(m) => {
                if m.key.is_empty() {
                    return Err(invalid("reaction key must not be empty"));
                }
                Ok(())
            }
            Self::Reply(m) => {
                check_non_empty("message id", &m.message_id)?;
                check_non_empty("text", &m.text)
            }
        }
    }
}

macro_rules! impl_from_message {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(impl From<$ty> for Message {
            fn from(m: $ty) -> Self {
                Self::$variant(m)
            }
        })*
    };
}

impl_from_message!(
    Text(TextMessage),
    Buttons(ButtonsMessage),
    Poll(PollMessage),
    Media(MediaMessage),
    Audio(AudioMessage),
    Sticker(StickerMessage),
    Location(LocationMessage),
    List(ListMessage),
    Reaction(ReactionMessage),
    Reply(ReplyMessage),
);
