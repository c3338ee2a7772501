mod media;
mod message;
mod responses;

pub use media::{media_type_for, resolve_media_type, MediaType, DEFAULT_MEDIA_TYPE};
pub use message::{
    AudioMessage, ButtonItem, ButtonsMessage, ListMessage, ListRow, ListSection, LocationMessage,
    MediaMessage, Message, PollMessage, ReactionMessage, ReplyMessage, StickerMessage,
    TextMessage,
};
pub use responses::{Group, GroupParticipant, InstanceConnectionState, SendMessageResponse};

/// Message ID type (gateway `key.id`).
pub type MessageId = String;
