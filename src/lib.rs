//! # evolution-client
//!
//! Rust client for the Evolution messaging gateway HTTP API.
//!
//! ## Features
//!
//! - Typed outbound messages (text, buttons, polls, media, audio, stickers,
//!   locations, lists, reactions, replies) with validation before sending
//! - Instance, group, chat and profile management calls
//! - Bounded exponential retry on 429/5xx and network errors
//! - Async [Client] and a [BlockingClient] with the same semantics
//! - Tolerant webhook parsing: any JSON becomes a [WebhookEvent], malformed
//!   payloads are preserved instead of rejected
//! - Callback dispatch by event type and HMAC-SHA256 signature checks
//!
//! ## Example
//!
//! ```ignore
//! use evolution_client::{Client, ClientConfig, TextMessage};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Client::new(ClientConfig::from_env()?)?;
//!     let resp = client.send_text(TextMessage::new("5511999999999", "hello")).await?;
//!     println!("{} {}", resp.status, resp.body);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod blocking;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod retry;
pub mod service;
pub mod transport;
pub mod types;

pub use blocking::BlockingClient;
pub use client::Client;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use events::{parse, EventKind, WebhookEvent, WebhookHandler};
pub use retry::RetryPolicy;
pub use service::{idempotency_from_payload, MessagingService};
pub use transport::{ApiRequest, ApiResponse, Transport};
pub use types::{
    AudioMessage, ButtonItem, ButtonsMessage, ListMessage, ListRow, ListSection, LocationMessage,
    MediaMessage, Message, MessageId, PollMessage, ReactionMessage, ReplyMessage, StickerMessage,
    TextMessage,
};
