//! Basic example: send a text message and route a sample webhook delivery.
//!
//! Run with: `cargo run --example basic`
//! (needs `EVOLUTION_BASE_URL`, `EVOLUTION_INSTANCE` and `EVOLUTION_API_KEY`).

use evolution_client::{Client, ClientConfig, TextMessage, WebhookEvent, WebhookHandler};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::try_init().ok();

    let handler = WebhookHandler::new();
    handler.register("messages.upsert", |evt| {
        match evt {
            WebhookEvent::MessageUpsert(e) => {
                println!(
                    "[Event] {} from {:?}: {:?}",
                    e.data.message_id().unwrap_or("?"),
                    e.data.push_name,
                    e.data.text()
                );
            }
            WebhookEvent::Raw(raw) => {
                println!("[Event] unparsed messages.upsert: {}", raw.parse_error);
            }
            _ => {}
        }
        Ok(())
    });
    handler.register("connection.update", |evt| {
        println!("[Event] connection update on {:?}", evt.instance());
        Ok(())
    });

    handler.handle(&json!({
        "event": "messages.upsert",
        "instance": "demo",
        "data": {
            "key": {"remoteJid": "5511999999999@s.whatsapp.net", "fromMe": false, "id": "3EB0"},
            "pushName": "Demo",
            "message": {"conversation": "ping"},
            "messageType": "conversation",
            "messageTimestamp": 1700000000
        }
    }));

    let client = Client::new(ClientConfig::from_env()?)?;
    let state = client.connection_state(&client.config().instance).await?;
    println!("Connection state: {} {}", state.status, state.body);

    let resp = client
        .send_text(TextMessage::new("5511999999999", "hello from rust"))
        .await?;
    println!("Sent: {} {}", resp.status, resp.body);

    client.close().await?;
    Ok(())
}
