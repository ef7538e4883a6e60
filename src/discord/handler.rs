//! Discord event handling.
//!
//! Maps serenity gateway events onto the strict `SourceEvent` records the
//! bridge consumes. No filtering happens here; every message in every
//! channel is handed to the controller, which owns eligibility.

use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use serenity::Client;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::common::types::{EmbedRecord, InboundEvent, SourceEvent};

/// Discord event handler feeding the bridge controller.
pub struct SourceHandler {
    events_tx: mpsc::UnboundedSender<SourceEvent>,
}

impl SourceHandler {
    pub fn new(events_tx: mpsc::UnboundedSender<SourceEvent>) -> Self {
        Self { events_tx }
    }

    fn emit(&self, event: SourceEvent) {
        if self.events_tx.send(event).is_err() {
            error!("Bridge controller is gone; dropping Discord event");
        }
    }
}

/// Flatten a serenity message into the bridge's strict event record.
fn map_message(msg: &Message) -> InboundEvent {
    InboundEvent {
        channel_id: msg.channel_id.get(),
        author_id: msg.author.id.get(),
        author_is_bot: msg.author.bot,
        from_webhook: msg.webhook_id.is_some(),
        content: msg.content.clone(),
        embeds: msg
            .embeds
            .iter()
            .map(|embed| EmbedRecord {
                title: embed.title.clone(),
                url: embed.url.clone(),
                description: embed.description.clone(),
            })
            .collect(),
        attachments: msg
            .attachments
            .iter()
            .map(|attachment| attachment.url.clone())
            .collect(),
    }
}

#[async_trait]
impl EventHandler for SourceHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("Discord connected as {}", ready.user.name);
        self.emit(SourceEvent::Ready {
            self_id: ready.user.id.get(),
        });
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        self.emit(SourceEvent::Message(map_message(&msg)));
    }
}

/// Build the serenity client with the intents the bridge needs.
pub async fn build_client(
    token: &str,
    events_tx: mpsc::UnboundedSender<SourceEvent>,
) -> serenity::Result<Client> {
    let intents =
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;

    Client::builder(token, intents)
        .event_handler(SourceHandler::new(events_tx))
        .await
}
