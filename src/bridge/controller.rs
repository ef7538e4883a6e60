//! Bridge controller: the Discord -> WhatsApp forwarding loop.
//!
//! Consumes the source event stream and pushes eligible, normalized
//! messages into the send sink. Individual messages are never retried or
//! queued; connectivity recovery is entirely the connection manager's
//! job, and a message lost in the not-ready window is an accepted loss.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::bridge::filter::{should_forward, FilterContext};
use crate::bridge::normalize::normalize;
use crate::common::types::{DiscordId, InboundEvent, SourceEvent};
use crate::whatsapp::transport::{SendOutcome, TextSink};

/// Immutable relay configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Discord channel messages are relayed from.
    pub source_channel: DiscordId,
    /// WhatsApp conversation messages are relayed to.
    pub target_conversation: String,
}

/// Drives events from the Discord side into the WhatsApp sink.
pub struct BridgeController<S: TextSink> {
    config: BridgeConfig,
    sink: S,
    /// Our Discord user id, learned from the gateway `Ready` event.
    self_id: Option<DiscordId>,
    /// Set after the first not-ready drop of a cycle so the log line
    /// appears once per drop-cycle, not once per event.
    warned_not_ready: bool,
    /// Messages dropped because the connection was not ready.
    not_ready_drops: u64,
}

impl<S: TextSink> BridgeController<S> {
    pub fn new(config: BridgeConfig, sink: S) -> Self {
        Self {
            config,
            sink,
            self_id: None,
            warned_not_ready: false,
            not_ready_drops: 0,
        }
    }

    /// Consume the source stream until it closes.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<SourceEvent>) {
        while let Some(event) = events.recv().await {
            self.process(event).await;
        }
        info!("Source event stream ended");
    }

    async fn process(&mut self, event: SourceEvent) {
        match event {
            SourceEvent::Ready { self_id } => {
                info!("Discord ready (user id {})", self_id);
                info!("Relaying channel {} -> {}", self.config.source_channel, self.config.target_conversation);
                self.self_id = Some(self_id);
            }
            SourceEvent::Message(message) => self.relay(message).await,
        }
    }

    async fn relay(&mut self, message: InboundEvent) {
        // Until Ready arrives we cannot tell our own messages apart, so
        // events are dropped rather than queued.
        let Some(self_id) = self.self_id else {
            warn!("Dropping message: Discord identity not known yet");
            return;
        };

        let ctx = FilterContext {
            source_channel: self.config.source_channel,
            self_id,
        };
        if !should_forward(&message, &ctx) {
            return;
        }

        let text = normalize(&message);
        if text.is_empty() {
            return;
        }

        match self
            .sink
            .send_text(&self.config.target_conversation, &text)
            .await
        {
            SendOutcome::Sent => {
                info!("Relayed to WhatsApp ({} chars)", text.len());
                self.warned_not_ready = false;
            }
            SendOutcome::NotReady => {
                self.not_ready_drops += 1;
                if self.warned_not_ready {
                    debug!("WhatsApp still not ready; message dropped");
                } else {
                    warn!("WhatsApp connection not ready; dropping messages until it recovers");
                    self.warned_not_ready = true;
                }
            }
            SendOutcome::Failed(detail) => {
                warn!("Message dropped, WhatsApp send failed: {}", detail);
            }
        }
    }

    #[cfg(test)]
    fn not_ready_drops(&self) -> u64 {
        self.not_ready_drops
    }
}
