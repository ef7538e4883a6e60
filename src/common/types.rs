//! Shared types used across the application.

/// Unique identifier for a Discord channel or user.
pub type DiscordId = u64;

/// A single embed record on an inbound Discord message.
///
/// Only the fields the bridge flattens into text are carried; everything
/// else Discord attaches to an embed is dropped at the boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedRecord {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
}

/// A strict record of one inbound Discord message.
///
/// Built at the Discord handler boundary so the filter and normalizer
/// never touch loosely-shaped provider payloads. Lives only for the
/// duration of one event-handler invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundEvent {
    /// Channel the message was posted in.
    pub channel_id: DiscordId,
    /// Author of the message.
    pub author_id: DiscordId,
    /// Whether Discord flags the author as a bot.
    pub author_is_bot: bool,
    /// Whether the message was delivered by a webhook (RSS feeds etc.).
    pub from_webhook: bool,
    /// Raw message body.
    pub content: String,
    /// Embeds in source order.
    pub embeds: Vec<EmbedRecord>,
    /// Attachment URLs in source order.
    pub attachments: Vec<String>,
}

/// Events flowing from the Discord side to the bridge controller.
#[derive(Debug, Clone)]
pub enum SourceEvent {
    /// Gateway session is ready; carries our own user id for loop prevention.
    Ready { self_id: DiscordId },
    /// A message arrived.
    Message(InboundEvent),
}
