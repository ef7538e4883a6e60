//! Relay eligibility filter.
//!
//! Cheap field-based predicate deciding whether an inbound Discord event
//! is relayed at all. Webhook messages pass even though Discord flags
//! them as bots, so RSS/news webhooks get through while ordinary bot
//! noise is suppressed.

use crate::common::types::{DiscordId, InboundEvent};

/// Everything the filter needs to know besides the event itself.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext {
    /// The one channel the bridge relays from.
    pub source_channel: DiscordId,
    /// Our own Discord user id, for loop prevention.
    pub self_id: DiscordId,
}

/// Whether the event is eligible for relaying.
///
/// Accepts iff the event is in the configured channel, was not authored
/// by the bridge itself, and is not from a non-webhook bot.
pub fn should_forward(event: &InboundEvent, ctx: &FilterContext) -> bool {
    if event.channel_id != ctx.source_channel {
        return false;
    }

    // Hard loop prevention: never relay anything we emitted ourselves.
    if event.author_id == ctx.self_id {
        return false;
    }

    if event.author_is_bot && !event.from_webhook {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANNEL: DiscordId = 100;
    const SELF: DiscordId = 7;

    fn ctx() -> FilterContext {
        FilterContext {
            source_channel: CHANNEL,
            self_id: SELF,
        }
    }

    fn event() -> InboundEvent {
        InboundEvent {
            channel_id: CHANNEL,
            author_id: 42,
            content: "hi".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_plain_user_message_accepted() {
        assert!(should_forward(&event(), &ctx()));
    }

    #[test]
    fn test_wrong_channel_rejected() {
        let mut e = event();
        e.channel_id = CHANNEL + 1;
        assert!(!should_forward(&e, &ctx()));
    }

    #[test]
    fn test_own_messages_always_rejected() {
        let mut e = event();
        e.author_id = SELF;
        assert!(!should_forward(&e, &ctx()));

        // Even a webhook-flagged event from our own id stays rejected.
        e.from_webhook = true;
        assert!(!should_forward(&e, &ctx()));
    }

    #[test]
    fn test_generic_bot_rejected() {
        let mut e = event();
        e.author_is_bot = true;
        assert!(!should_forward(&e, &ctx()));
    }

    #[test]
    fn test_webhook_bot_accepted() {
        let mut e = event();
        e.author_is_bot = true;
        e.from_webhook = true;
        assert!(should_forward(&e, &ctx()));
    }

    #[test]
    fn test_webhook_in_wrong_channel_rejected() {
        let mut e = event();
        e.author_is_bot = true;
        e.from_webhook = true;
        e.channel_id = CHANNEL + 1;
        assert!(!should_forward(&e, &ctx()));
    }
}
