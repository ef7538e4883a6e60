//! Message normalization.
//!
//! Flattens a Discord message (body, embeds, attachment links) into a
//! single plain-text payload for WhatsApp. Fragments are deduplicated by
//! exact string equality, first occurrence wins, and joined with a blank
//! line. An empty result means there is nothing to forward.

use std::collections::HashSet;

use crate::common::types::InboundEvent;

/// Flatten an accepted event into the outbound text payload.
pub fn normalize(event: &InboundEvent) -> String {
    let mut fragments: Vec<String> = Vec::new();

    let body = event.content.trim();
    if !body.is_empty() {
        fragments.push(body.to_string());
    }

    // Embeds (e.g. news webhooks): title + url + description, one
    // fragment per embed, skipping embeds that are entirely empty.
    for embed in &event.embeds {
        let fragment = [&embed.title, &embed.url, &embed.description]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        if !fragment.is_empty() {
            fragments.push(fragment);
        }
    }

    // Attachments go out as raw links.
    for url in &event.attachments {
        if !url.is_empty() {
            fragments.push(url.clone());
        }
    }

    // Dedup by exact fragment equality, preserving first-seen order.
    // Deliberately not substring-aware: an attachment URL that also
    // appears inside a larger embed fragment is kept.
    let mut seen = HashSet::new();
    fragments.retain(|fragment| seen.insert(fragment.clone()));

    fragments.join("\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::EmbedRecord;

    fn embed(title: &str, url: &str, description: &str) -> EmbedRecord {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        EmbedRecord {
            title: opt(title),
            url: opt(url),
            description: opt(description),
        }
    }

    #[test]
    fn test_plain_body_passes_through_unchanged() {
        let event = InboundEvent {
            content: "Hello world".to_string(),
            ..Default::default()
        };
        assert_eq!(normalize(&event), "Hello world");
    }

    #[test]
    fn test_idempotent_on_normalized_input() {
        let event = InboundEvent {
            content: "already clean".to_string(),
            ..Default::default()
        };
        let once = normalize(&event);
        let again = normalize(&InboundEvent {
            content: once.clone(),
            ..Default::default()
        });
        assert_eq!(once, again);
    }

    #[test]
    fn test_body_is_trimmed() {
        let event = InboundEvent {
            content: "  padded  ".to_string(),
            ..Default::default()
        };
        assert_eq!(normalize(&event), "padded");
    }

    #[test]
    fn test_empty_event_yields_empty_string() {
        assert_eq!(normalize(&InboundEvent::default()), "");
    }

    #[test]
    fn test_whitespace_only_body_yields_empty_string() {
        let event = InboundEvent {
            content: "   \n  ".to_string(),
            ..Default::default()
        };
        assert_eq!(normalize(&event), "");
    }

    #[test]
    fn test_embed_fields_joined_with_newlines() {
        let event = InboundEvent {
            embeds: vec![embed("Title", "http://x", "Desc")],
            ..Default::default()
        };
        assert_eq!(normalize(&event), "Title\nhttp://x\nDesc");
    }

    #[test]
    fn test_empty_embed_skipped() {
        let event = InboundEvent {
            content: "body".to_string(),
            embeds: vec![embed("", "", ""), embed("  ", "", "")],
            ..Default::default()
        };
        assert_eq!(normalize(&event), "body");
    }

    #[test]
    fn test_fragments_joined_with_blank_line() {
        let event = InboundEvent {
            content: "Hello".to_string(),
            embeds: vec![embed("T", "http://x", "")],
            ..Default::default()
        };
        assert_eq!(normalize(&event), "Hello\n\nT\nhttp://x");
    }

    #[test]
    fn test_attachment_inside_embed_fragment_is_not_a_duplicate() {
        // The attachment equals the embed's url field, but dedup works on
        // whole fragments: "T\nhttp://x" != "http://x", so both survive.
        let event = InboundEvent {
            content: "Hello".to_string(),
            embeds: vec![embed("T", "http://x", "")],
            attachments: vec!["http://x".to_string()],
            ..Default::default()
        };
        assert_eq!(normalize(&event), "Hello\n\nT\nhttp://x\n\nhttp://x");
    }

    #[test]
    fn test_attachment_equal_to_whole_embed_fragment_is_deduplicated() {
        // An embed reduced to just its url produces the fragment
        // "http://x", which the identical attachment then collapses into.
        let event = InboundEvent {
            content: "Hello".to_string(),
            embeds: vec![embed("", "http://x", "")],
            attachments: vec!["http://x".to_string()],
            ..Default::default()
        };
        assert_eq!(normalize(&event), "Hello\n\nhttp://x");
    }

    #[test]
    fn test_duplicate_fragments_collapse_keeping_first_seen_order() {
        let event = InboundEvent {
            content: "a".to_string(),
            attachments: vec![
                "b".to_string(),
                "a".to_string(),
                "b".to_string(),
                "c".to_string(),
            ],
            ..Default::default()
        };
        assert_eq!(normalize(&event), "a\n\nb\n\nc");
    }

    #[test]
    fn test_duplicate_body_and_attachment_collapse() {
        let event = InboundEvent {
            content: "http://x".to_string(),
            attachments: vec!["http://x".to_string()],
            ..Default::default()
        };
        assert_eq!(normalize(&event), "http://x");
    }

    #[test]
    fn test_multiple_embeds_in_source_order() {
        let event = InboundEvent {
            embeds: vec![embed("First", "", ""), embed("Second", "", "")],
            ..Default::default()
        };
        assert_eq!(normalize(&event), "First\n\nSecond");
    }
}
