// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Vitrina workspace.
//!
//! Feature, step, and record-kind tags are closed enums serialized in
//! snake_case both by serde and by their `Display`/`FromStr` impls, so the
//! same spelling lands in the database, the logs, and the config file.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Opaque stable user identifier assigned by the chat transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique identifier for a message already delivered to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Reference to a media object held by the transport, resolvable to raw
/// bytes via [`ChatTransport::download`](crate::traits::ChatTransport::download).
///
/// `size_bytes` is reported by the transport before download, so the size
/// ceiling can be enforced without fetching the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub file_id: String,
    pub size_bytes: u64,
}

/// Raw image bytes plus mime type, as passed to the AI backend.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// The multi-step feature flow that owns a conversation state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Product-card image generation from text and reference images.
    Generation,
    /// Click-through-potential analysis of a product card image.
    Analysis,
    /// Regeneration of a card from a completed analysis.
    Improvement,
}

/// The waypoint within a flow indicating what input is currently expected.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Generation: waiting for a prompt or a captioned image.
    AwaitingInput,
    /// Analysis: waiting for a product card image.
    AwaitingImage,
    /// Improvement: analysis complete, waiting for the improve button.
    Ready,
}

/// Kind tag for an interaction record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Command,
    Button,
    UserText,
    UserMedia,
    AssistantText,
    AssistantMedia,
    Error,
}

/// Identity fields carried on every inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: Option<String>,
    pub username: Option<String>,
}

/// A durable user row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub balance: i64,
    pub created_at: String,
    pub last_active: String,
}

/// The single active conversation state for a user.
///
/// At most one row exists per user; writing a new state fully replaces any
/// prior one. `payload` is an opaque structured bag owned by the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationState {
    pub user_id: UserId,
    pub feature: Feature,
    pub step: Step,
    pub payload: serde_json::Value,
}

impl ConversationState {
    pub fn new(user_id: UserId, feature: Feature, step: Step) -> Self {
        Self {
            user_id,
            feature,
            step,
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Append-only log entry describing one interaction.
///
/// Immutable once written; used for analytics and debugging, never read
/// back to drive behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionRecord {
    pub user_id: UserId,
    pub feature: Option<Feature>,
    pub kind: RecordKind,
    pub content: Option<String>,
    pub media_count: u32,
    pub tokens_used: i64,
    pub success: bool,
    pub metadata: Option<serde_json::Value>,
}

impl InteractionRecord {
    /// A successful record with no tokens charged and no media.
    pub fn event(user_id: UserId, feature: Option<Feature>, kind: RecordKind) -> Self {
        Self {
            user_id,
            feature,
            kind,
            content: None,
            media_count: 0,
            tokens_used: 0,
            success: true,
            metadata: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_media_count(mut self, count: u32) -> Self {
        self.media_count = count;
        self
    }

    pub fn with_tokens(mut self, tokens: i64) -> Self {
        self.tokens_used = tokens;
        self
    }

    pub fn failed(mut self) -> Self {
        self.success = false;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Content of an inbound chat event.
#[derive(Debug, Clone)]
pub enum EventContent {
    /// A slash command, without the leading slash (e.g. "start").
    Command(String),
    /// An inline button activation carrying its callback tag.
    Button(String),
    /// A plain text message.
    Text(String),
    /// One or more media items (an album arrives as a single event) with
    /// an optional caption.
    Media {
        media: Vec<MediaRef>,
        caption: Option<String>,
    },
}

/// One inbound event delivered by the chat transport.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub user: UserProfile,
    pub content: EventContent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn tag_enums_round_trip_snake_case() {
        assert_eq!(Feature::Generation.to_string(), "generation");
        assert_eq!(Step::AwaitingImage.to_string(), "awaiting_image");
        assert_eq!(RecordKind::AssistantMedia.to_string(), "assistant_media");

        assert_eq!(Feature::from_str("analysis").unwrap(), Feature::Analysis);
        assert_eq!(Step::from_str("ready").unwrap(), Step::Ready);
        assert_eq!(RecordKind::from_str("user_text").unwrap(), RecordKind::UserText);
    }

    #[test]
    fn serde_matches_display_spelling() {
        let json = serde_json::to_string(&Feature::Improvement).unwrap();
        assert_eq!(json, "\"improvement\"");
        let step: Step = serde_json::from_str("\"awaiting_input\"").unwrap();
        assert_eq!(step, Step::AwaitingInput);
    }

    #[test]
    fn conversation_state_builder() {
        let state = ConversationState::new(UserId(7), Feature::Analysis, Step::AwaitingImage)
            .with_payload(serde_json::json!({"k": "v"}));
        assert_eq!(state.user_id, UserId(7));
        assert_eq!(state.payload["k"], "v");
    }

    #[test]
    fn record_builder_defaults() {
        let rec = InteractionRecord::event(UserId(1), Some(Feature::Generation), RecordKind::Button);
        assert!(rec.success);
        assert_eq!(rec.tokens_used, 0);
        assert_eq!(rec.media_count, 0);

        let rec = rec.with_tokens(10).with_media_count(2).failed();
        assert!(!rec.success);
        assert_eq!(rec.tokens_used, 10);
    }
}
