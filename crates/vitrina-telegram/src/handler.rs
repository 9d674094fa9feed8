// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Update filtering and conversion into engine events.
//!
//! Incoming Telegram messages and callback queries are filtered (DMs only,
//! optional allow-list) and converted into [`InboundEvent`]s. Photo albums
//! arrive as separate messages sharing a `media_group_id`; the
//! [`AlbumBuffer`] collects them for a settle period and emits one event.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::ChatKind;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use vitrina_core::types::{EventContent, InboundEvent, MediaRef, UserId, UserProfile};

use crate::media;

/// How long to wait for the remaining photos of an album after the first
/// one arrives. Telegram delivers album parts back to back.
const ALBUM_SETTLE: Duration = Duration::from_millis(800);

/// Whether the sender may use the bot.
///
/// An empty allow-list means the bot is public. Entries match the numeric
/// user id or the username, with or without a leading `@`.
pub fn is_allowed(user: &teloxide::types::User, allowed_users: &[String]) -> bool {
    if allowed_users.is_empty() {
        return true;
    }

    let id = user.id.0.to_string();
    allowed_users.iter().any(|allowed| {
        if *allowed == id {
            return true;
        }
        let allowed = allowed.strip_prefix('@').unwrap_or(allowed);
        user.username
            .as_deref()
            .is_some_and(|name| name.eq_ignore_ascii_case(allowed))
    })
}

/// Whether the message came from a private (DM) chat.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Maps a Telegram user to the engine's identity fields.
pub fn profile_of(user: &teloxide::types::User) -> UserProfile {
    UserProfile {
        id: UserId(user.id.0 as i64),
        display_name: Some(user.full_name()),
        username: user.username.clone(),
    }
}

/// Parses `/command@botname args` into the bare command name.
pub fn parse_command(text: &str) -> Option<String> {
    let rest = text.strip_prefix('/')?;
    let first = rest.split_whitespace().next()?;
    let name = first.split('@').next()?;
    if name.is_empty() {
        return None;
    }
    Some(name.to_string())
}

/// What a single message contributes.
pub enum Extracted {
    /// A complete event, ready for dispatch.
    Event(EventContent),
    /// One photo of a multi-message album.
    AlbumPart {
        group_id: String,
        media: MediaRef,
        caption: Option<String>,
    },
    /// Stickers, voice, locations and other unsupported content.
    Unsupported,
}

/// Converts message content, without touching the network.
pub fn extract_content(msg: &Message) -> Extracted {
    if let Some(text) = msg.text() {
        return match parse_command(text) {
            Some(command) => Extracted::Event(EventContent::Command(command)),
            None => Extracted::Event(EventContent::Text(text.to_string())),
        };
    }

    if let Some(photos) = msg.photo() {
        let Some(media) = media::photo_media_ref(photos) else {
            return Extracted::Unsupported;
        };
        let caption = msg.caption().map(str::to_string);
        return match msg.media_group_id() {
            Some(group) => Extracted::AlbumPart {
                group_id: group.to_string(),
                media,
                caption,
            },
            None => Extracted::Event(EventContent::Media {
                media: vec![media],
                caption,
            }),
        };
    }

    debug!(msg_id = msg.id.0, "ignoring unsupported message type");
    Extracted::Unsupported
}

struct PendingAlbum {
    user: UserProfile,
    media: Vec<MediaRef>,
    caption: Option<String>,
}

/// Collects the parts of a photo album into one media event.
#[derive(Default)]
pub struct AlbumBuffer {
    pending: Mutex<HashMap<String, PendingAlbum>>,
}

impl AlbumBuffer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Adds one album part. The first part of a group arms a flush task
    /// that emits the collected event after the settle period.
    pub fn add(
        self: &Arc<Self>,
        tx: mpsc::Sender<InboundEvent>,
        user: UserProfile,
        group_id: String,
        media: MediaRef,
        caption: Option<String>,
    ) {
        let is_first = {
            let mut pending = self
                .pending
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            match pending.get_mut(&group_id) {
                Some(album) => {
                    album.media.push(media);
                    if album.caption.is_none() {
                        album.caption = caption;
                    }
                    false
                }
                None => {
                    pending.insert(
                        group_id.clone(),
                        PendingAlbum {
                            user,
                            media: vec![media],
                            caption,
                        },
                    );
                    true
                }
            }
        };

        if !is_first {
            return;
        }

        let buffer = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(ALBUM_SETTLE).await;
            let album = buffer
                .pending
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .remove(&group_id);
            if let Some(album) = album {
                debug!(group_id, photos = album.media.len(), "album settled");
                let event = InboundEvent {
                    user: album.user,
                    content: EventContent::Media {
                        media: album.media,
                        caption: album.caption,
                    },
                };
                if tx.send(event).await.is_err() {
                    warn!("inbound channel closed, dropping album");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_user(id: u64, username: Option<&str>) -> teloxide::types::User {
        let mut json = serde_json::json!({
            "id": id,
            "is_bot": false,
            "first_name": "Test",
        });
        if let Some(name) = username {
            json["username"] = serde_json::Value::String(name.to_string());
        }
        serde_json::from_value(json).unwrap()
    }

    fn make_text_message(text: &str) -> Message {
        serde_json::from_value(serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": {"id": 12345i64, "type": "private", "first_name": "Test"},
            "from": {"id": 12345u64, "is_bot": false, "first_name": "Test"},
            "text": text,
        }))
        .unwrap()
    }

    fn make_photo_message(caption: Option<&str>, group: Option<&str>) -> Message {
        let mut json = serde_json::json!({
            "message_id": 2,
            "date": 1700000000i64,
            "chat": {"id": 12345i64, "type": "private", "first_name": "Test"},
            "from": {"id": 12345u64, "is_bot": false, "first_name": "Test"},
            "photo": [
                {"file_id": "f1", "file_unique_id": "u1", "width": 90, "height": 120, "file_size": 1000},
                {"file_id": "f2", "file_unique_id": "u2", "width": 900, "height": 1200, "file_size": 90000}
            ],
        });
        if let Some(caption) = caption {
            json["caption"] = serde_json::Value::String(caption.to_string());
        }
        if let Some(group) = group {
            json["media_group_id"] = serde_json::Value::String(group.to_string());
        }
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn empty_allow_list_means_public() {
        let user = make_user(1, Some("anyone"));
        assert!(is_allowed(&user, &[]));
    }

    #[test]
    fn allow_list_matches_id_and_username() {
        let user = make_user(42, Some("Seller"));
        assert!(is_allowed(&user, &["42".into()]));
        assert!(is_allowed(&user, &["@seller".into()]));
        assert!(!is_allowed(&user, &["99".into(), "@other".into()]));
    }

    #[test]
    fn command_parsing_strips_bot_suffix_and_args() {
        assert_eq!(parse_command("/start").as_deref(), Some("start"));
        assert_eq!(parse_command("/start@vitrina_bot now").as_deref(), Some("start"));
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command("/"), None);
    }

    #[test]
    fn text_extraction_distinguishes_commands() {
        match extract_content(&make_text_message("/start")) {
            Extracted::Event(EventContent::Command(c)) => assert_eq!(c, "start"),
            _ => panic!("expected command"),
        }
        match extract_content(&make_text_message("red mug")) {
            Extracted::Event(EventContent::Text(t)) => assert_eq!(t, "red mug"),
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn single_photo_becomes_a_media_event() {
        match extract_content(&make_photo_message(Some("a mug"), None)) {
            Extracted::Event(EventContent::Media { media, caption }) => {
                assert_eq!(media.len(), 1);
                assert_eq!(media[0].file_id, "f2");
                assert_eq!(caption.as_deref(), Some("a mug"));
            }
            _ => panic!("expected media event"),
        }
    }

    #[test]
    fn album_photo_becomes_an_album_part() {
        match extract_content(&make_photo_message(None, Some("g1"))) {
            Extracted::AlbumPart { group_id, media, .. } => {
                assert_eq!(group_id, "g1");
                assert_eq!(media.file_id, "f2");
            }
            _ => panic!("expected album part"),
        }
    }

    #[tokio::test]
    async fn album_buffer_emits_one_event_with_all_parts() {
        let buffer = AlbumBuffer::new();
        let (tx, mut rx) = mpsc::channel(8);
        let user = profile_of(&make_user(1, None));

        for i in 0..3 {
            let media = MediaRef {
                file_id: format!("f{i}"),
                size_bytes: 1000,
            };
            let caption = (i == 0).then(|| "the caption".to_string());
            buffer.add(tx.clone(), user.clone(), "g1".into(), media, caption);
        }

        let event = tokio::time::timeout(Duration::from_secs(3), rx.recv())
            .await
            .unwrap()
            .unwrap();
        match event.content {
            EventContent::Media { media, caption } => {
                assert_eq!(media.len(), 3);
                assert_eq!(caption.as_deref(), Some("the caption"));
            }
            _ => panic!("expected media event"),
        }
        assert!(rx.try_recv().is_err());
    }
}
