// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat transport trait: the opaque bidirectional message channel.

use async_trait::async_trait;

use crate::error::VitrinaError;
use crate::types::{MediaRef, MessageId, UserId};

/// Outbound side of the chat transport.
///
/// Inbound events arrive out of band (the adapter pushes
/// [`InboundEvent`](crate::types::InboundEvent)s into the serve loop); this
/// trait covers everything a handler needs to talk back.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends rich-formatted text.
    ///
    /// Implementations must degrade gracefully: on a formatting-parser
    /// failure the same content is re-sent exactly once as plain text, and
    /// the failure is invisible to the caller.
    async fn send_text(&self, user: UserId, text: &str) -> Result<MessageId, VitrinaError>;

    /// Sends text with a row of inline action buttons `(label, callback tag)`.
    async fn send_menu(
        &self,
        user: UserId,
        text: &str,
        buttons: &[(String, String)],
    ) -> Result<MessageId, VitrinaError>;

    /// Sends an image with an optional caption.
    async fn send_photo(
        &self,
        user: UserId,
        data: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<MessageId, VitrinaError>;

    /// Sends raw bytes as a named document attachment.
    ///
    /// Photos get recompressed by the chat platform; documents arrive
    /// byte-for-byte.
    async fn send_document(
        &self,
        user: UserId,
        data: Vec<u8>,
        file_name: &str,
        caption: Option<&str>,
    ) -> Result<MessageId, VitrinaError>;

    /// Edits the text of a previously sent message.
    async fn edit_text(
        &self,
        user: UserId,
        message: &MessageId,
        text: &str,
    ) -> Result<(), VitrinaError>;

    /// Deletes a previously sent message.
    async fn delete_message(&self, user: UserId, message: &MessageId)
        -> Result<(), VitrinaError>;

    /// Resolves a media reference to its raw bytes.
    async fn download(&self, media: &MediaRef) -> Result<Vec<u8>, VitrinaError>;
}
