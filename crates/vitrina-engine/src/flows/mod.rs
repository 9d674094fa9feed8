// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Feature flows, implemented as handler methods on the dispatcher.

mod analysis;
mod generation;
mod improvement;

pub(crate) use improvement::ImprovementPayload;

use vitrina_core::types::{ImageData, MediaRef};
use vitrina_core::VitrinaError;

use crate::dispatcher::Dispatcher;

/// Chat photos arrive JPEG-encoded.
pub(crate) const PHOTO_MIME: &str = "image/jpeg";

/// Telegram rejects messages longer than 4096 characters.
pub(crate) const MESSAGE_CHUNK_CHARS: usize = 4096;

/// Splits `text` into pieces of at most `max_chars` characters, preserving
/// order. Always returns at least one piece.
pub(crate) fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;
    for ch in text.chars() {
        if count == max_chars {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
        current.push(ch);
        count += 1;
    }
    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}

impl Dispatcher {
    /// Resolves a media reference into backend-ready image data.
    pub(crate) async fn download_image(&self, media: &MediaRef) -> Result<ImageData, VitrinaError> {
        let data = self.transport.download(media).await?;
        Ok(ImageData {
            data,
            mime_type: PHOTO_MIME.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::chunk_text;

    #[test]
    fn short_text_stays_whole() {
        assert_eq!(chunk_text("hello", 10), vec!["hello"]);
    }

    #[test]
    fn empty_text_yields_one_empty_piece() {
        assert_eq!(chunk_text("", 10), vec![""]);
    }

    #[test]
    fn exact_multiple_produces_no_trailing_empty_piece() {
        assert_eq!(chunk_text("abcdef", 3), vec!["abc", "def"]);
    }

    #[test]
    fn splits_on_character_boundaries_not_bytes() {
        // Each clock glyph is four bytes; a byte split would panic.
        let text = "🕐🕑🕒🕓🕔";
        let chunks = chunk_text(text, 2);
        assert_eq!(chunks, vec!["🕐🕑", "🕒🕓", "🕔"]);
    }
}
