// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Photo metadata extraction and file download.

use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{FileId, PhotoSize};
use tracing::debug;

use vitrina_core::types::MediaRef;
use vitrina_core::VitrinaError;

/// Builds a [`MediaRef`] for the largest variant of a Telegram photo.
///
/// Telegram reports several downscaled sizes per photo; the last entry is
/// the original. The reported size lets the engine enforce its ceiling
/// before any download happens.
pub fn photo_media_ref(photos: &[PhotoSize]) -> Option<MediaRef> {
    let largest = photos.last()?;
    Some(MediaRef {
        file_id: largest.file.id.to_string(),
        size_bytes: u64::from(largest.file.size),
    })
}

/// Resolves a file id to its raw bytes via `getFile` plus a file download.
pub async fn download_media(bot: &Bot, media: &MediaRef) -> Result<Vec<u8>, VitrinaError> {
    let file = bot
        .get_file(FileId(media.file_id.clone()))
        .await
        .map_err(|e| VitrinaError::Channel {
            message: format!("failed to resolve file: {e}"),
            source: Some(Box::new(e)),
        })?;

    let mut buf = Vec::with_capacity(media.size_bytes as usize);
    bot.download_file(&file.path, &mut buf)
        .await
        .map_err(|e| VitrinaError::Channel {
            message: format!("failed to download file: {e}"),
            source: Some(Box::new(e)),
        })?;

    debug!(file_id = %media.file_id, size = buf.len(), "downloaded media");
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo_sizes() -> Vec<PhotoSize> {
        serde_json::from_value(serde_json::json!([
            {"file_id": "small", "file_unique_id": "u1", "width": 90, "height": 120, "file_size": 1000},
            {"file_id": "large", "file_unique_id": "u2", "width": 900, "height": 1200, "file_size": 250000}
        ]))
        .unwrap()
    }

    #[test]
    fn picks_the_largest_photo_variant() {
        let media = photo_media_ref(&photo_sizes()).unwrap();
        assert_eq!(media.file_id, "large");
        assert_eq!(media.size_bytes, 250000);
    }

    #[test]
    fn empty_photo_array_yields_none() {
        assert!(photo_media_ref(&[]).is_none());
    }
}
