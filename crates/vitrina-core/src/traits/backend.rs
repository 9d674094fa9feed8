// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AI backend traits: generative and classification services.

use async_trait::async_trait;

use crate::error::VitrinaError;
use crate::types::ImageData;

/// Generative backend: multimodal prompt in, one image or one text out.
#[async_trait]
pub trait AiBackend: Send + Sync {
    /// Generates a single image from a prompt and 0..N reference images.
    async fn generate_image(
        &self,
        prompt: &str,
        images: &[ImageData],
    ) -> Result<Vec<u8>, VitrinaError>;

    /// Generates text from a prompt and 0..N images (used by the analysis flow).
    async fn generate_text(
        &self,
        prompt: &str,
        images: &[ImageData],
    ) -> Result<String, VitrinaError>;
}

/// Lightweight intent classifier consulted before image generation.
///
/// Callers only invoke this when at least one reference image is present;
/// with no images there is nothing to improve and the signal defaults to
/// negative without a backend call.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Whether the user's request is asking for click-through optimization.
    async fn wants_ctr_boost(&self, prompt: &str) -> Result<bool, VitrinaError>;
}
