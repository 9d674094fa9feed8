// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gemini-compatible backend adapter for the Vitrina bot.
//!
//! Implements [`AiBackend`] over a `generateContent` HTTP API (image and
//! text generation) and [`IntentClassifier`] over a lightweight instruction
//! model answering yes/no.

pub mod client;
pub mod types;

use async_trait::async_trait;
use tracing::{debug, warn};

use vitrina_config::model::BackendConfig;
use vitrina_core::types::ImageData;
use vitrina_core::{AiBackend, IntentClassifier, VitrinaError};

pub use client::GeminiClient;

use crate::types::{Content, GenerateRequest, GenerationConfig, ImageConfig, Part};

/// Product cards are rendered portrait at marketplace resolution.
const IMAGE_ASPECT_RATIO: &str = "3:4";
const IMAGE_SIZE: &str = "2K";

/// Cap on classifier output; a yes/no answer never needs more.
const CLASSIFIER_MAX_TOKENS: u32 = 10;

fn multimodal_content(prompt: &str, images: &[ImageData]) -> Vec<Content> {
    let mut parts = Vec::with_capacity(1 + images.len());
    parts.push(Part::text(prompt));
    parts.extend(images.iter().map(Part::image));
    vec![Content { parts }]
}

/// Generative backend over the configured image and text models.
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: GeminiClient,
    image_model: String,
    text_model: String,
}

impl GeminiBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, VitrinaError> {
        Ok(Self {
            client: GeminiClient::new(config)?,
            image_model: config.image_model.clone(),
            text_model: config.text_model.clone(),
        })
    }

    /// Builds a backend over an existing client (shared connection pool).
    pub fn with_client(client: GeminiClient, config: &BackendConfig) -> Self {
        Self {
            client,
            image_model: config.image_model.clone(),
            text_model: config.text_model.clone(),
        }
    }
}

#[async_trait]
impl AiBackend for GeminiBackend {
    async fn generate_image(
        &self,
        prompt: &str,
        images: &[ImageData],
    ) -> Result<Vec<u8>, VitrinaError> {
        let request = GenerateRequest {
            contents: multimodal_content(prompt, images),
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["IMAGE".into(), "TEXT".into()]),
                image_config: Some(ImageConfig {
                    aspect_ratio: IMAGE_ASPECT_RATIO.into(),
                    image_size: IMAGE_SIZE.into(),
                }),
                ..GenerationConfig::default()
            }),
        };

        debug!(model = %self.image_model, references = images.len(), "requesting image generation");
        let response = self.client.generate(&self.image_model, &request).await?;

        let inline = response.first_image().ok_or_else(|| VitrinaError::Backend {
            message: "response contained no image".into(),
            source: None,
        })?;
        inline.decode().map_err(|e| VitrinaError::Backend {
            message: format!("image payload is not valid base64: {e}"),
            source: Some(Box::new(e)),
        })
    }

    async fn generate_text(
        &self,
        prompt: &str,
        images: &[ImageData],
    ) -> Result<String, VitrinaError> {
        let request = GenerateRequest {
            contents: multimodal_content(prompt, images),
            generation_config: None,
        };

        debug!(model = %self.text_model, images = images.len(), "requesting text generation");
        let response = self.client.generate(&self.text_model, &request).await?;

        response.text().ok_or_else(|| VitrinaError::Backend {
            message: "response contained no text".into(),
            source: None,
        })
    }
}

/// Yes/no intent classifier over a lightweight instruction model.
///
/// Classification is advisory: any backend failure degrades to a negative
/// answer instead of failing the flow that asked.
#[derive(Debug, Clone)]
pub struct GeminiClassifier {
    client: GeminiClient,
    model: String,
}

impl GeminiClassifier {
    pub fn new(config: &BackendConfig) -> Result<Self, VitrinaError> {
        Ok(Self {
            client: GeminiClient::new(config)?,
            model: config.classifier_model.clone(),
        })
    }

    pub fn with_client(client: GeminiClient, config: &BackendConfig) -> Self {
        Self {
            client,
            model: config.classifier_model.clone(),
        }
    }

    fn classifier_prompt(request: &str) -> String {
        format!(
            "You are a binary classifier. The user sent a request to an assistant \
             that edits product card images for online marketplaces. Answer strictly \
             \"yes\" or \"no\": is the user asking to improve the card's click-through \
             rate, attractiveness, or sales performance (as opposed to a concrete \
             visual edit)?\n\nUser request: {request}\n\nAnswer:"
        )
    }
}

#[async_trait]
impl IntentClassifier for GeminiClassifier {
    async fn wants_ctr_boost(&self, prompt: &str) -> Result<bool, VitrinaError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part::text(Self::classifier_prompt(prompt))],
            }],
            generation_config: Some(GenerationConfig {
                temperature: Some(0.0),
                max_output_tokens: Some(CLASSIFIER_MAX_TOKENS),
                ..GenerationConfig::default()
            }),
        };

        let answer = match self.client.generate(&self.model, &request).await {
            Ok(response) => response.text().unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "intent classification failed, defaulting to negative");
                return Ok(false);
            }
        };

        let positive = answer.trim().to_lowercase().starts_with("yes");
        debug!(answer = %answer.trim(), positive, "intent classified");
        Ok(positive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> BackendConfig {
        BackendConfig {
            api_key: Some("test-key".into()),
            ..BackendConfig::default()
        }
    }

    fn backend_for(server: &MockServer) -> GeminiBackend {
        let config = test_config();
        let client = GeminiClient::new(&config)
            .unwrap()
            .with_base_url(server.uri());
        GeminiBackend::with_client(client, &config)
    }

    fn classifier_for(server: &MockServer) -> GeminiClassifier {
        let config = test_config();
        let client = GeminiClient::new(&config)
            .unwrap()
            .with_base_url(server.uri());
        GeminiClassifier::with_client(client, &config)
    }

    #[tokio::test]
    async fn generate_image_sends_modalities_and_decodes_payload() {
        let server = MockServer::start().await;
        let png = vec![0x89u8, b'P', b'N', b'G'];
        let body = serde_json::json!({
            "candidates": [{"content": {"parts": [
                {"inlineData": {"mimeType": "image/png", "data": BASE64.encode(&png)}}
            ]}}]
        });

        Mock::given(method("POST"))
            .and(path("/gemini-3-pro-image-preview-2k:generateContent"))
            .and(body_partial_json(serde_json::json!({
                "generationConfig": {
                    "responseModalities": ["IMAGE", "TEXT"],
                    "imageConfig": {"aspectRatio": "3:4", "imageSize": "2K"}
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let bytes = backend.generate_image("a red card", &[]).await.unwrap();
        assert_eq!(bytes, png);
    }

    #[tokio::test]
    async fn generate_image_without_image_part_is_a_backend_error() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "cannot comply"}]}}]
        });
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let err = backend.generate_image("a card", &[]).await.unwrap_err();
        assert!(matches!(err, VitrinaError::Backend { .. }));
    }

    #[tokio::test]
    async fn generate_text_embeds_reference_images() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "analysis here"}]}}]
        });
        let image = ImageData {
            data: vec![1, 2, 3],
            mime_type: "image/jpeg".into(),
        };

        Mock::given(method("POST"))
            .and(path("/gemini-3-flash-preview:generateContent"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"parts": [
                    {"text": "analyze this"},
                    {"inlineData": {"mimeType": "image/jpeg", "data": BASE64.encode([1, 2, 3])}}
                ]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let text = backend
            .generate_text("analyze this", std::slice::from_ref(&image))
            .await
            .unwrap();
        assert_eq!(text, "analysis here");
    }

    #[tokio::test]
    async fn classifier_parses_affirmative_answers() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "Yes, clearly."}]}}]
        });

        Mock::given(method("POST"))
            .and(path("/gemma-3-12b-it:generateContent"))
            .and(body_partial_json(serde_json::json!({
                "generationConfig": {"temperature": 0.0, "maxOutputTokens": 10}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let classifier = classifier_for(&server);
        assert!(classifier.wants_ctr_boost("make it sell better").await.unwrap());
    }

    #[tokio::test]
    async fn classifier_defaults_to_negative_on_backend_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .mount(&server)
            .await;

        let classifier = classifier_for(&server);
        assert!(!classifier.wants_ctr_boost("make it pop").await.unwrap());
    }

    #[tokio::test]
    async fn classifier_treats_non_yes_as_negative() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "no"}]}}]
        });
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let classifier = classifier_for(&server);
        assert!(!classifier.wants_ctr_boost("add a blue background").await.unwrap());
    }
}
