// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for a `generateContent`-compatible API.
//!
//! Handles request construction, bearer authentication, and transient
//! error retry. Model selection is per call: the same client serves the
//! image model, the text model, and the classifier model.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use vitrina_config::model::BackendConfig;
use vitrina_core::VitrinaError;

use crate::types::{ApiErrorResponse, GenerateRequest, GenerateResponse};

/// HTTP client for the generative API.
///
/// Manages the bearer header, connection pooling, and a single retry on
/// transient errors (429, 500, 503).
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl GeminiClient {
    /// Creates a client from the backend configuration.
    ///
    /// Fails when no API key is configured or the key is not a valid
    /// header value.
    pub fn new(config: &BackendConfig) -> Result<Self, VitrinaError> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| VitrinaError::Config("backend.api_key is not set".into()))?;

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| VitrinaError::Config(format!("invalid API key header value: {e}")))?;
        auth.set_sensitive(true);
        headers.insert("authorization", auth);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VitrinaError::Backend {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: 1,
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Sends one generateContent request against the named model.
    ///
    /// On transient errors (429, 500, 503), retries once after a 1-second delay.
    pub async fn generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, VitrinaError> {
        let url = format!("{}/{}:generateContent", self.base_url, model);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, model, "retrying backend request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&url)
                .json(request)
                .send()
                .await
                .map_err(|e| VitrinaError::Backend {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, model, "backend response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| VitrinaError::Backend {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                return serde_json::from_str(&body).map_err(|e| VitrinaError::Backend {
                    message: format!("failed to parse API response: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(VitrinaError::Backend {
                    message: format!("API returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            // Non-transient error or exhausted retries.
            let body = response.text().await.unwrap_or_default();
            let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body) {
                format!("API error ({}): {}", api_err.error.code, api_err.error.message)
            } else {
                format!("API returned {status}: {body}")
            };
            return Err(VitrinaError::Backend {
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| VitrinaError::Backend {
            message: "backend request failed after retries".into(),
            source: None,
        }))
    }
}

/// True for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}
