// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Card generation flow: prompt text plus optional reference images in,
//! one generated card out.

use serde_json::json;
use tracing::{debug, info};

use vitrina_core::types::{Feature, InteractionRecord, MediaRef, RecordKind, User};
use vitrina_core::VitrinaError;

use crate::dispatcher::Dispatcher;
use crate::progress::ProgressIndicator;
use crate::prompts;
use crate::strings;

impl Dispatcher {
    /// Handles the `(generation, awaiting_input)` step: a prompt, or a
    /// captioned album of reference photos.
    pub(crate) async fn handle_generation_input(
        &self,
        user: &User,
        text: &str,
        media: &[MediaRef],
    ) -> Result<(), VitrinaError> {
        if !self
            .ledger
            .check_sufficient(user.id, Feature::Generation)
            .await?
        {
            return Err(VitrinaError::InsufficientBalance {
                required: self.ledger.cost(Feature::Generation),
                balance: user.balance,
            });
        }

        let limit = self.settings.max_reference_images;
        if media.len() > limit {
            debug!(user = %user.id, sent = media.len(), limit, "extra reference images ignored");
        }
        let mut images = Vec::with_capacity(media.len().min(limit));
        for item in media.iter().take(limit) {
            images.push(self.download_image(item).await?);
        }

        // The classifier is only worth consulting when there is an existing
        // card to improve; plain text prompts are always literal.
        let ctr_boost = if images.is_empty() {
            false
        } else {
            self.classifier.wants_ctr_boost(text).await?
        };

        let mut prompt = text.to_string();
        if ctr_boost {
            prompt.push_str(prompts::CTR_ENHANCEMENT);
        }

        let indicator = ProgressIndicator::start(
            self.transport.clone(),
            user.id,
            &self.settings.glyphs,
            self.settings.interval,
        )
        .await;
        let result = self.backend.generate_image(&prompt, &images).await;
        indicator.stop().await;
        let card = result?;

        let balance = self.ledger.deduct(user.id, Feature::Generation).await?;

        self.store
            .append_record(
                &InteractionRecord::event(
                    user.id,
                    Some(Feature::Generation),
                    RecordKind::AssistantMedia,
                )
                .with_content(text)
                .with_media_count(1)
                .with_tokens(self.ledger.cost(Feature::Generation))
                .with_metadata(json!({
                    "ctr_boost": ctr_boost,
                    "reference_images": images.len(),
                })),
            )
            .await?;

        // Photo for the quick preview, then the same bytes as a document:
        // Telegram recompresses photos and the marketplace upload needs the
        // lossless file.
        self.transport
            .send_photo(user.id, card.clone(), Some(&strings::card_delivered(balance)))
            .await?;
        self.transport
            .send_document(
                user.id,
                card,
                strings::CARD_FILE_NAME,
                Some(strings::ORIGINAL_QUALITY_CAPTION),
            )
            .await?;
        self.store.clear_state(user.id).await?;

        info!(
            user = %user.id,
            references = images.len(),
            ctr_boost,
            balance,
            "card generated"
        );
        Ok(())
    }
}
