// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Improvement bridge: regenerates a card from the recommendations of a
//! completed analysis.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use vitrina_core::types::{
    ConversationState, Feature, InteractionRecord, MediaRef, RecordKind, Step, User,
};
use vitrina_core::VitrinaError;

use crate::dispatcher::Dispatcher;
use crate::progress::ProgressIndicator;
use crate::prompts;
use crate::strings;

/// State payload written by the analysis flow and consumed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ImprovementPayload {
    pub analysis: String,
    pub image_ref: MediaRef,
}

impl Dispatcher {
    /// Handles the `improve_card` button.
    ///
    /// Only valid with an armed `(improvement, ready)` state; any other
    /// activation (stale button, cleared state) is reported without
    /// touching state or calling the backend.
    pub(crate) async fn handle_improve(
        &self,
        user: &User,
        state: Option<ConversationState>,
    ) -> Result<(), VitrinaError> {
        let Some(state) = state
            .filter(|s| s.feature == Feature::Improvement && s.step == Step::Ready)
        else {
            self.transport
                .send_text(user.id, strings::ANALYSIS_NOT_FOUND)
                .await?;
            return Ok(());
        };

        let payload: ImprovementPayload = match serde_json::from_value(state.payload) {
            Ok(payload) => payload,
            Err(e) => {
                // Unusable leftover state; drop it rather than re-prompting
                // into a dead end.
                warn!(user = %user.id, error = %e, "discarding unreadable improvement payload");
                self.store.clear_state(user.id).await?;
                self.transport
                    .send_text(user.id, strings::ANALYSIS_NOT_FOUND)
                    .await?;
                return Ok(());
            }
        };

        if !self
            .ledger
            .check_sufficient(user.id, Feature::Improvement)
            .await?
        {
            return Err(VitrinaError::InsufficientBalance {
                required: self.ledger.cost(Feature::Improvement),
                balance: user.balance,
            });
        }

        let recommendations = prompts::extract_recommendations(&payload.analysis);
        let prompt = prompts::improvement_prompt(recommendations);
        let image = self.download_image(&payload.image_ref).await?;

        let indicator = ProgressIndicator::start(
            self.transport.clone(),
            user.id,
            &self.settings.glyphs,
            self.settings.interval,
        )
        .await;
        let result = self
            .backend
            .generate_image(&prompt, std::slice::from_ref(&image))
            .await;
        indicator.stop().await;
        let card = result?;

        let balance = self.ledger.deduct(user.id, Feature::Improvement).await?;

        self.store
            .append_record(
                &InteractionRecord::event(
                    user.id,
                    Some(Feature::Improvement),
                    RecordKind::AssistantMedia,
                )
                .with_content(recommendations)
                .with_media_count(1)
                .with_tokens(self.ledger.cost(Feature::Improvement))
                .with_metadata(json!({"source": "analysis"})),
            )
            .await?;

        self.transport
            .send_photo(
                user.id,
                card.clone(),
                Some(&strings::improved_card_delivered(balance)),
            )
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

        info!(user = %user.id, balance, "card improved from analysis");
        Ok(())
    }
}
