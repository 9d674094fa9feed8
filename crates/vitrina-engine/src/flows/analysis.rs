// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Card analysis flow: one card image in, a click-through review out,
//! leaving the improvement bridge armed.

use tracing::info;

use vitrina_core::types::{
    ConversationState, Feature, InteractionRecord, MediaRef, RecordKind, Step, User,
};
use vitrina_core::VitrinaError;

use crate::dispatcher::Dispatcher;
use crate::flows::{chunk_text, ImprovementPayload, MESSAGE_CHUNK_CHARS};
use crate::progress::ProgressIndicator;
use crate::prompts;
use crate::strings;

impl Dispatcher {
    /// Handles the `(analysis, awaiting_image)` step.
    pub(crate) async fn handle_analysis_image(
        &self,
        user: &User,
        media: &MediaRef,
    ) -> Result<(), VitrinaError> {
        if !self
            .ledger
            .check_sufficient(user.id, Feature::Analysis)
            .await?
        {
            return Err(VitrinaError::InsufficientBalance {
                required: self.ledger.cost(Feature::Analysis),
                balance: user.balance,
            });
        }

        let image = self.download_image(media).await?;

        let indicator = ProgressIndicator::start(
            self.transport.clone(),
            user.id,
            &self.settings.glyphs,
            self.settings.interval,
        )
        .await;
        let result = self
            .backend
            .generate_text(prompts::ANALYSIS_PROMPT, std::slice::from_ref(&image))
            .await;
        indicator.stop().await;
        let analysis = result?;

        let balance = self.ledger.deduct(user.id, Feature::Analysis).await?;

        // Arm the improvement bridge: the analysis and the original image
        // reference are carried in the state payload, not in history.
        let payload = ImprovementPayload {
            analysis: analysis.clone(),
            image_ref: media.clone(),
        };
        let state = ConversationState::new(user.id, Feature::Improvement, Step::Ready)
            .with_payload(serde_json::to_value(&payload).map_err(|e| {
                VitrinaError::Internal(format!("failed to serialize improvement payload: {e}"))
            })?);
        self.store.set_state(&state).await?;

        self.store
            .append_record(
                &InteractionRecord::event(
                    user.id,
                    Some(Feature::Analysis),
                    RecordKind::AssistantText,
                )
                .with_content(analysis.clone())
                .with_tokens(self.ledger.cost(Feature::Analysis)),
            )
            .await?;

        let text = format!("{analysis}{}", strings::analysis_footer(balance));
        let buttons = vec![(
            strings::IMPROVE_BUTTON.0.to_string(),
            strings::IMPROVE_BUTTON.1.to_string(),
        )];

        // Long reviews go out in message-sized pieces, in order, with the
        // improve button attached to the final one.
        let mut chunks = chunk_text(&text, MESSAGE_CHUNK_CHARS);
        let tail = chunks.pop().unwrap_or_default();
        for chunk in &chunks {
            self.transport.send_text(user.id, chunk).await?;
        }
        self.transport.send_menu(user.id, &tail, &buttons).await?;

        info!(user = %user.id, balance, "card analyzed");
        Ok(())
    }
}
