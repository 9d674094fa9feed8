// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event dispatcher.
//!
//! Routes one inbound event to the flow whose guard matches the event
//! content and the user's current conversation state, and owns the error
//! boundary: flows propagate [`VitrinaError`], the boundary logs full
//! detail, optionally clears state, appends an error record, and sends the
//! user a short message.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use vitrina_config::model::VitrinaConfig;
use vitrina_core::types::{
    ConversationState, EventContent, Feature, InboundEvent, InteractionRecord, MediaRef,
    RecordKind, Step, User, UserId,
};
use vitrina_core::{AiBackend, ChatTransport, IntentClassifier, Store, VitrinaError};
use vitrina_ledger::{BalanceLedger, CostTable};

use crate::strings;

/// Engine knobs extracted from the configuration.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub starting_balance: i64,
    pub max_reference_images: usize,
    pub max_media_bytes: u64,
    pub glyphs: Vec<String>,
    pub interval: Duration,
}

impl EngineSettings {
    pub fn from_config(config: &VitrinaConfig) -> Self {
        Self {
            starting_balance: config.economy.starting_balance,
            max_reference_images: config.limits.max_reference_images,
            max_media_bytes: config.limits.max_media_bytes,
            glyphs: config.progress.glyphs.clone(),
            interval: Duration::from_millis(config.progress.interval_ms),
        }
    }
}

/// Stateless router over inbound events.
///
/// All conversation state lives in the store; the dispatcher itself can be
/// shared across concurrently handled events.
pub struct Dispatcher {
    pub(crate) store: Arc<dyn Store>,
    pub(crate) transport: Arc<dyn ChatTransport>,
    pub(crate) backend: Arc<dyn AiBackend>,
    pub(crate) classifier: Arc<dyn IntentClassifier>,
    pub(crate) ledger: BalanceLedger,
    pub(crate) settings: EngineSettings,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn Store>,
        transport: Arc<dyn ChatTransport>,
        backend: Arc<dyn AiBackend>,
        classifier: Arc<dyn IntentClassifier>,
        config: &VitrinaConfig,
    ) -> Self {
        let ledger = BalanceLedger::new(store.clone(), CostTable::from_config(&config.economy));
        Self {
            store,
            transport,
            backend,
            classifier,
            ledger,
            settings: EngineSettings::from_config(config),
        }
    }

    /// Handles one inbound event to completion. Never fails: all errors
    /// are absorbed at the boundary.
    pub async fn dispatch(&self, event: InboundEvent) {
        let user_id = event.user.id;
        if let Err(e) = self.handle_event(&event).await {
            self.handle_failure(user_id, e).await;
        }
    }

    async fn handle_event(&self, event: &InboundEvent) -> Result<(), VitrinaError> {
        let user = self
            .store
            .upsert_user(&event.user, self.settings.starting_balance)
            .await?;
        let state = self.store.get_state(user.id).await?;
        self.record_inbound(&user, state.as_ref(), &event.content)
            .await?;

        debug!(
            user = %user.id,
            state = state.as_ref().map(|s| format!("{}/{}", s.feature, s.step)),
            "dispatching event"
        );

        match &event.content {
            EventContent::Command(command) => self.handle_command(&user, command).await,
            EventContent::Button(tag) => self.handle_button(&user, tag, state).await,
            EventContent::Text(text) => self.handle_text(&user, text, state).await,
            EventContent::Media { media, caption } => {
                self.handle_media(&user, media, caption.as_deref(), state)
                    .await
            }
        }
    }

    async fn handle_command(&self, user: &User, command: &str) -> Result<(), VitrinaError> {
        if command != "start" {
            debug!(user = %user.id, command, "unknown command, showing menu");
        }
        // Opening the menu abandons any in-flight flow.
        self.store.clear_state(user.id).await?;
        self.send_main_menu(user).await
    }

    async fn handle_button(
        &self,
        user: &User,
        tag: &str,
        state: Option<ConversationState>,
    ) -> Result<(), VitrinaError> {
        match tag {
            "create_photo" => self.begin_generation(user).await,
            "analyze_ctr" => self.begin_analysis(user).await,
            "improve_card" => self.handle_improve(user, state).await,
            other => {
                warn!(user = %user.id, tag = other, "unknown button tag");
                self.transport
                    .send_text(user.id, strings::SESSION_EXPIRED)
                    .await?;
                Ok(())
            }
        }
    }

    async fn handle_text(
        &self,
        user: &User,
        text: &str,
        state: Option<ConversationState>,
    ) -> Result<(), VitrinaError> {
        match state {
            Some(s) if s.feature == Feature::Generation && s.step == Step::AwaitingInput => {
                self.handle_generation_input(user, text, &[]).await
            }
            Some(s) if s.feature == Feature::Analysis && s.step == Step::AwaitingImage => {
                // Wrong input kind; restate what the step expects.
                self.transport
                    .send_text(user.id, strings::TEXT_WHILE_AWAITING_IMAGE)
                    .await?;
                Ok(())
            }
            Some(s) if s.feature == Feature::Improvement && s.step == Step::Ready => {
                self.transport
                    .send_text(user.id, strings::IMPROVE_HINT)
                    .await?;
                Ok(())
            }
            _ => self.send_main_menu(user).await,
        }
    }

    async fn handle_media(
        &self,
        user: &User,
        media: &[MediaRef],
        caption: Option<&str>,
        state: Option<ConversationState>,
    ) -> Result<(), VitrinaError> {
        // Size ceiling is enforced before any state mutation or download.
        for item in media {
            if item.size_bytes > self.settings.max_media_bytes {
                return Err(VitrinaError::OversizedMedia {
                    size_bytes: item.size_bytes,
                    limit_bytes: self.settings.max_media_bytes,
                });
            }
        }

        match state {
            Some(s) if s.feature == Feature::Generation && s.step == Step::AwaitingInput => {
                let text = caption
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .ok_or_else(|| {
                        VitrinaError::MalformedInput(strings::CAPTION_REQUIRED.into())
                    })?;
                self.handle_generation_input(user, text, media).await
            }
            Some(s) if s.feature == Feature::Analysis && s.step == Step::AwaitingImage => {
                let first = media
                    .first()
                    .ok_or_else(|| VitrinaError::Internal("media event without media".into()))?;
                self.handle_analysis_image(user, first).await
            }
            Some(s) if s.feature == Feature::Improvement && s.step == Step::Ready => {
                self.transport
                    .send_text(user.id, strings::IMPROVE_HINT)
                    .await?;
                Ok(())
            }
            _ => self.send_main_menu(user).await,
        }
    }

    pub(crate) async fn send_main_menu(&self, user: &User) -> Result<(), VitrinaError> {
        let buttons = vec![
            (
                strings::CREATE_BUTTON.0.to_string(),
                strings::CREATE_BUTTON.1.to_string(),
            ),
            (
                strings::ANALYZE_BUTTON.0.to_string(),
                strings::ANALYZE_BUTTON.1.to_string(),
            ),
        ];
        self.transport
            .send_menu(user.id, &strings::main_menu(user.balance), &buttons)
            .await?;
        Ok(())
    }

    async fn begin_generation(&self, user: &User) -> Result<(), VitrinaError> {
        let state = ConversationState::new(user.id, Feature::Generation, Step::AwaitingInput);
        self.store.set_state(&state).await?;
        self.transport
            .send_text(user.id, strings::GENERATION_PROMPT_HINT)
            .await?;
        info!(user = %user.id, "generation flow started");
        Ok(())
    }

    async fn begin_analysis(&self, user: &User) -> Result<(), VitrinaError> {
        let state = ConversationState::new(user.id, Feature::Analysis, Step::AwaitingImage);
        self.store.set_state(&state).await?;
        self.transport
            .send_text(user.id, strings::ANALYSIS_IMAGE_HINT)
            .await?;
        info!(user = %user.id, "analysis flow started");
        Ok(())
    }

    async fn record_inbound(
        &self,
        user: &User,
        state: Option<&ConversationState>,
        content: &EventContent,
    ) -> Result<(), VitrinaError> {
        let feature = state.map(|s| s.feature);
        let record = match content {
            EventContent::Command(command) => {
                InteractionRecord::event(user.id, feature, RecordKind::Command)
                    .with_content(command.clone())
            }
            EventContent::Button(tag) => {
                InteractionRecord::event(user.id, feature, RecordKind::Button)
                    .with_content(tag.clone())
            }
            EventContent::Text(text) => {
                InteractionRecord::event(user.id, feature, RecordKind::UserText)
                    .with_content(text.clone())
            }
            EventContent::Media { media, caption } => {
                let record = InteractionRecord::event(user.id, feature, RecordKind::UserMedia)
                    .with_media_count(media.len() as u32);
                match caption {
                    Some(caption) => record.with_content(caption.clone()),
                    None => record,
                }
            }
        };
        self.store.append_record(&record).await
    }

    /// Error boundary: log, clear state where the taxonomy says so, append
    /// an error record for system failures, tell the user in one line.
    async fn handle_failure(&self, user: UserId, err: VitrinaError) {
        error!(%user, error = %err, "event handling failed");

        if err.clears_state() {
            if let Err(e) = self.store.clear_state(user).await {
                warn!(%user, error = %e, "failed to clear state after error");
            }
        }

        if matches!(
            err,
            VitrinaError::Backend { .. }
                | VitrinaError::Storage { .. }
                | VitrinaError::Channel { .. }
                | VitrinaError::Internal(_)
        ) {
            let record = InteractionRecord::event(user, None, RecordKind::Error)
                .with_content(err.to_string())
                .failed();
            if let Err(e) = self.store.append_record(&record).await {
                warn!(%user, error = %e, "failed to append error record");
            }
        }

        let text = match &err {
            VitrinaError::InsufficientBalance { required, balance } => {
                strings::insufficient_balance(*required, *balance)
            }
            VitrinaError::OversizedMedia { limit_bytes, .. } => {
                strings::media_too_large(*limit_bytes)
            }
            VitrinaError::MalformedInput(reprompt) => reprompt.clone(),
            VitrinaError::StateNotFound => strings::SESSION_EXPIRED.to_string(),
            _ => strings::GENERIC_FAILURE.to_string(),
        };
        if let Err(e) = self.transport.send_text(user, &text).await {
            warn!(%user, error = %e, "failed to deliver error message");
        }
    }
}
