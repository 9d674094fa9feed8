// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram transport adapter for the Vitrina bot.
//!
//! Implements [`ChatTransport`] over the Telegram Bot API via teloxide:
//! long polling with message and callback-query routing, MarkdownV2
//! formatting with plain-text fallback, inline keyboards, and media
//! download.

pub mod handler;
pub mod markdown;
pub mod media;

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ParseMode};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use vitrina_config::model::TelegramConfig;
use vitrina_core::types::{EventContent, InboundEvent, MediaRef, MessageId, UserId};
use vitrina_core::{ChatTransport, VitrinaError};

use crate::handler::{AlbumBuffer, Extracted};

/// Telegram transport over long polling.
///
/// Outbound methods live on [`ChatTransport`]; inbound updates are pushed
/// into an mpsc channel by [`spawn_polling`](TelegramTransport::spawn_polling).
pub struct TelegramTransport {
    bot: Bot,
    config: TelegramConfig,
}

impl TelegramTransport {
    /// Creates the transport. Requires `config.bot_token` to be set.
    pub fn new(config: &TelegramConfig) -> Result<Self, VitrinaError> {
        let token = config
            .bot_token
            .as_deref()
            .ok_or_else(|| VitrinaError::Config("telegram.bot_token is not set".into()))?;
        if token.is_empty() {
            return Err(VitrinaError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        Ok(Self {
            bot: Bot::new(token),
            config: config.clone(),
        })
    }

    /// Overrides the Bot API URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_api_url(mut self, url: reqwest::Url) -> Self {
        self.bot = self.bot.set_api_url(url);
        self
    }

    /// Starts long polling, pushing converted events into `tx`.
    ///
    /// DM-only; senders outside a non-empty allow-list are ignored. Photo
    /// albums are buffered and delivered as a single event.
    pub fn spawn_polling(&self, tx: mpsc::Sender<InboundEvent>) -> JoinHandle<()> {
        let bot = self.bot.clone();
        let allowed: Arc<Vec<String>> = Arc::new(self.config.allowed_users.clone());
        let albums = AlbumBuffer::new();

        info!("starting Telegram long polling");

        tokio::spawn(async move {
            let msg_tx = tx.clone();
            let msg_allowed = allowed.clone();
            let message_branch = Update::filter_message().endpoint(move |msg: Message| {
                let tx = msg_tx.clone();
                let allowed = msg_allowed.clone();
                let albums = albums.clone();
                async move {
                    if !handler::is_dm(&msg) {
                        debug!(chat_id = msg.chat.id.0, "ignoring non-DM message");
                        return respond(());
                    }
                    let Some(user) = msg.from.as_ref() else {
                        return respond(());
                    };
                    if !handler::is_allowed(user, &allowed) {
                        debug!(user_id = user.id.0, "ignoring disallowed user");
                        return respond(());
                    }

                    let profile = handler::profile_of(user);
                    match handler::extract_content(&msg) {
                        Extracted::Event(content) => {
                            let event = InboundEvent {
                                user: profile,
                                content,
                            };
                            if tx.send(event).await.is_err() {
                                warn!("inbound channel closed, dropping message");
                            }
                        }
                        Extracted::AlbumPart {
                            group_id,
                            media,
                            caption,
                        } => albums.add(tx, profile, group_id, media, caption),
                        Extracted::Unsupported => {}
                    }
                    respond(())
                }
            });

            let cb_bot = bot.clone();
            let callback_branch =
                Update::filter_callback_query().endpoint(move |q: CallbackQuery| {
                    let bot = cb_bot.clone();
                    let tx = tx.clone();
                    let allowed = allowed.clone();
                    async move {
                        // Clear the client-side loading state regardless of
                        // whether the press is acted on.
                        if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
                            debug!(error = %e, "failed to answer callback query");
                        }
                        if !handler::is_allowed(&q.from, &allowed) {
                            return respond(());
                        }
                        if let Some(tag) = q.data {
                            let event = InboundEvent {
                                user: handler::profile_of(&q.from),
                                content: EventContent::Button(tag),
                            };
                            if tx.send(event).await.is_err() {
                                warn!("inbound channel closed, dropping button press");
                            }
                        }
                        respond(())
                    }
                });

            let tree = teloxide::dptree::entry()
                .branch(message_branch)
                .branch(callback_branch);

            teloxide::dispatching::Dispatcher::builder(bot, tree)
                .default_handler(|_| async {})
                .build()
                .dispatch()
                .await;
        })
    }

    fn keyboard(buttons: &[(String, String)]) -> InlineKeyboardMarkup {
        InlineKeyboardMarkup::new(
            buttons
                .iter()
                .map(|(label, tag)| vec![InlineKeyboardButton::callback(label.clone(), tag.clone())]),
        )
    }

    fn message_id(message: &MessageId) -> Result<teloxide::types::MessageId, VitrinaError> {
        message
            .0
            .parse::<i32>()
            .map(teloxide::types::MessageId)
            .map_err(|e| VitrinaError::Channel {
                message: format!("invalid message id {:?}: {e}", message.0),
                source: None,
            })
    }
}

fn channel_err(context: &str, e: teloxide::RequestError) -> VitrinaError {
    VitrinaError::Channel {
        message: format!("{context}: {e}"),
        source: Some(Box::new(e)),
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    /// MarkdownV2 first; on rejection the same content is re-sent exactly
    /// once as plain text.
    async fn send_text(&self, user: UserId, text: &str) -> Result<MessageId, VitrinaError> {
        let chat = ChatId(user.0);
        let escaped = markdown::escape_markdown_v2(text);
        let sent = match self
            .bot
            .send_message(chat, &escaped)
            .parse_mode(ParseMode::MarkdownV2)
            .await
        {
            Ok(sent) => sent,
            Err(e) => {
                warn!(error = %e, "MarkdownV2 send failed, retrying as plain text");
                self.bot
                    .send_message(chat, text)
                    .await
                    .map_err(|e| channel_err("failed to send message", e))?
            }
        };
        Ok(MessageId(sent.id.0.to_string()))
    }

    async fn send_menu(
        &self,
        user: UserId,
        text: &str,
        buttons: &[(String, String)],
    ) -> Result<MessageId, VitrinaError> {
        let chat = ChatId(user.0);
        let keyboard = Self::keyboard(buttons);
        let escaped = markdown::escape_markdown_v2(text);
        let sent = match self
            .bot
            .send_message(chat, &escaped)
            .parse_mode(ParseMode::MarkdownV2)
            .reply_markup(keyboard.clone())
            .await
        {
            Ok(sent) => sent,
            Err(e) => {
                warn!(error = %e, "MarkdownV2 menu failed, retrying as plain text");
                self.bot
                    .send_message(chat, text)
                    .reply_markup(keyboard)
                    .await
                    .map_err(|e| channel_err("failed to send menu", e))?
            }
        };
        Ok(MessageId(sent.id.0.to_string()))
    }

    async fn send_photo(
        &self,
        user: UserId,
        data: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<MessageId, VitrinaError> {
        let mut request = self.bot.send_photo(ChatId(user.0), InputFile::memory(data));
        if let Some(caption) = caption {
            request = request.caption(caption.to_string());
        }
        let sent = request
            .await
            .map_err(|e| channel_err("failed to send photo", e))?;
        Ok(MessageId(sent.id.0.to_string()))
    }

    async fn send_document(
        &self,
        user: UserId,
        data: Vec<u8>,
        file_name: &str,
        caption: Option<&str>,
    ) -> Result<MessageId, VitrinaError> {
        let file = InputFile::memory(data).file_name(file_name.to_string());
        let mut request = self.bot.send_document(ChatId(user.0), file);
        if let Some(caption) = caption {
            request = request.caption(caption.to_string());
        }
        let sent = request
            .await
            .map_err(|e| channel_err("failed to send document", e))?;
        Ok(MessageId(sent.id.0.to_string()))
    }

    async fn edit_text(
        &self,
        user: UserId,
        message: &MessageId,
        text: &str,
    ) -> Result<(), VitrinaError> {
        let chat = ChatId(user.0);
        let msg_id = Self::message_id(message)?;
        let escaped = markdown::escape_markdown_v2(text);

        match self
            .bot
            .edit_message_text(chat, msg_id, &escaped)
            .parse_mode(ParseMode::MarkdownV2)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                let description = e.to_string();
                if description.contains("message is not modified") {
                    return Ok(());
                }
                if description.contains("can't parse entities") {
                    warn!(error = %e, "MarkdownV2 edit failed, retrying as plain text");
                    self.bot
                        .edit_message_text(chat, msg_id, text)
                        .await
                        .map_err(|e| channel_err("failed to edit message", e))?;
                    return Ok(());
                }
                Err(channel_err("failed to edit message", e))
            }
        }
    }

    async fn delete_message(
        &self,
        user: UserId,
        message: &MessageId,
    ) -> Result<(), VitrinaError> {
        let msg_id = Self::message_id(message)?;
        self.bot
            .delete_message(ChatId(user.0), msg_id)
            .await
            .map_err(|e| channel_err("failed to delete message", e))?;
        Ok(())
    }

    async fn download(&self, media: &MediaRef) -> Result<Vec<u8>, VitrinaError> {
        media::download_media(&self.bot, media).await
    }
}
