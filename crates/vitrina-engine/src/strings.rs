// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! All user-facing copy in one place.

/// Label/callback pairs for the main menu.
pub const CREATE_BUTTON: (&str, &str) = ("🎨 Create a card", "create_photo");
pub const ANALYZE_BUTTON: (&str, &str) = ("📊 Analyze CTR", "analyze_ctr");
pub const IMPROVE_BUTTON: (&str, &str) = ("💡 Improve this card", "improve_card");

pub fn main_menu(balance: i64) -> String {
    format!(
        "Welcome to Vitrina — your product card assistant.\n\n\
         🎨 *Create a card* — describe the card you want, optionally with \
         reference photos.\n\
         📊 *Analyze CTR* — send a card and get a click-through review.\n\n\
         Your balance: *{balance}* tokens."
    )
}

pub const GENERATION_PROMPT_HINT: &str =
    "Describe the card you want to create. You can attach up to a few \
     reference photos — just put the description in the caption.";

pub const ANALYSIS_IMAGE_HINT: &str =
    "Send the product card you want analyzed as a photo.";

pub const CAPTION_REQUIRED: &str =
    "Please add a description to the photo caption so I know what to create.";

pub const TEXT_WHILE_AWAITING_IMAGE: &str =
    "I need a photo of the card to analyze it. Send one as an image.";

pub const IMPROVE_HINT: &str =
    "Your analysis is ready above. Press the improve button to regenerate \
     the card, or /start for the menu.";

pub const ANALYSIS_NOT_FOUND: &str =
    "I couldn't find a recent analysis for you. Run 📊 Analyze CTR first.";

pub const GENERIC_FAILURE: &str =
    "Something went wrong on my side. Your tokens were not charged — \
     please try again.";

pub const SESSION_EXPIRED: &str =
    "That action is no longer active. Use /start to open the menu.";

pub fn insufficient_balance(required: i64, balance: i64) -> String {
    format!(
        "Not enough tokens: this costs {required}, you have {balance}. \
         Your current action was cancelled."
    )
}

pub fn media_too_large(limit_bytes: u64) -> String {
    let limit_mb = limit_bytes / (1024 * 1024);
    format!("That file is too large. Please send an image up to {limit_mb} MB.")
}

/// File name for the lossless copy of a delivered card.
pub const CARD_FILE_NAME: &str = "card.png";

pub const ORIGINAL_QUALITY_CAPTION: &str =
    "📥 The same card in original quality — use this file for your listing.";

pub fn card_delivered(balance: i64) -> String {
    format!("Here is your card! Tokens left: {balance}.")
}

pub fn improved_card_delivered(balance: i64) -> String {
    format!("Here is the improved card! Tokens left: {balance}.")
}

pub fn analysis_footer(balance: i64) -> String {
    format!("\n\nTokens left: {balance}.")
}
