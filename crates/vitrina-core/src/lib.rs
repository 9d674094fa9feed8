// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Vitrina marketplace assistant.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Vitrina workspace. The engine works
//! purely against the traits defined here; concrete adapters live in their
//! own crates.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::VitrinaError;
pub use traits::{AiBackend, ChatTransport, IntentClassifier, Store};
pub use types::{
    ConversationState, EventContent, Feature, ImageData, InboundEvent, InteractionRecord,
    MediaRef, MessageId, RecordKind, Step, User, UserId, UserProfile,
};
