// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits at the seams of the system.
//!
//! The engine depends only on these traits; concrete adapters (Telegram,
//! Gemini, SQLite) live in their own crates, and tests substitute
//! in-memory fakes.

pub mod backend;
pub mod channel;
pub mod storage;

pub use backend::{AiBackend, IntentClassifier};
pub use channel::ChatTransport;
pub use storage::Store;
