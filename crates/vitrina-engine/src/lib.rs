// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation engine for the Vitrina bot.
//!
//! Hosts the per-user conversation state machine, the event dispatcher
//! with its error boundary, the three feature flows (generation, analysis,
//! improvement), and the progress feedback supervisor. Works purely
//! against the `vitrina-core` traits, so every collaborator can be faked
//! in tests.

pub mod dispatcher;
pub mod flows;
pub mod progress;
pub mod prompts;
pub mod strings;

pub use dispatcher::{Dispatcher, EngineSettings};
pub use progress::ProgressIndicator;
