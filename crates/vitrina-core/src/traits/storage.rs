// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence store trait.

use async_trait::async_trait;

use crate::error::VitrinaError;
use crate::types::{ConversationState, InteractionRecord, User, UserId, UserProfile};

/// Durable, crash-safe storage keyed by user id.
///
/// Every operation is atomic at single-row granularity; the core's access
/// patterns require no multi-row transactions. Any operation may fail with
/// [`VitrinaError::Storage`], which callers treat as non-retryable within
/// the current request.
#[async_trait]
pub trait Store: Send + Sync {
    /// Get-or-create a user row.
    ///
    /// On first contact the user is created with `starting_balance`; on
    /// every later contact `last_active` is refreshed and name fields are
    /// updated where the profile provides them (absent names never erase
    /// stored ones).
    async fn upsert_user(
        &self,
        profile: &UserProfile,
        starting_balance: i64,
    ) -> Result<User, VitrinaError>;

    /// Fetch a user row, or `None` if never seen.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, VitrinaError>;

    /// Atomically add `delta` (negative to subtract) to the stored balance
    /// and return the post-adjustment balance.
    async fn adjust_balance(&self, id: UserId, delta: i64) -> Result<i64, VitrinaError>;

    /// Fetch the user's conversation state, or `None` when idle.
    async fn get_state(&self, id: UserId) -> Result<Option<ConversationState>, VitrinaError>;

    /// Write the conversation state, fully replacing any prior value.
    async fn set_state(&self, state: &ConversationState) -> Result<(), VitrinaError>;

    /// Delete the user's conversation state. A no-op when none exists.
    async fn clear_state(&self, id: UserId) -> Result<(), VitrinaError>;

    /// Append an interaction record to the log.
    async fn append_record(&self, record: &InteractionRecord) -> Result<(), VitrinaError>;
}
