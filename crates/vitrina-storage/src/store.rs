// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`Store`] trait.

use async_trait::async_trait;
use tracing::debug;

use vitrina_config::model::StorageConfig;
use vitrina_core::types::{ConversationState, InteractionRecord, User, UserId, UserProfile};
use vitrina_core::{Store, VitrinaError};

use crate::database::Database;
use crate::queries;

/// SQLite-backed persistence store.
///
/// Wraps a [`Database`] handle and delegates all operations to the typed
/// query modules.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Open the store at the configured path, running migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, VitrinaError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "SQLite store initialized");
        Ok(Self { db })
    }

    /// Open an in-memory store (tests).
    pub async fn open_in_memory() -> Result<Self, VitrinaError> {
        let db = Database::open_in_memory().await?;
        Ok(Self { db })
    }

    /// Access the underlying database (analytics helpers, shutdown).
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Checkpoint the WAL and release the connection.
    pub async fn close(&self) -> Result<(), VitrinaError> {
        self.db.close().await
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn upsert_user(
        &self,
        profile: &UserProfile,
        starting_balance: i64,
    ) -> Result<User, VitrinaError> {
        queries::users::upsert_user(&self.db, profile, starting_balance).await
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, VitrinaError> {
        queries::users::get_user(&self.db, id).await
    }

    async fn adjust_balance(&self, id: UserId, delta: i64) -> Result<i64, VitrinaError> {
        queries::users::adjust_balance(&self.db, id, delta).await
    }

    async fn get_state(&self, id: UserId) -> Result<Option<ConversationState>, VitrinaError> {
        queries::states::get_state(&self.db, id).await
    }

    async fn set_state(&self, state: &ConversationState) -> Result<(), VitrinaError> {
        queries::states::set_state(&self.db, state).await
    }

    async fn clear_state(&self, id: UserId) -> Result<(), VitrinaError> {
        queries::states::clear_state(&self.db, id).await
    }

    async fn append_record(&self, record: &InteractionRecord) -> Result<(), VitrinaError> {
        queries::records::append_record(&self.db, record).await
    }
}
