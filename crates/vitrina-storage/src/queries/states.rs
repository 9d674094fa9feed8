// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation state operations: one row per user, UPSERT overwrite.

use std::str::FromStr;

use rusqlite::params;
use vitrina_core::types::{ConversationState, Feature, Step, UserId};
use vitrina_core::VitrinaError;

use crate::database::Database;

fn parse_tag<T: FromStr>(value: String) -> Result<T, rusqlite::Error>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    T::from_str(&value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Fetch the user's conversation state, or `None` when idle.
///
/// An unreadable payload deserializes to `Null` rather than failing the
/// whole read: the flow owning the payload decides what to do with it.
pub async fn get_state(
    db: &Database,
    id: UserId,
) -> Result<Option<ConversationState>, VitrinaError> {
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT feature, step, payload FROM conversation_states WHERE user_id = ?1",
                params![id.0],
                |row| {
                    let feature: String = row.get(0)?;
                    let step: String = row.get(1)?;
                    let payload: Option<String> = row.get(2)?;
                    Ok((feature, step, payload))
                },
            );
            match result {
                Ok((feature, step, payload)) => {
                    let payload = payload
                        .and_then(|raw| serde_json::from_str(&raw).ok())
                        .unwrap_or(serde_json::Value::Null);
                    Ok(Some(ConversationState {
                        user_id: id,
                        feature: parse_tag::<Feature>(feature)?,
                        step: parse_tag::<Step>(step)?,
                        payload,
                    }))
                }
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Write the conversation state, fully replacing any prior row (UPSERT, not merge).
pub async fn set_state(db: &Database, state: &ConversationState) -> Result<(), VitrinaError> {
    let user_id = state.user_id.0;
    let feature = state.feature.to_string();
    let step = state.step.to_string();
    let payload = if state.payload.is_null() {
        None
    } else {
        Some(state.payload.to_string())
    };

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversation_states (user_id, feature, step, payload, updated_at)
                 VALUES (?1, ?2, ?3, ?4, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                 ON CONFLICT(user_id) DO UPDATE SET
                     feature = excluded.feature,
                     step = excluded.step,
                     payload = excluded.payload,
                     updated_at = excluded.updated_at",
                params![user_id, feature, step, payload],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete the user's conversation state. A no-op when none exists.
pub async fn clear_state(db: &Database, id: UserId) -> Result<(), VitrinaError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM conversation_states WHERE user_id = ?1",
                params![id.0],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn setup_db() -> Database {
        let db = Database::open_in_memory().await.unwrap();
        // States reference users; seed one.
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute("INSERT INTO users (user_id, balance) VALUES (1, 50)", [])?;
                Ok(())
            })
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn get_state_when_idle_returns_none() {
        let db = setup_db().await;
        assert!(get_state(&db, UserId(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn payload_round_trips_structurally_equal() {
        let db = setup_db().await;
        let payload = json!({
            "analysis": "RECOMMENDATIONS:\n1. bigger title",
            "image_ref": {"file_id": "abc", "size_bytes": 1024},
        });
        let state = ConversationState::new(UserId(1), Feature::Improvement, Step::Ready)
            .with_payload(payload.clone());
        set_state(&db, &state).await.unwrap();

        let read = get_state(&db, UserId(1)).await.unwrap().unwrap();
        assert_eq!(read.feature, Feature::Improvement);
        assert_eq!(read.step, Step::Ready);
        assert_eq!(read.payload, payload);
    }

    #[tokio::test]
    async fn set_state_fully_replaces_prior_value() {
        let db = setup_db().await;
        let first = ConversationState::new(UserId(1), Feature::Analysis, Step::AwaitingImage)
            .with_payload(json!({"old_key": true}));
        set_state(&db, &first).await.unwrap();

        // No merge: the old payload key must be gone.
        let second = ConversationState::new(UserId(1), Feature::Generation, Step::AwaitingInput);
        set_state(&db, &second).await.unwrap();

        let read = get_state(&db, UserId(1)).await.unwrap().unwrap();
        assert_eq!(read.feature, Feature::Generation);
        assert_eq!(read.payload, serde_json::Value::Null);
    }

    #[tokio::test]
    async fn at_most_one_state_row_per_user() {
        let db = setup_db().await;
        for _ in 0..3 {
            let state = ConversationState::new(UserId(1), Feature::Generation, Step::AwaitingInput);
            set_state(&db, &state).await.unwrap();
        }
        let count: i64 = db
            .connection()
            .call(|conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM conversation_states WHERE user_id = 1",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn clear_state_is_idempotent() {
        let db = setup_db().await;
        // Clearing with no state present is a no-op, not an error.
        clear_state(&db, UserId(1)).await.unwrap();

        let state = ConversationState::new(UserId(1), Feature::Analysis, Step::AwaitingImage);
        set_state(&db, &state).await.unwrap();
        clear_state(&db, UserId(1)).await.unwrap();
        clear_state(&db, UserId(1)).await.unwrap();

        assert!(get_state(&db, UserId(1)).await.unwrap().is_none());
    }
}
