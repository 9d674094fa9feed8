// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interaction log operations. Append-only; rows are never updated or
//! deleted, and the core never reads them back to drive behavior.

use std::str::FromStr;

use rusqlite::params;
use vitrina_core::types::{Feature, InteractionRecord, RecordKind, UserId};
use vitrina_core::VitrinaError;

use crate::database::Database;

/// Append one interaction record.
pub async fn append_record(db: &Database, record: &InteractionRecord) -> Result<(), VitrinaError> {
    let user_id = record.user_id.0;
    let feature = record.feature.map(|f| f.to_string());
    let kind = record.kind.to_string();
    let content = record.content.clone();
    let media_count = record.media_count;
    let tokens_used = record.tokens_used;
    let success = record.success;
    let metadata = record.metadata.as_ref().map(|m| m.to_string());

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO interaction_records
                 (user_id, feature, kind, content, media_count, tokens_used, success, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    user_id,
                    feature,
                    kind,
                    content,
                    media_count,
                    tokens_used,
                    success as i64,
                    metadata,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List all records for a user in insertion order. Analytics/debugging helper.
pub async fn list_records_for_user(
    db: &Database,
    id: UserId,
) -> Result<Vec<InteractionRecord>, VitrinaError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, feature, kind, content, media_count, tokens_used, success, metadata
                 FROM interaction_records WHERE user_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![id.0], |row| {
                let feature: Option<String> = row.get(1)?;
                let kind: String = row.get(2)?;
                let metadata: Option<String> = row.get(7)?;
                Ok(InteractionRecord {
                    user_id: UserId(row.get(0)?),
                    feature: feature.as_deref().and_then(|f| Feature::from_str(f).ok()),
                    kind: RecordKind::from_str(&kind).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            2,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?,
                    content: row.get(3)?,
                    media_count: row.get(4)?,
                    tokens_used: row.get(5)?,
                    success: row.get::<_, i64>(6)? != 0,
                    metadata: metadata.and_then(|m| serde_json::from_str(&m).ok()),
                })
            })?;
            let mut records = Vec::new();
            for row in rows {
                records.push(row?);
            }
            Ok(records)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
