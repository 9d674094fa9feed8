// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User row operations: get-or-create, lookup, atomic balance adjustment.

use rusqlite::params;
use vitrina_core::types::{User, UserId, UserProfile};
use vitrina_core::VitrinaError;

use crate::database::Database;

fn row_to_user(row: &rusqlite::Row<'_>) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: UserId(row.get(0)?),
        display_name: row.get(1)?,
        username: row.get(2)?,
        balance: row.get(3)?,
        created_at: row.get(4)?,
        last_active: row.get(5)?,
    })
}

const SELECT_USER: &str = "SELECT user_id, display_name, username, balance, created_at, last_active
     FROM users WHERE user_id = ?1";

/// Get-or-create a user.
///
/// New users start with `starting_balance`; existing users get their
/// `last_active` refreshed and name fields updated where the profile
/// provides them (COALESCE: an absent name never erases a stored one).
pub async fn upsert_user(
    db: &Database,
    profile: &UserProfile,
    starting_balance: i64,
) -> Result<User, VitrinaError> {
    let profile = profile.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (user_id, display_name, username, balance)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id) DO UPDATE SET
                     display_name = COALESCE(excluded.display_name, display_name),
                     username = COALESCE(excluded.username, username),
                     last_active = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![
                    profile.id.0,
                    profile.display_name,
                    profile.username,
                    starting_balance,
                ],
            )?;
            conn.query_row(SELECT_USER, params![profile.id.0], row_to_user)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a user by id, or `None` if never seen.
pub async fn get_user(db: &Database, id: UserId) -> Result<Option<User>, VitrinaError> {
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(SELECT_USER, params![id.0], row_to_user);
            match result {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Atomically add `delta` to the stored balance and return the new balance.
///
/// Fails if the user row does not exist.
pub async fn adjust_balance(db: &Database, id: UserId, delta: i64) -> Result<i64, VitrinaError> {
    db.connection()
        .call(move |conn| {
            let updated = conn.execute(
                "UPDATE users SET balance = balance + ?1 WHERE user_id = ?2",
                params![delta, id.0],
            )?;
            if updated == 0 {
                return Err(rusqlite::Error::QueryReturnedNoRows);
            }
            conn.query_row(
                "SELECT balance FROM users WHERE user_id = ?1",
                params![id.0],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn profile(id: i64) -> UserProfile {
        UserProfile {
            id: UserId(id),
            display_name: Some("Test".to_string()),
            username: Some("tester".to_string()),
        }
    }

    #[tokio::test]
    async fn upsert_creates_with_starting_balance() {
        let db = setup_db().await;
        let user = upsert_user(&db, &profile(1), 50).await.unwrap();
        assert_eq!(user.id, UserId(1));
        assert_eq!(user.balance, 50);
        assert_eq!(user.display_name.as_deref(), Some("Test"));
        assert!(!user.created_at.is_empty());
    }

    #[tokio::test]
    async fn upsert_existing_keeps_balance() {
        let db = setup_db().await;
        upsert_user(&db, &profile(1), 50).await.unwrap();
        adjust_balance(&db, UserId(1), -20).await.unwrap();

        // A second contact must not re-grant the starting balance.
        let user = upsert_user(&db, &profile(1), 50).await.unwrap();
        assert_eq!(user.balance, 30);
    }

    #[tokio::test]
    async fn upsert_absent_name_preserves_stored_one() {
        let db = setup_db().await;
        upsert_user(&db, &profile(1), 50).await.unwrap();

        let anonymous = UserProfile {
            id: UserId(1),
            display_name: None,
            username: None,
        };
        let user = upsert_user(&db, &anonymous, 50).await.unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Test"));
        assert_eq!(user.username.as_deref(), Some("tester"));
    }

    #[tokio::test]
    async fn get_unknown_user_returns_none() {
        let db = setup_db().await;
        assert!(get_user(&db, UserId(404)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn adjust_balance_returns_new_value() {
        let db = setup_db().await;
        upsert_user(&db, &profile(1), 50).await.unwrap();

        let balance = adjust_balance(&db, UserId(1), -25).await.unwrap();
        assert_eq!(balance, 25);

        let balance = adjust_balance(&db, UserId(1), 10).await.unwrap();
        assert_eq!(balance, 35);
    }

    #[tokio::test]
    async fn adjust_balance_for_unknown_user_fails() {
        let db = setup_db().await;
        assert!(adjust_balance(&db, UserId(404), -5).await.is_err());
    }
}
