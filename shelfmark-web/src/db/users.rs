//! User account and profile database operations
//!
//! One row per identity-provider subject. The profile (username, bio) is
//! user-editable and upserted; identity itself is never stored beyond the
//! provider subject.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shelfmark_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid};

/// User record
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub user_id: Uuid,
    #[serde(skip_serializing)]
    pub external_subject: String,
    pub username: String,
    pub bio: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Find or create the user for an identity-provider subject.
///
/// First login creates the row with the provider-supplied username; later
/// logins keep whatever profile the user has edited since.
pub async fn upsert_user(
    pool: &SqlitePool,
    external_subject: &str,
    username: &str,
) -> Result<User> {
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        INSERT INTO users (user_id, external_subject, username, bio, created_at, updated_at)
        VALUES (?, ?, ?, '', ?, ?)
        ON CONFLICT(external_subject) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(external_subject)
    .bind(username)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    let row = sqlx::query(
        r#"
        SELECT user_id, external_subject, username, bio, created_at, updated_at
        FROM users
        WHERE external_subject = ?
        "#,
    )
    .bind(external_subject)
    .fetch_one(pool)
    .await?;

    user_from_row(&row)
}

/// Load a user by id
pub async fn get_user(pool: &SqlitePool, user_id: Uuid) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT user_id, external_subject, username, bio, created_at, updated_at
        FROM users
        WHERE user_id = ?
        "#,
    )
    .bind(user_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(user_from_row).transpose()
}

/// Update the user's profile; `None` when the user does not exist
pub async fn update_profile(
    pool: &SqlitePool,
    user_id: Uuid,
    username: &str,
    bio: &str,
) -> Result<Option<User>> {
    if username.trim().is_empty() {
        return Err(Error::InvalidInput("Username must not be empty".to_string()));
    }

    let result = sqlx::query(
        r#"
        UPDATE users SET username = ?, bio = ?, updated_at = ?
        WHERE user_id = ?
        "#,
    )
    .bind(username)
    .bind(bio)
    .bind(Utc::now().to_rfc3339())
    .bind(user_id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get_user(pool, user_id).await
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let user_id: String = row.get("user_id");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(User {
        user_id: parse_uuid(&user_id)?,
        external_subject: row.get("external_subject"),
        username: row.get("username"),
        bio: row.get("bio"),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Insert a user for tests in this crate; returns the new user id
    pub(crate) async fn insert_test_user(pool: &SqlitePool, username: &str) -> Uuid {
        let user = upsert_user(pool, &format!("subject-{}", username), username)
            .await
            .expect("Failed to insert test user");
        user.user_id
    }

    #[tokio::test]
    async fn test_upsert_creates_then_reuses_row() {
        let pool = shelfmark_common::db::init_memory_database().await.unwrap();

        let first = upsert_user(&pool, "auth0|abc", "reader").await.unwrap();
        let second = upsert_user(&pool, "auth0|abc", "reader-renamed").await.unwrap();

        // Same row; later logins do not clobber the stored profile
        assert_eq!(first.user_id, second.user_id);
        assert_eq!(second.username, "reader");
    }

    #[tokio::test]
    async fn test_update_profile_round_trip() {
        let pool = shelfmark_common::db::init_memory_database().await.unwrap();
        let user_id = insert_test_user(&pool, "reader").await;

        let updated = update_profile(&pool, user_id, "bookworm", "I read a lot")
            .await
            .unwrap()
            .expect("User not found");

        assert_eq!(updated.username, "bookworm");
        assert_eq!(updated.bio, "I read a lot");

        let fetched = get_user(&pool, user_id).await.unwrap().unwrap();
        assert_eq!(fetched.username, "bookworm");
    }

    #[tokio::test]
    async fn test_update_profile_rejects_empty_username() {
        let pool = shelfmark_common::db::init_memory_database().await.unwrap();
        let user_id = insert_test_user(&pool, "reader").await;

        let result = update_profile(&pool, user_id, "  ", "bio").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_update_profile_unknown_user_is_none() {
        let pool = shelfmark_common::db::init_memory_database().await.unwrap();

        let result = update_profile(&pool, Uuid::new_v4(), "name", "bio")
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
