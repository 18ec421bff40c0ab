//! Session database operations
//!
//! Sessions are opaque bearer tokens issued at login after the identity
//! provider has verified the caller. Expired rows are purged at startup.

use chrono::{DateTime, Duration, Utc};
use shelfmark_common::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid};

/// Session lifetime
const SESSION_TTL_DAYS: i64 = 30;

/// Session record
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Issue a new session for a user
pub async fn create_session(pool: &SqlitePool, user_id: Uuid) -> Result<Session> {
    let now = Utc::now();
    let session = Session {
        token: Uuid::new_v4().simple().to_string(),
        user_id,
        created_at: now,
        expires_at: now + Duration::days(SESSION_TTL_DAYS),
    };

    sqlx::query(
        r#"
        INSERT INTO sessions (token, user_id, created_at, expires_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&session.token)
    .bind(session.user_id.to_string())
    .bind(session.created_at.to_rfc3339())
    .bind(session.expires_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(session)
}

/// Resolve a bearer token to its user; `None` for unknown or expired tokens
pub async fn lookup_session_user(pool: &SqlitePool, token: &str) -> Result<Option<Uuid>> {
    let row = sqlx::query(
        r#"
        SELECT user_id, expires_at
        FROM sessions
        WHERE token = ?
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let expires_at: String = row.get("expires_at");
            if parse_timestamp(&expires_at)? <= Utc::now() {
                return Ok(None);
            }
            let user_id: String = row.get("user_id");
            Ok(Some(parse_uuid(&user_id)?))
        }
        None => Ok(None),
    }
}

/// Delete a session (logout); `false` when the token was unknown
pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Purge expired sessions on startup
pub async fn delete_expired_sessions(pool: &SqlitePool) -> Result<usize> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::users::tests::insert_test_user;

    #[tokio::test]
    async fn test_session_round_trip() {
        let pool = shelfmark_common::db::init_memory_database().await.unwrap();
        let user_id = insert_test_user(&pool, "reader").await;

        let session = create_session(&pool, user_id).await.unwrap();
        let resolved = lookup_session_user(&pool, &session.token).await.unwrap();
        assert_eq!(resolved, Some(user_id));
    }

    #[tokio::test]
    async fn test_unknown_token_resolves_to_none() {
        let pool = shelfmark_common::db::init_memory_database().await.unwrap();

        let resolved = lookup_session_user(&pool, "not-a-token").await.unwrap();
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn test_delete_session_invalidates_token() {
        let pool = shelfmark_common::db::init_memory_database().await.unwrap();
        let user_id = insert_test_user(&pool, "reader").await;

        let session = create_session(&pool, user_id).await.unwrap();
        assert!(delete_session(&pool, &session.token).await.unwrap());
        assert!(!delete_session(&pool, &session.token).await.unwrap());

        let resolved = lookup_session_user(&pool, &session.token).await.unwrap();
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn test_expired_sessions_are_rejected_and_purged() {
        let pool = shelfmark_common::db::init_memory_database().await.unwrap();
        let user_id = insert_test_user(&pool, "reader").await;

        // Insert an already-expired session directly
        let past = Utc::now() - Duration::days(1);
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind("expired-token")
        .bind(user_id.to_string())
        .bind((past - Duration::days(30)).to_rfc3339())
        .bind(past.to_rfc3339())
        .execute(&pool)
        .await
        .unwrap();

        let resolved = lookup_session_user(&pool, "expired-token").await.unwrap();
        assert!(resolved.is_none());

        let purged = delete_expired_sessions(&pool).await.unwrap();
        assert_eq!(purged, 1);
    }
}
