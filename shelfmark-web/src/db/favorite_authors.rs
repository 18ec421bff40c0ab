//! Favorite author database operations
//!
//! A per-user allow-list of author names, used by search to query across
//! all favorites at once.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shelfmark_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid};
use crate::cache::Keyed;

/// Favorite author record
#[derive(Debug, Clone, Serialize)]
pub struct FavoriteAuthor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

impl Keyed for FavoriteAuthor {
    fn key(&self) -> Uuid {
        self.id
    }
}

/// List the owner's favorite authors, alphabetical
pub async fn list_favorite_authors(
    pool: &SqlitePool,
    user_id: Uuid,
) -> Result<Vec<FavoriteAuthor>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, author, created_at
        FROM favorite_authors
        WHERE user_id = ?
        ORDER BY author ASC
        "#,
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(favorite_author_from_row).collect()
}

/// Author names only, for the search-by-all-favorites action
pub async fn list_favorite_author_names(
    pool: &SqlitePool,
    user_id: Uuid,
) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT author FROM favorite_authors WHERE user_id = ? ORDER BY author ASC",
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(author,)| author).collect())
}

/// Add an author to the allow-list
pub async fn create_favorite_author(
    pool: &SqlitePool,
    user_id: Uuid,
    author: &str,
) -> Result<FavoriteAuthor> {
    let author = author.trim();
    if author.is_empty() {
        return Err(Error::InvalidInput("Author name must not be empty".to_string()));
    }

    let record = FavoriteAuthor {
        id: Uuid::new_v4(),
        user_id,
        author: author.to_string(),
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO favorite_authors (id, user_id, author, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(record.id.to_string())
    .bind(record.user_id.to_string())
    .bind(&record.author)
    .bind(record.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(record)
}

/// Remove an author from the allow-list; `false` when absent or not owned
pub async fn delete_favorite_author(pool: &SqlitePool, user_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM favorite_authors WHERE id = ? AND user_id = ?")
        .bind(id.to_string())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn favorite_author_from_row(row: &SqliteRow) -> Result<FavoriteAuthor> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let created_at: String = row.get("created_at");

    Ok(FavoriteAuthor {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        author: row.get("author"),
        created_at: parse_timestamp(&created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::users::tests::insert_test_user;
    use shelfmark_common::db::init_memory_database;

    #[tokio::test]
    async fn test_create_list_delete_round_trip() {
        let pool = init_memory_database().await.unwrap();
        let user_id = insert_test_user(&pool, "reader").await;

        let fav = create_favorite_author(&pool, user_id, "Banana Yoshimoto")
            .await
            .unwrap();
        create_favorite_author(&pool, user_id, "Ursula K. Le Guin")
            .await
            .unwrap();

        let names = list_favorite_author_names(&pool, user_id).await.unwrap();
        assert_eq!(names, vec!["Banana Yoshimoto", "Ursula K. Le Guin"]);

        assert!(delete_favorite_author(&pool, user_id, fav.id).await.unwrap());
        assert_eq!(list_favorite_authors(&pool, user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_author_rejected() {
        let pool = init_memory_database().await.unwrap();
        let user_id = insert_test_user(&pool, "reader").await;

        let result = create_favorite_author(&pool, user_id, "   ").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_cross_owner_delete_is_false() {
        let pool = init_memory_database().await.unwrap();
        let owner = insert_test_user(&pool, "owner").await;
        let other = insert_test_user(&pool, "other").await;

        let fav = create_favorite_author(&pool, owner, "Shared Taste").await.unwrap();
        assert!(!delete_favorite_author(&pool, other, fav.id).await.unwrap());
        assert_eq!(list_favorite_authors(&pool, owner).await.unwrap().len(), 1);
    }
}
