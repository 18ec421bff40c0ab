//! Tag and book-tag link database operations

use chrono::{DateTime, Utc};
use serde::Serialize;
use shelfmark_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid};
use crate::cache::Keyed;

/// Tag record
#[derive(Debug, Clone, Serialize)]
pub struct Tag {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Keyed for Tag {
    fn key(&self) -> Uuid {
        self.id
    }
}

/// List the owner's tags, alphabetical
pub async fn list_tags(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, name, created_at
        FROM tags
        WHERE user_id = ?
        ORDER BY name ASC
        "#,
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(tag_from_row).collect()
}

/// Create a tag on demand. Duplicate names collapse onto the existing row;
/// the returned flag is true only when a new row was inserted.
pub async fn create_tag(pool: &SqlitePool, user_id: Uuid, name: &str) -> Result<(Tag, bool)> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("Tag name must not be empty".to_string()));
    }

    let inserted = sqlx::query(
        r#"
        INSERT INTO tags (id, user_id, name, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(user_id, name) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id.to_string())
    .bind(name)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?
    .rows_affected();

    let row = sqlx::query(
        r#"
        SELECT id, user_id, name, created_at
        FROM tags
        WHERE user_id = ? AND name = ?
        "#,
    )
    .bind(user_id.to_string())
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok((tag_from_row(&row)?, inserted > 0))
}

/// Delete a tag and (via cascade) its book links; `false` when absent or
/// not owned
pub async fn delete_tag(pool: &SqlitePool, user_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM tags WHERE id = ? AND user_id = ?")
        .bind(id.to_string())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Tags linked to one of the owner's books
pub async fn list_book_tags(pool: &SqlitePool, user_id: Uuid, book_id: Uuid) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.user_id, t.name, t.created_at
        FROM tags t
        JOIN book_tags bt ON bt.tag_id = t.id
        WHERE bt.book_id = ? AND bt.user_id = ?
        ORDER BY t.name ASC
        "#,
    )
    .bind(book_id.to_string())
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(tag_from_row).collect()
}

/// Link a tag to a book. Both rows must belong to the owner; an existing
/// link is left in place.
pub async fn link_book_tag(
    pool: &SqlitePool,
    user_id: Uuid,
    book_id: Uuid,
    tag_id: Uuid,
) -> Result<()> {
    let user = user_id.to_string();
    let result = sqlx::query(
        r#"
        INSERT INTO book_tags (id, user_id, book_id, tag_id, created_at)
        SELECT ?, ?, ?, ?, ?
        WHERE EXISTS (SELECT 1 FROM books WHERE id = ? AND user_id = ?)
          AND EXISTS (SELECT 1 FROM tags WHERE id = ? AND user_id = ?)
        ON CONFLICT(book_id, tag_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&user)
    .bind(book_id.to_string())
    .bind(tag_id.to_string())
    .bind(Utc::now().to_rfc3339())
    .bind(book_id.to_string())
    .bind(&user)
    .bind(tag_id.to_string())
    .bind(&user)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        // Zero rows is either an existing link (fine) or a book/tag the
        // caller does not own
        let linked: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_tags WHERE book_id = ? AND tag_id = ? AND user_id = ?",
        )
        .bind(book_id.to_string())
        .bind(tag_id.to_string())
        .bind(&user)
        .fetch_one(pool)
        .await?;

        if linked == 0 {
            return Err(Error::NotFound(format!(
                "Book {} or tag {} not found",
                book_id, tag_id
            )));
        }
    }

    Ok(())
}

/// Remove all tag links from one of the owner's books
pub async fn unlink_book_tags(pool: &SqlitePool, user_id: Uuid, book_id: Uuid) -> Result<usize> {
    let result = sqlx::query("DELETE FROM book_tags WHERE book_id = ? AND user_id = ?")
        .bind(book_id.to_string())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() as usize)
}

/// Distinct ids of the owner's books linked to any of the given tags.
/// Used as an inclusion filter by search.
pub async fn book_ids_for_tags(
    pool: &SqlitePool,
    user_id: Uuid,
    tag_ids: &[Uuid],
) -> Result<Vec<Uuid>> {
    if tag_ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; tag_ids.len()].join(", ");
    let sql = format!(
        "SELECT DISTINCT book_id FROM book_tags WHERE user_id = ? AND tag_id IN ({})",
        placeholders
    );

    let mut query = sqlx::query(&sql).bind(user_id.to_string());
    for tag_id in tag_ids {
        query = query.bind(tag_id.to_string());
    }

    let rows = query.fetch_all(pool).await?;
    rows.iter()
        .map(|row| parse_uuid(&row.get::<String, _>("book_id")))
        .collect()
}

fn tag_from_row(row: &SqliteRow) -> Result<Tag> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let created_at: String = row.get("created_at");

    Ok(Tag {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        name: row.get("name"),
        created_at: parse_timestamp(&created_at)?,
    })
}
