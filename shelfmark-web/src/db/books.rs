//! Book database operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelfmark_common::types::BookStatus;
use shelfmark_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid};
use crate::cache::Keyed;

/// Maximum comment length in characters
pub const MAX_COMMENT_CHARS: usize = 100;

/// Maximum rating value
pub const MAX_RATING: u8 = 5;

/// Book record
#[derive(Debug, Clone, Serialize)]
pub struct Book {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub rating: u8,
    pub comment: String,
    pub status: BookStatus,
    pub favorite: bool,
    pub cover_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Keyed for Book {
    fn key(&self) -> Uuid {
        self.id
    }
}

/// Fields accepted when creating a book
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBook {
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub status: BookStatus,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub cover_url: Option<String>,
}

/// Fields accepted when updating a book; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub rating: Option<u8>,
    pub comment: Option<String>,
    pub status: Option<BookStatus>,
    pub favorite: Option<bool>,
    pub cover_url: Option<String>,
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::InvalidInput("Book title must not be empty".to_string()));
    }
    Ok(())
}

fn validate_rating(rating: u8) -> Result<()> {
    if rating > MAX_RATING {
        return Err(Error::InvalidInput(format!(
            "Rating must be between 0 and {}, got {}",
            MAX_RATING, rating
        )));
    }
    Ok(())
}

fn validate_comment(comment: &str) -> Result<()> {
    let chars = comment.chars().count();
    if chars > MAX_COMMENT_CHARS {
        return Err(Error::InvalidInput(format!(
            "Comment must be at most {} characters, got {}",
            MAX_COMMENT_CHARS, chars
        )));
    }
    Ok(())
}

/// List the owner's books, newest first
pub async fn list_books(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Book>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, title, author, publisher, rating, comment,
               status, favorite, cover_url, created_at, updated_at
        FROM books
        WHERE user_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(book_from_row).collect()
}

/// Load one book; `None` when absent or owned by someone else
pub async fn get_book(pool: &SqlitePool, user_id: Uuid, id: Uuid) -> Result<Option<Book>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, title, author, publisher, rating, comment,
               status, favorite, cover_url, created_at, updated_at
        FROM books
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id.to_string())
    .bind(user_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(book_from_row).transpose()
}

/// Create a book for the owner
pub async fn create_book(pool: &SqlitePool, user_id: Uuid, new: NewBook) -> Result<Book> {
    validate_title(&new.title)?;
    validate_rating(new.rating)?;
    validate_comment(&new.comment)?;

    let now = Utc::now();
    let book = Book {
        id: Uuid::new_v4(),
        user_id,
        title: new.title,
        author: new.author,
        publisher: new.publisher,
        rating: new.rating,
        comment: new.comment,
        status: new.status,
        favorite: new.favorite,
        cover_url: new.cover_url,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO books (id, user_id, title, author, publisher, rating, comment,
                           status, favorite, cover_url, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(book.id.to_string())
    .bind(book.user_id.to_string())
    .bind(&book.title)
    .bind(&book.author)
    .bind(&book.publisher)
    .bind(book.rating as i64)
    .bind(&book.comment)
    .bind(book.status.as_str())
    .bind(book.favorite as i64)
    .bind(&book.cover_url)
    .bind(book.created_at.to_rfc3339())
    .bind(book.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(book)
}

/// Apply a partial update; `None` when the book is absent or not owned
pub async fn update_book(
    pool: &SqlitePool,
    user_id: Uuid,
    id: Uuid,
    update: BookUpdate,
) -> Result<Option<Book>> {
    if let Some(title) = &update.title {
        validate_title(title)?;
    }
    if let Some(rating) = update.rating {
        validate_rating(rating)?;
    }
    if let Some(comment) = &update.comment {
        validate_comment(comment)?;
    }

    let result = sqlx::query(
        r#"
        UPDATE books SET
            title = COALESCE(?, title),
            author = COALESCE(?, author),
            publisher = COALESCE(?, publisher),
            rating = COALESCE(?, rating),
            comment = COALESCE(?, comment),
            status = COALESCE(?, status),
            favorite = COALESCE(?, favorite),
            cover_url = COALESCE(?, cover_url),
            updated_at = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(&update.title)
    .bind(&update.author)
    .bind(&update.publisher)
    .bind(update.rating.map(|r| r as i64))
    .bind(&update.comment)
    .bind(update.status.map(|s| s.as_str()))
    .bind(update.favorite.map(|f| f as i64))
    .bind(&update.cover_url)
    .bind(Utc::now().to_rfc3339())
    .bind(id.to_string())
    .bind(user_id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get_book(pool, user_id, id).await
}

/// Delete a book; `false` when the book is absent or not owned
pub async fn delete_book(pool: &SqlitePool, user_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM books WHERE id = ? AND user_id = ?")
        .bind(id.to_string())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Find the owner's book whose title matches exactly (case-insensitive).
/// Used to associate quotes with books by title.
pub async fn find_book_id_by_title(
    pool: &SqlitePool,
    user_id: Uuid,
    title: &str,
) -> Result<Option<Uuid>> {
    let row: Option<(String,)> = sqlx::query_as(
        r#"
        SELECT id FROM books
        WHERE user_id = ? AND LOWER(title) = LOWER(?)
        ORDER BY created_at ASC
        LIMIT 1
        "#,
    )
    .bind(user_id.to_string())
    .bind(title)
    .fetch_optional(pool)
    .await?;

    row.map(|(id,)| parse_uuid(&id)).transpose()
}

/// Case-insensitive substring search over the owner's books.
///
/// `title` matches the title; `authors` is an OR-list matched against the
/// author column (the search-by-all-favorite-authors action passes every
/// stored name). `allowed_ids`, when present, restricts the result to a
/// pre-computed inclusion set (tag filtering).
pub async fn search_books(
    pool: &SqlitePool,
    user_id: Uuid,
    title: Option<&str>,
    authors: &[String],
    allowed_ids: Option<&[Uuid]>,
) -> Result<Vec<Book>> {
    let mut sql = String::from(
        r#"
        SELECT id, user_id, title, author, publisher, rating, comment,
               status, favorite, cover_url, created_at, updated_at
        FROM books
        WHERE user_id = ?
        "#,
    );

    if title.is_some() {
        sql.push_str(" AND LOWER(title) LIKE ? ESCAPE '\\'");
    }
    if !authors.is_empty() {
        let clauses = vec!["LOWER(author) LIKE ? ESCAPE '\\'"; authors.len()].join(" OR ");
        sql.push_str(&format!(" AND ({})", clauses));
    }
    if let Some(ids) = allowed_ids {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        sql.push_str(&format!(" AND id IN ({})", placeholders));
    }
    sql.push_str(" ORDER BY created_at DESC");

    let mut query = sqlx::query(&sql).bind(user_id.to_string());
    if let Some(title) = title {
        query = query.bind(like_pattern(title));
    }
    for author in authors {
        query = query.bind(like_pattern(author));
    }
    if let Some(ids) = allowed_ids {
        for id in ids {
            query = query.bind(id.to_string());
        }
    }

    let rows = query.fetch_all(pool).await?;
    rows.iter().map(book_from_row).collect()
}

/// Lowercased substring pattern with LIKE metacharacters escaped
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

pub(crate) fn book_from_row(row: &SqliteRow) -> Result<Book> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let status: String = row.get("status");
    let status = BookStatus::parse(&status)
        .ok_or_else(|| Error::Internal(format!("Unknown book status: {}", status)))?;
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Book {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        title: row.get("title"),
        author: row.get("author"),
        publisher: row.get("publisher"),
        rating: row.get::<i64, _>("rating") as u8,
        comment: row.get("comment"),
        status,
        favorite: row.get::<i64, _>("favorite") != 0,
        cover_url: row.get("cover_url"),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}
