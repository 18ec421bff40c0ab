//! Quote database operations
//!
//! Quotes are free-standing records. When a quote arrives with a book title
//! but no book id, it is associated with the owner's book of that title if
//! one exists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelfmark_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid};
use crate::cache::Keyed;

/// Quote record
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub author: String,
    pub book_title: Option<String>,
    pub book_id: Option<Uuid>,
    pub page: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Keyed for Quote {
    fn key(&self) -> Uuid {
        self.id
    }
}

/// Fields accepted when recording a quote
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewQuote {
    pub content: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub book_title: Option<String>,
    #[serde(default)]
    pub book_id: Option<Uuid>,
    #[serde(default)]
    pub page: Option<i64>,
}

/// Fields accepted when updating a quote; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteUpdate {
    pub content: Option<String>,
    pub author: Option<String>,
    pub book_title: Option<String>,
    pub page: Option<i64>,
}

/// List the owner's quotes, newest first
pub async fn list_quotes(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Quote>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, content, author, book_title, book_id, page, created_at
        FROM quotes
        WHERE user_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(quote_from_row).collect()
}

/// Record a quote. A caller-supplied book id must belong to the owner;
/// otherwise the quote is matched to a book by title when possible.
pub async fn create_quote(pool: &SqlitePool, user_id: Uuid, new: NewQuote) -> Result<Quote> {
    if new.content.trim().is_empty() {
        return Err(Error::InvalidInput("Quote content must not be empty".to_string()));
    }

    let book_id = match new.book_id {
        Some(book_id) => {
            let owned = crate::db::books::get_book(pool, user_id, book_id).await?;
            if owned.is_none() {
                return Err(Error::NotFound(format!("Book not found: {}", book_id)));
            }
            Some(book_id)
        }
        None => match &new.book_title {
            Some(title) if !title.trim().is_empty() => {
                crate::db::books::find_book_id_by_title(pool, user_id, title).await?
            }
            _ => None,
        },
    };

    let quote = Quote {
        id: Uuid::new_v4(),
        user_id,
        content: new.content,
        author: new.author,
        book_title: new.book_title,
        book_id,
        page: new.page,
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO quotes (id, user_id, content, author, book_title, book_id, page, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(quote.id.to_string())
    .bind(quote.user_id.to_string())
    .bind(&quote.content)
    .bind(&quote.author)
    .bind(&quote.book_title)
    .bind(quote.book_id.map(|id| id.to_string()))
    .bind(quote.page)
    .bind(quote.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(quote)
}

/// Apply a partial update; `None` when the quote is absent or not owned
pub async fn update_quote(
    pool: &SqlitePool,
    user_id: Uuid,
    id: Uuid,
    update: QuoteUpdate,
) -> Result<Option<Quote>> {
    if let Some(content) = &update.content {
        if content.trim().is_empty() {
            return Err(Error::InvalidInput("Quote content must not be empty".to_string()));
        }
    }

    let result = sqlx::query(
        r#"
        UPDATE quotes SET
            content = COALESCE(?, content),
            author = COALESCE(?, author),
            book_title = COALESCE(?, book_title),
            page = COALESCE(?, page)
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(&update.content)
    .bind(&update.author)
    .bind(&update.book_title)
    .bind(update.page)
    .bind(id.to_string())
    .bind(user_id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    let row = sqlx::query(
        r#"
        SELECT id, user_id, content, author, book_title, book_id, page, created_at
        FROM quotes
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id.to_string())
    .bind(user_id.to_string())
    .fetch_one(pool)
    .await?;

    quote_from_row(&row).map(Some)
}

/// Delete a quote; `false` when absent or not owned
pub async fn delete_quote(pool: &SqlitePool, user_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM quotes WHERE id = ? AND user_id = ?")
        .bind(id.to_string())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn quote_from_row(row: &SqliteRow) -> Result<Quote> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let book_id: Option<String> = row.get("book_id");
    let created_at: String = row.get("created_at");

    Ok(Quote {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        content: row.get("content"),
        author: row.get("author"),
        book_title: row.get("book_title"),
        book_id: book_id.as_deref().map(parse_uuid).transpose()?,
        page: row.get("page"),
        created_at: parse_timestamp(&created_at)?,
    })
}
