//! Database initialization
//!
//! Opens (or creates) the SQLite database and creates all tables on first
//! run. Table creation is idempotent; callers may run it on every startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc creates the database file if it does not exist
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    configure_connection(&pool).await?;
    create_all_tables(&pool).await?;

    Ok(pool)
}

/// Initialize an in-memory database with the full schema (tests).
///
/// Every SQLite connection to `:memory:` opens its own database, so the
/// pool is capped at a single connection.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    configure_connection(&pool).await?;
    create_all_tables(&pool).await?;
    Ok(pool)
}

/// Connection-level pragmas
async fn configure_connection(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    // WAL allows concurrent readers with one writer; tag-link writes are
    // issued concurrently after a book insert
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;

    Ok(())
}

/// Create all tables in dependency order (idempotent)
pub async fn create_all_tables(pool: &SqlitePool) -> Result<()> {
    create_users_table(pool).await?;
    create_sessions_table(pool).await?;
    create_books_table(pool).await?;
    create_tags_table(pool).await?;
    create_book_tags_table(pool).await?;
    create_favorite_authors_table(pool).await?;
    create_loans_table(pool).await?;
    create_quotes_table(pool).await?;
    Ok(())
}

/// User accounts and profiles (one row per identity-provider subject)
pub async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            user_id TEXT PRIMARY KEY,
            external_subject TEXT NOT NULL UNIQUE,
            username TEXT NOT NULL,
            bio TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Active sessions (opaque bearer tokens issued at login)
pub async fn create_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            token TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Books, one owner per row; rating and comment bounds are also enforced
/// at the access layer
pub async fn create_books_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS books (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            author TEXT NOT NULL DEFAULT '',
            publisher TEXT NOT NULL DEFAULT '',
            rating INTEGER NOT NULL DEFAULT 0 CHECK (rating BETWEEN 0 AND 5),
            comment TEXT NOT NULL DEFAULT '' CHECK (length(comment) <= 100),
            status TEXT NOT NULL DEFAULT 'unread'
                CHECK (status IN ('unread', 'reading', 'completed')),
            favorite INTEGER NOT NULL DEFAULT 0 CHECK (favorite IN (0, 1)),
            cover_url TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_books_user ON books(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Per-user tag vocabulary; duplicate names collapse onto one row
pub async fn create_tags_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tags (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE (user_id, name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Book/tag many-to-many links
pub async fn create_book_tags_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS book_tags (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
            book_id TEXT NOT NULL REFERENCES books(id) ON DELETE CASCADE,
            tag_id TEXT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL,
            UNIQUE (book_id, tag_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_book_tags_book ON book_tags(book_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Per-user favorite author allow-list used to bias search
pub async fn create_favorite_authors_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS favorite_authors (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
            author TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Loan-out records; returned_at NULL means the book is still out.
/// Rows are never hard-deleted.
pub async fn create_loans_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS loans (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
            book_id TEXT NOT NULL REFERENCES books(id) ON DELETE CASCADE,
            borrower TEXT NOT NULL,
            loaned_at TEXT NOT NULL,
            returned_at TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_loans_user ON loans(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Memorable quotes, optionally associated with a book
pub async fn create_quotes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS quotes (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
            content TEXT NOT NULL,
            author TEXT NOT NULL DEFAULT '',
            book_title TEXT,
            book_id TEXT REFERENCES books(id) ON DELETE SET NULL,
            page INTEGER,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_quotes_user ON quotes(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_database_has_all_tables() {
        let pool = init_memory_database()
            .await
            .expect("Failed to create in-memory database");

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .expect("Failed to list tables");

        let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
        for expected in [
            "users",
            "sessions",
            "books",
            "tags",
            "book_tags",
            "favorite_authors",
            "loans",
            "quotes",
        ] {
            assert!(names.contains(&expected), "missing table {}", expected);
        }
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() {
        let pool = init_memory_database()
            .await
            .expect("Failed to create in-memory database");

        // Second run must not fail
        create_all_tables(&pool)
            .await
            .expect("Re-running table creation failed");
    }

    #[tokio::test]
    async fn test_init_database_creates_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = dir.path().join("data").join("shelfmark.db");

        let pool = init_database(&db_path)
            .await
            .expect("Failed to initialize database");
        drop(pool);

        assert!(db_path.exists());
    }
}
