//! Loan database operations
//!
//! A loan starts out with no return date and makes exactly one forward
//! transition: setting `returned_at`. Loans are never hard-deleted, so the
//! loan history of a book survives the book's own deletion only as long as
//! the book row exists (the FK cascades on book delete).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelfmark_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid};
use crate::cache::Keyed;

/// Loan record
#[derive(Debug, Clone, Serialize)]
pub struct Loan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub borrower: String,
    pub loaned_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Keyed for Loan {
    fn key(&self) -> Uuid {
        self.id
    }
}

/// Fields accepted when recording a loan-out
#[derive(Debug, Clone, Deserialize)]
pub struct NewLoan {
    pub book_id: Uuid,
    pub borrower: String,
    #[serde(default)]
    pub loaned_at: Option<DateTime<Utc>>,
}

/// List the owner's loans, optionally restricted to one book, newest first
pub async fn list_loans(
    pool: &SqlitePool,
    user_id: Uuid,
    book_id: Option<Uuid>,
) -> Result<Vec<Loan>> {
    let rows = match book_id {
        Some(book_id) => {
            sqlx::query(
                r#"
                SELECT id, user_id, book_id, borrower, loaned_at, returned_at, created_at
                FROM loans
                WHERE user_id = ? AND book_id = ?
                ORDER BY loaned_at DESC
                "#,
            )
            .bind(user_id.to_string())
            .bind(book_id.to_string())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(
                r#"
                SELECT id, user_id, book_id, borrower, loaned_at, returned_at, created_at
                FROM loans
                WHERE user_id = ?
                ORDER BY loaned_at DESC
                "#,
            )
            .bind(user_id.to_string())
            .fetch_all(pool)
            .await?
        }
    };

    rows.iter().map(loan_from_row).collect()
}

/// Load one loan; `None` when absent or not owned
pub async fn get_loan(pool: &SqlitePool, user_id: Uuid, id: Uuid) -> Result<Option<Loan>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, book_id, borrower, loaned_at, returned_at, created_at
        FROM loans
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id.to_string())
    .bind(user_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(loan_from_row).transpose()
}

/// Record a loan-out. The book must belong to the owner; the loan starts
/// with no return date.
pub async fn create_loan(pool: &SqlitePool, user_id: Uuid, new: NewLoan) -> Result<Loan> {
    if new.borrower.trim().is_empty() {
        return Err(Error::InvalidInput("Borrower name must not be empty".to_string()));
    }

    let now = Utc::now();
    let loan = Loan {
        id: Uuid::new_v4(),
        user_id,
        book_id: new.book_id,
        borrower: new.borrower,
        loaned_at: new.loaned_at.unwrap_or(now),
        returned_at: None,
        created_at: now,
    };

    let result = sqlx::query(
        r#"
        INSERT INTO loans (id, user_id, book_id, borrower, loaned_at, returned_at, created_at)
        SELECT ?, ?, ?, ?, ?, NULL, ?
        WHERE EXISTS (SELECT 1 FROM books WHERE id = ? AND user_id = ?)
        "#,
    )
    .bind(loan.id.to_string())
    .bind(loan.user_id.to_string())
    .bind(loan.book_id.to_string())
    .bind(&loan.borrower)
    .bind(loan.loaned_at.to_rfc3339())
    .bind(loan.created_at.to_rfc3339())
    .bind(loan.book_id.to_string())
    .bind(loan.user_id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Book not found: {}", loan.book_id)));
    }

    Ok(loan)
}

/// Set the return date. A loan that was already returned accepts a new
/// date; there is no transition back to on-loan. `None` when absent or
/// not owned.
pub async fn mark_returned(
    pool: &SqlitePool,
    user_id: Uuid,
    id: Uuid,
    returned_at: DateTime<Utc>,
) -> Result<Option<Loan>> {
    let result = sqlx::query(
        r#"
        UPDATE loans SET returned_at = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(returned_at.to_rfc3339())
    .bind(id.to_string())
    .bind(user_id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get_loan(pool, user_id, id).await
}

fn loan_from_row(row: &SqliteRow) -> Result<Loan> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let book_id: String = row.get("book_id");
    let loaned_at: String = row.get("loaned_at");
    let returned_at: Option<String> = row.get("returned_at");
    let created_at: String = row.get("created_at");

    Ok(Loan {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        book_id: parse_uuid(&book_id)?,
        borrower: row.get("borrower"),
        loaned_at: parse_timestamp(&loaned_at)?,
        returned_at: returned_at.as_deref().map(parse_timestamp).transpose()?,
        created_at: parse_timestamp(&created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::books::{create_book, NewBook};
    use crate::db::users::tests::insert_test_user;
    use shelfmark_common::db::init_memory_database;

    async fn setup_with_book() -> (SqlitePool, Uuid, Uuid) {
        let pool = init_memory_database().await.unwrap();
        let user_id = insert_test_user(&pool, "reader").await;
        let book = create_book(
            &pool,
            user_id,
            NewBook {
                title: "Lent Out".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        (pool, user_id, book.id)
    }

    #[tokio::test]
    async fn test_new_loan_starts_unreturned() {
        let (pool, user_id, book_id) = setup_with_book().await;

        let loan = create_loan(
            &pool,
            user_id,
            NewLoan {
                book_id,
                borrower: "Kenji".to_string(),
                loaned_at: None,
            },
        )
        .await
        .unwrap();

        assert!(loan.returned_at.is_none());

        let listed = list_loans(&pool, user_id, Some(book_id)).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].returned_at.is_none());
    }

    #[tokio::test]
    async fn test_return_transition_and_permitted_double_return() {
        let (pool, user_id, book_id) = setup_with_book().await;

        let loan = create_loan(
            &pool,
            user_id,
            NewLoan {
                book_id,
                borrower: "Mara".to_string(),
                loaned_at: None,
            },
        )
        .await
        .unwrap();

        let first_return = Utc::now();
        let returned = mark_returned(&pool, user_id, loan.id, first_return)
            .await
            .unwrap()
            .expect("Loan not found");
        assert_eq!(
            returned.returned_at.map(|d| d.timestamp()),
            Some(first_return.timestamp())
        );

        // A second return write still succeeds, even with an earlier date
        let earlier = first_return - chrono::Duration::days(2);
        let again = mark_returned(&pool, user_id, loan.id, earlier)
            .await
            .unwrap()
            .expect("Loan not found");
        assert_eq!(
            again.returned_at.map(|d| d.timestamp()),
            Some(earlier.timestamp())
        );
    }

    #[tokio::test]
    async fn test_loan_against_foreign_book_is_not_found() {
        let (pool, owner, book_id) = setup_with_book().await;
        let other = insert_test_user(&pool, "other").await;

        let result = create_loan(
            &pool,
            other,
            NewLoan {
                book_id,
                borrower: "Sneaky".to_string(),
                loaned_at: None,
            },
        )
        .await;
        assert!(matches!(result, Err(Error::NotFound(_))));

        // Owner's loan list is untouched
        assert!(list_loans(&pool, owner, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cross_owner_return_is_none() {
        let (pool, owner, book_id) = setup_with_book().await;
        let other = insert_test_user(&pool, "other").await;

        let loan = create_loan(
            &pool,
            owner,
            NewLoan {
                book_id,
                borrower: "Kenji".to_string(),
                loaned_at: None,
            },
        )
        .await
        .unwrap();

        let result = mark_returned(&pool, other, loan.id, Utc::now()).await.unwrap();
        assert!(result.is_none());

        // Still on loan for the owner
        let unchanged = get_loan(&pool, owner, loan.id).await.unwrap().unwrap();
        assert!(unchanged.returned_at.is_none());
    }
}
