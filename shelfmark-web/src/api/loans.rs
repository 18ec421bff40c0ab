//! Loan API handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::auth::CurrentUser;
use crate::db::loans::{Loan, NewLoan};
use crate::error::{ApiError, ApiResult};
use crate::{db, AppState};

/// GET /api/loans query parameters
#[derive(Debug, Deserialize)]
pub struct ListLoansQuery {
    pub book_id: Option<Uuid>,
}

/// PATCH /api/loans/:id request; omitting the date returns the book now
#[derive(Debug, Deserialize)]
pub struct ReturnLoanRequest {
    #[serde(default)]
    pub returned_at: Option<DateTime<Utc>>,
}

/// GET /api/loans
///
/// The per-book filter is applied over the cached full collection.
pub async fn list_loans(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Query(query): Query<ListLoansQuery>,
) -> ApiResult<Json<Vec<Loan>>> {
    let loans = match state.caches.loans.get(user_id).await {
        Some(loans) => loans,
        None => {
            let loans = db::loans::list_loans(&state.db, user_id, None).await?;
            state.caches.loans.put(user_id, loans.clone()).await;
            loans
        }
    };

    let loans = match query.book_id {
        Some(book_id) => loans.into_iter().filter(|l| l.book_id == book_id).collect(),
        None => loans,
    };

    Ok(Json(loans))
}

/// POST /api/loans
///
/// Records a loan-out; the new loan always starts with no return date.
pub async fn create_loan(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(request): Json<NewLoan>,
) -> ApiResult<(StatusCode, Json<Loan>)> {
    let loan = db::loans::create_loan(&state.db, user_id, request).await?;
    state.caches.loans.insert(user_id, loan.clone()).await;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// PATCH /api/loans/:id
///
/// The only loan mutation: set the return date.
pub async fn return_loan(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReturnLoanRequest>,
) -> ApiResult<Json<Loan>> {
    let returned_at = request.returned_at.unwrap_or_else(Utc::now);
    let loan = db::loans::mark_returned(&state.db, user_id, id, returned_at)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Loan not found: {}", id)))?;

    state.caches.loans.replace(user_id, loan.clone()).await;
    Ok(Json(loan))
}

/// Build loan routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/loans", get(list_loans).post(create_loan))
        .route("/api/loans/:id", axum::routing::patch(return_loan))
}
