//! Integration tests for loans and quotes

mod helpers;

use axum::http::StatusCode;
use helpers::{create_test_state, request, response_json, seed_session};
use serde_json::json;
use tower::util::ServiceExt;

async fn create_book(
    app: &axum::Router,
    token: &str,
    title: &str,
) -> String {
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/books",
            Some(token),
            Some(json!({"title": title})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = response_json(response).await;
    created["book"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_loan_lifecycle() {
    let state = create_test_state().await;
    let (_user_id, token) = seed_session(&state, "reader").await;
    let app = shelfmark_web::build_router(state);

    let book_id = create_book(&app, &token, "Lent Out").await;

    // Loan-out starts with no return date
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/loans",
            Some(&token),
            Some(json!({"book_id": book_id, "borrower": "Kenji"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let loan = response_json(response).await;
    assert!(loan["returned_at"].is_null());
    let loan_id = loan["id"].as_str().unwrap().to_string();

    // Listing filtered by book shows the open loan
    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/loans?book_id={}", book_id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    let loans = response_json(response).await;
    assert_eq!(loans.as_array().unwrap().len(), 1);

    // Return sets the date
    let response = app
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/api/loans/{}", loan_id),
            Some(&token),
            Some(json!({"returned_at": "2026-08-01T12:00:00Z"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let loan = response_json(response).await;
    assert!(loan["returned_at"]
        .as_str()
        .unwrap()
        .starts_with("2026-08-01"));

    // A second return write still succeeds, even with an earlier date
    let response = app
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/api/loans/{}", loan_id),
            Some(&token),
            Some(json!({"returned_at": "2026-07-15T12:00:00Z"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let loan = response_json(response).await;
    assert!(loan["returned_at"]
        .as_str()
        .unwrap()
        .starts_with("2026-07-15"));

    // The cached list reflects the mutation
    let response = app
        .oneshot(request("GET", "/api/loans", Some(&token), None))
        .await
        .unwrap();
    let loans = response_json(response).await;
    assert!(loans[0]["returned_at"]
        .as_str()
        .unwrap()
        .starts_with("2026-07-15"));
}

#[tokio::test]
async fn test_loan_cross_owner_isolation() {
    let state = create_test_state().await;
    let (_owner, owner_token) = seed_session(&state, "owner").await;
    let (_other, other_token) = seed_session(&state, "other").await;
    let app = shelfmark_web::build_router(state);

    let book_id = create_book(&app, &owner_token, "Mine").await;

    // Loaning out someone else's book: 404
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/loans",
            Some(&other_token),
            Some(json!({"book_id": book_id, "borrower": "Sneaky"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Returning someone else's loan: 404
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/loans",
            Some(&owner_token),
            Some(json!({"book_id": book_id, "borrower": "Kenji"})),
        ))
        .await
        .unwrap();
    let loan = response_json(response).await;
    let loan_id = loan["id"].as_str().unwrap();

    let response = app
        .oneshot(request(
            "PATCH",
            &format!("/api/loans/{}", loan_id),
            Some(&other_token),
            Some(json!({})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_loan_requires_borrower() {
    let state = create_test_state().await;
    let (_user_id, token) = seed_session(&state, "reader").await;
    let app = shelfmark_web::build_router(state);

    let book_id = create_book(&app, &token, "Unborrowed").await;

    let response = app
        .oneshot(request(
            "POST",
            "/api/loans",
            Some(&token),
            Some(json!({"book_id": book_id, "borrower": "  "})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_quote_round_trip_with_title_association() {
    let state = create_test_state().await;
    let (_user_id, token) = seed_session(&state, "reader").await;
    let app = shelfmark_web::build_router(state);

    let book_id = create_book(&app, &token, "The Little Prince").await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/quotes",
            Some(&token),
            Some(json!({
                "content": "What is essential is invisible to the eye.",
                "author": "Antoine de Saint-Exupéry",
                "book_title": "the little prince",
                "page": 72
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let quote = response_json(response).await;
    assert_eq!(quote["book_id"], book_id.as_str());
    let quote_id = quote["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/api/quotes/{}", quote_id),
            Some(&token),
            Some(json!({"page": 73})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let quote = response_json(response).await;
    assert_eq!(quote["page"], 73);

    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/api/quotes/{}", quote_id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(request("GET", "/api/quotes", Some(&token), None))
        .await
        .unwrap();
    let quotes = response_json(response).await;
    assert!(quotes.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_quote_without_matching_title_stays_free_standing() {
    let state = create_test_state().await;
    let (_user_id, token) = seed_session(&state, "reader").await;
    let app = shelfmark_web::build_router(state);

    let response = app
        .oneshot(request(
            "POST",
            "/api/quotes",
            Some(&token),
            Some(json!({
                "content": "A quote from a book I do not own.",
                "book_title": "Unknown Tome"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let quote = response_json(response).await;
    assert!(quote["book_id"].is_null());
    assert_eq!(quote["book_title"], "Unknown Tome");
}

#[tokio::test]
async fn test_quote_requires_content() {
    let state = create_test_state().await;
    let (_user_id, token) = seed_session(&state, "reader").await;
    let app = shelfmark_web::build_router(state);

    let response = app
        .oneshot(request(
            "POST",
            "/api/quotes",
            Some(&token),
            Some(json!({"content": ""})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
