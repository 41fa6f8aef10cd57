// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use deck_tracker::error::AppError;
use deck_tracker::models::DeckValidationError;
use deck_tracker::store::StoreError;

async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_validation_error_is_bad_request_with_details() {
    let err: AppError = DeckValidationError::DuplicateName("Foo".to_string()).into();
    let (status, body) = render(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"], "A deck named 'Foo' already exists");
}

#[tokio::test]
async fn test_storage_error_hides_details() {
    let err: AppError = StoreError::Io("/data/tracker_a.json: permission denied".to_string()).into();
    let (status, body) = render(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "storage_error");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_auth_errors() {
    let (status, body) = render(AppError::Unauthorized).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, body) = render(AppError::InvalidToken).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn test_bad_request() {
    let (status, body) = render(AppError::BadRequest("name too long".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}
