// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie attribute tests.
//!
//! These tests verify the cookie set on login, and that logout removes it
//! with matching attributes for localhost and production-style frontends.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use deck_tracker::config::{Config, StoreConfig};
use serde_json::json;
use tower::ServiceExt;

mod common;

fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

fn app_with_frontend_url(frontend_url: &str) -> (axum::Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::test_default();
    config.frontend_url = frontend_url.to_string();
    config.store = StoreConfig::Local {
        data_dir: dir.path().to_path_buf(),
    };
    let (app, _) = common::create_test_app_with_config(config);
    (app, dir)
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let (app, _dir) = app_with_frontend_url("http://localhost:5173");

    let response = common::send(
        &app,
        "POST",
        "/api/session",
        None,
        Some(json!({"user_name": "Alice"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookies = set_cookie_headers(&response);
    let token_cookie = find_cookie(&set_cookies, "tracker_token");
    assert!(token_cookie.contains("Path=/"));
    assert!(token_cookie.contains("HttpOnly"));
    assert!(token_cookie.contains("SameSite=Lax"));
    assert!(!token_cookie.contains("Secure"));

    let body = common::json_body(response).await;
    assert_eq!(body["user_key"], "alice");
    assert!(token_cookie.contains(body["token"].as_str().unwrap()));
}

#[tokio::test]
async fn test_session_cookie_authenticates() {
    let (app, _dir) = app_with_frontend_url("http://localhost:5173");

    let response = common::send(
        &app,
        "POST",
        "/api/session",
        None,
        Some(json!({"user_name": "bob"})),
    )
    .await;
    let token = common::json_body(response).await["token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/state")
                .header(header::COOKIE, format!("tracker_token={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::json_body(response).await["user_key"], "bob");
}

#[tokio::test]
async fn test_logout_cookie_removal_localhost_attributes() {
    let (app, _dir) = app_with_frontend_url("http://localhost:5173");
    let login = common::send(
        &app,
        "POST",
        "/api/session",
        None,
        Some(json!({"user_name": "carol"})),
    )
    .await;
    let token = common::json_body(login).await["token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/session")
                .header(header::COOKIE, format!("tracker_token={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let set_cookies = set_cookie_headers(&response);
    let token_cookie = find_cookie(&set_cookies, "tracker_token");

    assert!(token_cookie.contains("Path=/"));
    assert!(token_cookie.contains("HttpOnly"));
    assert!(token_cookie.contains("SameSite=Lax"));
    assert!(token_cookie.contains("Max-Age=0"));
    assert!(!token_cookie.contains("Secure"));
    assert!(!token_cookie.contains("Domain="));
}

#[tokio::test]
async fn test_logout_cookie_removal_production_attributes() {
    let (app, _dir) = app_with_frontend_url("https://tracker.example.com");
    let login = common::send(
        &app,
        "POST",
        "/api/session",
        None,
        Some(json!({"user_name": "dave"})),
    )
    .await;
    let token = common::json_body(login).await["token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = common::send(
        &app,
        "DELETE",
        "/api/session",
        Some(&format!("Bearer {}", token)),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let set_cookies = set_cookie_headers(&response);
    let token_cookie = find_cookie(&set_cookies, "tracker_token");

    assert!(token_cookie.contains("Path=/"));
    assert!(token_cookie.contains("HttpOnly"));
    assert!(token_cookie.contains("Max-Age=0"));
    assert!(token_cookie.contains("Secure"));
}
