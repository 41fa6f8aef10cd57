// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use deck_tracker::config::{Config, StoreConfig};
use deck_tracker::middleware::auth::create_jwt;
use deck_tracker::routes::create_router;
use deck_tracker::services::SessionRegistry;
use deck_tracker::store::Store;
use deck_tracker::AppState;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// Test app backed by a local store in a fresh temporary directory.
///
/// The directory lives as long as the returned `TempDir`.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = Config::test_default();
    config.store = StoreConfig::Local {
        data_dir: dir.path().to_path_buf(),
    };
    let (app, state) = create_test_app_with_config(config);
    (app, state, dir)
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let store = Store::from_config(&config.store).expect("store");
    let state = Arc::new(AppState {
        config,
        sessions: SessionRegistry::new(store),
    });

    (create_router(state.clone()), state)
}

/// `Authorization` header value for `user_key`.
#[allow(dead_code)]
pub fn bearer(state: &AppState, user_key: &str) -> String {
    let token = create_jwt(user_key, &state.config.jwt_signing_key).expect("jwt");
    format!("Bearer {}", token)
}

/// Send one request, optionally authenticated and with a JSON body.
#[allow(dead_code)]
pub async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

#[allow(dead_code)]
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
