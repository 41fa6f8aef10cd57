// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login and logout.
//!
//! There are no passwords: the user name is sanitized into a storage key and
//! that key becomes the session identity.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser, SESSION_COOKIE};
use crate::models::sanitize_user_key;
use crate::AppState;

/// Login route (public).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/session", post(login))
}

/// Logout route (requires auth).
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/session", delete(logout))
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(max = 200))]
    pub user_name: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub user_key: String,
    pub token: String,
}

/// Cookies are `Secure` unless the frontend is served over plain HTTP.
fn session_cookie(state: &AppState, value: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.frontend_url.starts_with("https://"))
        .build()
}

/// Open a session for a user name.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let user_key = sanitize_user_key(&body.user_name);
    if user_key.is_empty() {
        // Nothing usable as a storage key: no active user
        return Err(AppError::Unauthorized);
    }

    state.sessions.open(&user_key).await;

    let token = create_jwt(&user_key, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    tracing::info!(user_key = %user_key, "Login");

    let jar = jar.add(session_cookie(&state, token.clone()));
    Ok((jar, Json(LoginResponse { user_key, token })))
}

/// Evict the session and clear the cookie.
async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> (CookieJar, StatusCode) {
    state.sessions.close(&user.user_key);

    let jar = jar.remove(session_cookie(&state, String::new()));
    (jar, StatusCode::NO_CONTENT)
}
