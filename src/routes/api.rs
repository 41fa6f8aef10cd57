// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for the match tracker.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::deck::ClassGroup;
use crate::models::document::RECENT_HISTORY_LEN;
use crate::models::{
    DeckClass, DeckValidationError, ExportDocument, MatchRecord, MatchResult, StatsDashboard,
};
use crate::services::{CommandOutcome, SessionHandle};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{delete, get, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Routes that need no session.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/classes", get(get_classes))
}

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/state", get(get_state))
        .route("/api/selection/my-deck", put(select_my_deck))
        .route("/api/selection/opponent", put(select_opponent))
        .route("/api/matches", get(get_matches).post(record_match))
        .route("/api/matches/{id}", put(edit_match).delete(delete_match))
        .route("/api/decks", get(get_decks).post(add_deck))
        .route("/api/decks/{name}", delete(delete_deck))
        .route("/api/stats", get(get_stats))
        .route("/api/stats/filter", put(set_stats_filter))
        .route("/api/stats/opponent-classes", put(set_opponent_classes))
        .route("/api/export", get(export))
}

async fn open_session(state: &AppState, user: &AuthUser) -> SessionHandle {
    state.sessions.open(&user.user_key).await
}

fn check<T: Validate>(body: &T) -> Result<()> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

// ─── Classes ─────────────────────────────────────────────────

/// Class metadata for the UI.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ClassInfo {
    pub code: DeckClass,
    pub name: &'static str,
    pub color: &'static str,
}

async fn get_classes() -> Json<Vec<ClassInfo>> {
    Json(
        DeckClass::ALL
            .into_iter()
            .map(|class| ClassInfo {
                code: class,
                name: class.display_name(),
                color: class.color(),
            })
            .collect(),
    )
}

// ─── Session State ───────────────────────────────────────────

/// Everything the main screen needs.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StateResponse {
    pub user_key: String,
    pub my_deck: String,
    pub my_deck_class: Option<DeckClass>,
    pub current_opponent: String,
    pub current_opponent_class: Option<DeckClass>,
    pub decks: Vec<ClassGroup>,
    pub recent_matches: Vec<MatchRecord>,
    pub total_matches: usize,
    pub stats_filter: String,
    pub opponent_class_filter: BTreeSet<DeckClass>,
}

async fn get_state(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<StateResponse>> {
    let handle = open_session(&state, &user).await;
    let session = handle.lock().await;
    let doc = session.document();

    let class_of = |name: &str| doc.deck(name).map(|d| d.class);

    Ok(Json(StateResponse {
        user_key: session.user_key().to_string(),
        my_deck: doc.my_deck.clone(),
        my_deck_class: class_of(&doc.my_deck),
        current_opponent: doc.current_opponent.clone(),
        current_opponent_class: class_of(&doc.current_opponent),
        decks: doc.grouped_decks(),
        recent_matches: doc.recent_matches(RECENT_HISTORY_LEN).to_vec(),
        total_matches: doc.matches.len(),
        stats_filter: doc.stats_filter.clone(),
        opponent_class_filter: doc.opponent_class_filter.clone(),
    }))
}

// ─── Selection ───────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct SelectDeckRequest {
    /// Deck name; empty clears the selection
    #[validate(length(max = 64))]
    pub name: String,
}

async fn select_my_deck(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<SelectDeckRequest>,
) -> Result<Json<CommandOutcome>> {
    check(&body)?;
    let handle = open_session(&state, &user).await;
    let mut session = handle.lock().await;
    Ok(Json(session.select_my_deck(&body.name).await?))
}

async fn select_opponent(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<SelectDeckRequest>,
) -> Result<Json<CommandOutcome>> {
    check(&body)?;
    let handle = open_session(&state, &user).await;
    let mut session = handle.lock().await;
    Ok(Json(session.select_opponent(&body.name).await?))
}

// ─── Matches ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct MatchesQuery {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    RECENT_HISTORY_LEN
}

/// Newest matches first.
async fn get_matches(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<MatchesQuery>,
) -> Result<Json<Vec<MatchRecord>>> {
    let handle = open_session(&state, &user).await;
    let session = handle.lock().await;
    Ok(Json(session.recent_matches(params.limit).to_vec()))
}

#[derive(Deserialize)]
pub struct RecordMatchRequest {
    pub result: MatchResult,
}

async fn record_match(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<RecordMatchRequest>,
) -> Result<Json<CommandOutcome>> {
    let handle = open_session(&state, &user).await;
    let mut session = handle.lock().await;
    Ok(Json(session.record_match(body.result).await?))
}

#[derive(Deserialize, Validate)]
pub struct EditMatchRequest {
    #[validate(length(max = 64))]
    pub my_deck: String,
    #[validate(length(max = 64))]
    pub opponent_deck: String,
    pub result: MatchResult,
}

async fn edit_match(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(body): Json<EditMatchRequest>,
) -> Result<Json<CommandOutcome>> {
    check(&body)?;
    let handle = open_session(&state, &user).await;
    let mut session = handle.lock().await;
    let outcome = session
        .edit_match(id, &body.my_deck, &body.opponent_deck, body.result)
        .await?;
    Ok(Json(outcome))
}

async fn delete_match(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<CommandOutcome>> {
    let handle = open_session(&state, &user).await;
    let mut session = handle.lock().await;
    Ok(Json(session.delete_match(id).await?))
}

// ─── Deck Catalog ────────────────────────────────────────────

async fn get_decks(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ClassGroup>>> {
    let handle = open_session(&state, &user).await;
    let session = handle.lock().await;
    Ok(Json(session.document().grouped_decks()))
}

#[derive(Deserialize, Validate)]
pub struct AddDeckRequest {
    #[validate(length(max = 64))]
    pub name: String,
    /// Class code (`E`, `R`, ...)
    pub class: String,
}

async fn add_deck(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<AddDeckRequest>,
) -> Result<Json<CommandOutcome>> {
    check(&body)?;
    let handle = open_session(&state, &user).await;
    let mut session = handle.lock().await;
    Ok(Json(session.add_deck(&body.name, &body.class).await?))
}

async fn delete_deck(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(name): Path<String>,
) -> Result<Json<CommandOutcome>> {
    let handle = open_session(&state, &user).await;
    let mut session = handle.lock().await;
    Ok(Json(session.delete_deck(&name).await?))
}

// ─── Stats ───────────────────────────────────────────────────

async fn get_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<StatsDashboard>> {
    let handle = open_session(&state, &user).await;
    let session = handle.lock().await;
    Ok(Json(session.dashboard()))
}

#[derive(Deserialize, Validate)]
pub struct StatsFilterRequest {
    /// Deck to scope stats to; empty means all matches
    #[validate(length(max = 64))]
    pub deck: String,
}

async fn set_stats_filter(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<StatsFilterRequest>,
) -> Result<Json<CommandOutcome>> {
    check(&body)?;
    let handle = open_session(&state, &user).await;
    let mut session = handle.lock().await;
    Ok(Json(session.set_stats_filter(&body.deck).await?))
}

#[derive(Deserialize)]
pub struct OpponentClassesRequest {
    pub classes: Vec<String>,
}

async fn set_opponent_classes(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<OpponentClassesRequest>,
) -> Result<Json<CommandOutcome>> {
    let classes = body
        .classes
        .iter()
        .map(|code| code.parse::<DeckClass>())
        .collect::<std::result::Result<BTreeSet<_>, DeckValidationError>>()?;

    let handle = open_session(&state, &user).await;
    let mut session = handle.lock().await;
    Ok(Json(session.set_opponent_class_filter(classes).await?))
}

// ─── Export ──────────────────────────────────────────────────

/// Download the catalog and match log as a JSON file.
async fn export(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let handle = open_session(&state, &user).await;
    let session = handle.lock().await;

    let body = serde_json::to_string_pretty(&session.export())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Export encoding failed: {}", e)))?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        ExportDocument::file_name(session.user_key())
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}
