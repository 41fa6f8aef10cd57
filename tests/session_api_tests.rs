// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end tests of the tracker API over a local store.

use axum::http::{header, StatusCode};
use serde_json::{json, Value};

mod common;

async fn login(app: &axum::Router, name: &str) -> String {
    let response = common::send(
        app,
        "POST",
        "/api/session",
        None,
        Some(json!({ "user_name": name })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    format!("Bearer {}", body["token"].as_str().unwrap())
}

async fn call(app: &axum::Router, auth: &str, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let response = common::send(app, method, uri, Some(auth), body).await;
    let status = response.status();
    (status, common::json_body(response).await)
}

async fn play(app: &axum::Router, auth: &str, mine: &str, theirs: &str, result: &str) -> Value {
    call(app, auth, "PUT", "/api/selection/my-deck", Some(json!({ "name": mine }))).await;
    call(app, auth, "PUT", "/api/selection/opponent", Some(json!({ "name": theirs }))).await;
    let (status, body) = call(app, auth, "POST", "/api/matches", Some(json!({ "result": result }))).await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn test_record_match_flow() {
    let (app, _, dir) = common::create_test_app();
    let auth = login(&app, "alice").await;

    // Without an opponent nothing is recorded
    call(&app, &auth, "PUT", "/api/selection/my-deck", Some(json!({"name": "リノE"}))).await;
    let (_, outcome) = call(&app, &auth, "POST", "/api/matches", Some(json!({"result": "win"}))).await;
    assert_eq!(outcome, json!({"changed": false, "saved": false, "warning": null}));

    let outcome = play(&app, &auth, "リノE", "財宝R", "win").await;
    assert_eq!(outcome, json!({"changed": true, "saved": true, "warning": null}));

    let (_, state) = call(&app, &auth, "GET", "/api/state", None).await;
    assert_eq!(state["my_deck"], "リノE");
    assert_eq!(state["my_deck_class"], "E");
    assert_eq!(state["current_opponent"], "");
    assert_eq!(state["total_matches"], 1);
    let recorded = &state["recent_matches"][0];
    assert_eq!(recorded["opponent_deck"], "財宝R");
    assert_eq!(recorded["opponent_deck_class"], "R");
    assert_eq!(recorded["result"], "win");

    assert!(dir.path().join("tracker_alice.json").exists());
}

#[tokio::test]
async fn test_stats_dashboard() {
    let (app, _, _dir) = common::create_test_app();
    let auth = login(&app, "bob").await;

    play(&app, &auth, "リノE", "財宝R", "loss").await;
    play(&app, &auth, "リノE", "財宝R", "win").await;
    play(&app, &auth, "リノE", "進化D", "win").await;
    play(&app, &auth, "秘術W", "進化D", "win").await;

    let (status, stats) = call(&app, &auth, "GET", "/api/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["scope_label"], "all");
    assert_eq!(stats["stats"]["total"], 4);
    assert_eq!(stats["stats"]["wins"], 3);
    assert_eq!(stats["stats"]["win_rate_percent"], 75.0);
    assert_eq!(stats["win_streak"], 3);
    assert_eq!(stats["opponent_table"], Value::Null);
    // Only リノE has enough games to be ranked
    assert_eq!(stats["top_decks"].as_array().unwrap().len(), 1);
    assert_eq!(stats["top_decks"][0]["deck"], "リノE");
    assert_eq!(stats["deck_table"][0]["deck"], "リノE");
    assert_eq!(stats["deck_table"][0]["total"], 3);

    // Scope to one deck, then drop Royal opponents
    call(&app, &auth, "PUT", "/api/stats/filter", Some(json!({"deck": "リノE"}))).await;
    let (_, stats) = call(&app, &auth, "GET", "/api/stats", None).await;
    assert_eq!(stats["scope_label"], "リノE");
    assert_eq!(stats["scope_class"], "E");
    assert_eq!(stats["stats"]["total"], 3);
    assert_eq!(stats["stats"]["win_rate_percent"], 66.7);
    assert_eq!(stats["opponent_table"][0]["deck"], "進化D");

    let (status, _) = call(
        &app,
        &auth,
        "PUT",
        "/api/stats/opponent-classes",
        Some(json!({"classes": ["E", "D", "W", "Ni", "B", "Nm"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, stats) = call(&app, &auth, "GET", "/api/stats", None).await;
    assert_eq!(stats["stats"]["total"], 1);
    assert_eq!(stats["opponent_table"].as_array().unwrap().len(), 1);
    // The ranking ignores the scope
    assert_eq!(stats["deck_table"][0]["total"], 3);
}

#[tokio::test]
async fn test_edit_and_delete_match() {
    let (app, _, _dir) = common::create_test_app();
    let auth = login(&app, "carol").await;

    play(&app, &auth, "リノE", "財宝R", "loss").await;
    let (_, matches) = call(&app, &auth, "GET", "/api/matches", None).await;
    let id = matches[0]["id"].as_i64().unwrap();

    let (status, outcome) = call(
        &app,
        &auth,
        "PUT",
        &format!("/api/matches/{}", id),
        Some(json!({"my_deck": "秘術W", "opponent_deck": "破壊Nm", "result": "win"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["changed"], true);

    let (_, matches) = call(&app, &auth, "GET", "/api/matches?limit=5", None).await;
    assert_eq!(matches[0]["id"], id);
    assert_eq!(matches[0]["my_deck_class"], "W");
    assert_eq!(matches[0]["opponent_deck_class"], "Nm");
    assert_eq!(matches[0]["result"], "win");

    // Unknown ids are silent no-ops
    let (status, outcome) = call(
        &app,
        &auth,
        "PUT",
        "/api/matches/1",
        Some(json!({"my_deck": "a", "opponent_deck": "b", "result": "win"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["changed"], false);

    let uri = format!("/api/matches/{}", id);
    let (_, first) = call(&app, &auth, "DELETE", &uri, None).await;
    let (status, second) = call(&app, &auth, "DELETE", &uri, None).await;
    assert_eq!(first["changed"], true);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["changed"], false);

    let (_, matches) = call(&app, &auth, "GET", "/api/matches", None).await;
    assert_eq!(matches, json!([]));
}

#[tokio::test]
async fn test_deck_catalog_validation() {
    let (app, _, _dir) = common::create_test_app();
    let auth = login(&app, "dave").await;

    let (status, _) = call(&app, &auth, "POST", "/api/decks", Some(json!({"name": "Foo", "class": "E"}))).await;
    assert_eq!(status, StatusCode::OK);

    for (body, details) in [
        (json!({"name": "Foo", "class": "R"}), "already exists"),
        (json!({"name": "   ", "class": "R"}), "empty"),
        (json!({"name": "Bar", "class": "X"}), "Unknown deck class"),
    ] {
        let (status, error) = call(&app, &auth, "POST", "/api/decks", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "validation_error");
        assert!(error["details"].as_str().unwrap().contains(details), "{}", error);
    }

    let (_, groups) = call(&app, &auth, "GET", "/api/decks", None).await;
    let elf = groups
        .as_array()
        .unwrap()
        .iter()
        .find(|g| g["class"] == "E")
        .unwrap();
    let foos = elf["decks"].as_array().unwrap().iter().filter(|d| *d == "Foo").count();
    assert_eq!(foos, 1);

    let (status, _) = call(
        &app,
        &auth,
        "PUT",
        "/api/stats/opponent-classes",
        Some(json!({"classes": ["E", "Q"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_deck_clears_selection() {
    let (app, _, _dir) = common::create_test_app();
    let auth = login(&app, "erin").await;

    play(&app, &auth, "リノE", "財宝R", "win").await;
    let (_, outcome) = call(&app, &auth, "DELETE", "/api/decks/%E3%83%AA%E3%83%8EE", None).await;
    assert_eq!(outcome["changed"], true);

    let (_, state) = call(&app, &auth, "GET", "/api/state", None).await;
    assert_eq!(state["my_deck"], "");
    assert_eq!(state["recent_matches"][0]["my_deck"], "リノE");

    let (_, outcome) = call(&app, &auth, "DELETE", "/api/decks/NoSuchDeck", None).await;
    assert_eq!(outcome["changed"], false);
}

#[tokio::test]
async fn test_state_survives_new_session() {
    let (app, state, _dir) = common::create_test_app();
    let auth = login(&app, "frank").await;
    play(&app, &auth, "リノE", "財宝R", "win").await;

    let response = common::send(&app, "DELETE", "/api/session", Some(&auth), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(state.sessions.is_empty());

    let auth = login(&app, "FRANK").await;
    let (_, matches) = call(&app, &auth, "GET", "/api/matches", None).await;
    assert_eq!(matches.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_export() {
    let (app, _, _dir) = common::create_test_app();
    let auth = login(&app, "grace").await;
    play(&app, &auth, "リノE", "財宝R", "win").await;

    let response = common::send(&app, "GET", "/api/export", Some(&auth), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"match_tracker_grace.json\""
    );

    let body = common::json_body(response).await;
    assert_eq!(body["user_id"], "grace");
    assert_eq!(body["deck_types"].as_array().unwrap().len(), 28);
    assert_eq!(body["matches"].as_array().unwrap().len(), 1);
    assert!(body.get("my_deck").is_none());
}
