//! Full-stack REST tests.
//!
//! Every test builds the router over a fresh in-memory database and drives
//! it with `tower::ServiceExt::oneshot`, covering routing, auth, JSON
//! shapes and storage together.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt; // for `.oneshot()`

use keepnote_core::db::open_db_in_memory;
use keepnote_server::{create_router, AppState};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn setup() -> Router {
    let conn = open_db_in_memory().expect("open in-memory db");
    create_router(Arc::new(AppState::new(conn)))
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(val) => builder.body(Body::from(val.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(json_request(method, uri, token, body))
        .await
        .unwrap();
    let status = resp.status();
    (status, body_json(resp).await)
}

/// Registers `username` and returns its bearer token.
async fn register(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/users",
        None,
        Some(json!({ "username": username })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["token"].as_str().unwrap().to_string()
}

async fn create_note(app: &Router, token: &str, body: Value) -> Value {
    let (status, note) = send(app, Method::POST, "/api/v1/notes", Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{note}");
    note
}

// ---------------------------------------------------------------------------
// Health & auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_is_public() {
    let app = setup();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn protected_routes_require_a_known_token() {
    let app = setup();
    let (status, body) = send(&app, Method::GET, "/api/v1/notes", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid or missing token");

    let (status, _) = send(&app, Method::GET, "/api/v1/notes", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registration_returns_token_once_and_me_hides_it() {
    let app = setup();
    let token = register(&app, "alice").await;
    assert_eq!(token.len(), 64);

    let (status, me) = send(&app, Method::GET, "/api/v1/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "alice");
    assert!(me.get("token").is_none());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/users",
        None,
        Some(json!({ "username": "alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["username"].is_array());
}

#[tokio::test]
async fn deleting_account_revokes_token() {
    let app = setup();
    let token = register(&app, "alice").await;
    create_note(&app, &token, json!({ "title": "gone soon" })).await;

    let (status, _) = send(&app, Method::DELETE, "/api/v1/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, "/api/v1/notes", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Notes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_note_with_nested_checklist() {
    let app = setup();
    let token = register(&app, "alice").await;

    let note = create_note(
        &app,
        &token,
        json!({
            "title": "Groceries",
            "color": "yellow",
            "is_checklist": true,
            "checklist_items": [
                { "text": "Milk" },
                { "text": "Eggs", "is_checked": true }
            ]
        }),
    )
    .await;

    assert_eq!(note["title"], "Groceries");
    assert_eq!(note["color"], "yellow");
    assert_eq!(note["is_pinned"], false);
    assert_eq!(note["reminder_date"], Value::Null);
    let items = note["checklist_items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["text"], "Milk");
    assert_eq!(items[0]["order"], 0);
    assert_eq!(items[1]["text"], "Eggs");
    assert_eq!(items[1]["is_checked"], true);
    assert_eq!(items[1]["note"], note["id"]);
}

#[tokio::test]
async fn malformed_payloads_are_field_errors() {
    let app = setup();
    let token = register(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/notes",
        Some(&token),
        Some(json!({ "title": "x", "color": "magenta" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["color"].is_array());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/notes",
        Some(&token),
        Some(json!({ "title": "x", "reminder_date": "tomorrow" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["reminder_date"].is_array());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/notes",
        Some(&token),
        Some(json!({ "title": 42 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["non_field_errors"].is_array());
}

#[tokio::test]
async fn reminder_with_and_without_seconds_is_the_same_instant() {
    let app = setup();
    let token = register(&app, "alice").await;

    let short = create_note(
        &app,
        &token,
        json!({ "title": "a", "reminder_date": "2023-10-27T14:30" }),
    )
    .await;
    let long = create_note(
        &app,
        &token,
        json!({ "title": "b", "reminder_date": "2023-10-27T14:30:00" }),
    )
    .await;
    let zulu = create_note(
        &app,
        &token,
        json!({ "title": "c", "reminder_date": "2023-10-27T14:30Z" }),
    )
    .await;
    let shifted = create_note(
        &app,
        &token,
        json!({ "title": "d", "reminder_date": "2023-10-27T16:30+02:00" }),
    )
    .await;
    assert!(short["reminder_date"].is_string());
    assert_eq!(short["reminder_date"], long["reminder_date"]);
    assert_eq!(short["reminder_date"], zulu["reminder_date"]);
    assert_eq!(short["reminder_date"], shifted["reminder_date"]);

    let uri = format!("/api/v1/notes/{}", short["id"].as_str().unwrap());
    let (status, cleared) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&token),
        Some(json!({ "reminder_date": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["reminder_date"], Value::Null);
    assert_eq!(cleared["title"], "a");
}

#[tokio::test]
async fn toggles_report_status_and_side_effects() {
    let app = setup();
    let token = register(&app, "alice").await;
    let note = create_note(&app, &token, json!({ "title": "t" })).await;
    let base = format!("/api/v1/notes/{}", note["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::POST, &format!("{base}/pin"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pinned");
    assert_eq!(body["is_pinned"], true);

    let (_, body) = send(&app, Method::POST, &format!("{base}/archive"), Some(&token), None).await;
    assert_eq!(body["status"], "archived");
    assert_eq!(body["is_archived"], true);

    let (_, body) = send(&app, Method::POST, &format!("{base}/trash"), Some(&token), None).await;
    assert_eq!(body["status"], "trashed");
    assert_eq!(body["is_trashed"], true);
    assert_eq!(body["is_pinned"], false);
    assert_eq!(body["is_archived"], false);

    let (_, body) = send(&app, Method::POST, &format!("{base}/trash"), Some(&token), None).await;
    assert_eq!(body["status"], "restored");
    assert_eq!(body["is_trashed"], false);
}

#[tokio::test]
async fn other_users_notes_are_not_found() {
    let app = setup();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;
    let note = create_note(&app, &alice, json!({ "title": "private" })).await;
    let uri = format!("/api/v1/notes/{}", note["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not found");

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::POST, &format!("{uri}/pin"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/api/v1/notes/not-a-uuid", Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn reorder_ignores_foreign_notes() {
    let app = setup();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;
    let first = create_note(&app, &alice, json!({ "title": "first" })).await;
    let second = create_note(&app, &alice, json!({ "title": "second" })).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/notes/reorder",
        Some(&bob),
        Some(json!({ "pinned_ids": [first["id"]], "other_ids": [second["id"]] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "reordered");

    let uri = format!("/api/v1/notes/{}", first["id"].as_str().unwrap());
    let (_, untouched) = send(&app, Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(untouched["is_pinned"], false);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/notes/reorder",
        Some(&alice),
        Some(json!({ "pinned_ids": [second["id"], 17], "other_ids": [first["id"]] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = send(&app, Method::GET, "/api/v1/notes", Some(&alice), None).await;
    let results = list["results"].as_array().unwrap();
    assert_eq!(results[0]["id"], second["id"]);
    assert_eq!(results[0]["is_pinned"], true);
    assert_eq!(results[0]["order"], 0);
    assert_eq!(results[1]["id"], first["id"]);
    assert_eq!(results[1]["order"], 0);
}

#[tokio::test]
async fn empty_trash_deletes_only_trashed_notes() {
    let app = setup();
    let token = register(&app, "alice").await;
    let keep = create_note(&app, &token, json!({ "title": "keep" })).await;
    create_note(&app, &token, json!({ "title": "drop", "is_trashed": true })).await;

    let (status, body) = send(&app, Method::POST, "/api/v1/notes/empty_trash", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "trash emptied");
    assert_eq!(body["deleted_count"], 1);

    let (_, trash) = send(&app, Method::GET, "/api/v1/notes?is_trashed=true", Some(&token), None).await;
    assert_eq!(trash["count"], 0);
    let (_, active) = send(&app, Method::GET, "/api/v1/notes", Some(&token), None).await;
    assert_eq!(active["count"], 1);
    assert_eq!(active["results"][0]["id"], keep["id"]);
}

#[tokio::test]
async fn note_list_is_paginated_by_twelve() {
    let app = setup();
    let token = register(&app, "alice").await;
    for index in 0..13 {
        create_note(&app, &token, json!({ "title": format!("note {index}") })).await;
    }

    let (status, first) = send(&app, Method::GET, "/api/v1/notes", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["count"], 13);
    assert_eq!(first["results"].as_array().unwrap().len(), 12);
    assert_eq!(first["next"], "/api/v1/notes?page=2");
    assert_eq!(first["previous"], Value::Null);

    let (_, second) = send(&app, Method::GET, "/api/v1/notes?page=2", Some(&token), None).await;
    assert_eq!(second["results"].as_array().unwrap().len(), 1);
    assert_eq!(second["next"], Value::Null);
    assert_eq!(second["previous"], "/api/v1/notes");

    let (status, body) = send(&app, Method::GET, "/api/v1/notes?page=3", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "invalid page");

    let (status, _) = send(&app, Method::GET, "/api/v1/notes?page=abc", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_filters_and_search() {
    let app = setup();
    let token = register(&app, "alice").await;
    create_note(&app, &token, json!({ "title": "Milk run", "color": "blue" })).await;
    create_note(&app, &token, json!({ "title": "Taxes", "is_pinned": true })).await;

    let (_, found) = send(&app, Method::GET, "/api/v1/notes?search=milk", Some(&token), None).await;
    assert_eq!(found["count"], 1);
    assert_eq!(found["results"][0]["title"], "Milk run");

    let (_, pinned) = send(&app, Method::GET, "/api/v1/notes?is_pinned=true", Some(&token), None).await;
    assert_eq!(pinned["count"], 1);
    assert_eq!(pinned["results"][0]["title"], "Taxes");

    let (_, blue) = send(&app, Method::GET, "/api/v1/notes?color=blue", Some(&token), None).await;
    assert_eq!(blue["count"], 1);

    let (status, body) = send(&app, Method::GET, "/api/v1/notes?is_pinned=maybe", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["is_pinned"].is_array());
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

#[tokio::test]
async fn labels_are_unique_per_owner_and_attach_to_notes() {
    let app = setup();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let (status, label) = send(
        &app,
        Method::POST,
        "/api/v1/labels",
        Some(&alice),
        Some(json!({ "name": "work" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/labels",
        Some(&alice),
        Some(json!({ "name": "work" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["name"].is_array());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/labels",
        Some(&bob),
        Some(json!({ "name": "work" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let note = create_note(
        &app,
        &alice,
        json!({ "title": "report", "label_ids": [label["id"]] }),
    )
    .await;
    assert_eq!(note["labels"][0]["name"], "work");

    let (_, by_name) = send(&app, Method::GET, "/api/v1/notes?label_name=work", Some(&alice), None).await;
    assert_eq!(by_name["count"], 1);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/notes",
        Some(&bob),
        Some(json!({ "title": "steal", "label_ids": [label["id"]] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["label_ids"].is_array());
}

// ---------------------------------------------------------------------------
// Checklist items
// ---------------------------------------------------------------------------

#[tokio::test]
async fn checklist_item_endpoints_are_scoped_to_owner() {
    let app = setup();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;
    let note = create_note(&app, &alice, json!({ "title": "list", "is_checklist": true })).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/checklist-items",
        Some(&bob),
        Some(json!({ "note": note["id"], "text": "sneaky" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["note"].is_array());

    let (status, item) = send(
        &app,
        Method::POST,
        "/api/v1/checklist-items",
        Some(&alice),
        Some(json!({ "note": note["id"], "text": "Bread" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["note"], note["id"]);
    assert_eq!(item["is_checked"], false);

    let item_uri = format!("/api/v1/checklist-items/{}", item["id"].as_str().unwrap());
    let (status, _) = send(&app, Method::GET, &item_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, updated) = send(
        &app,
        Method::PATCH,
        &item_uri,
        Some(&alice),
        Some(json!({ "is_checked": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["is_checked"], true);
    assert_eq!(updated["text"], "Bread");

    let list_uri = format!("/api/v1/checklist-items?note={}", note["id"].as_str().unwrap());
    let (_, listed) = send(&app, Method::GET, &list_uri, Some(&alice), None).await;
    assert_eq!(listed["count"], 1);
    let (_, foreign) = send(&app, Method::GET, "/api/v1/checklist-items", Some(&bob), None).await;
    assert_eq!(foreign["count"], 0);

    let (status, _) = send(&app, Method::DELETE, &item_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
