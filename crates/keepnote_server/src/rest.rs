//! REST router and shared request/response plumbing.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, Request},
    http::Uri,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use keepnote_core::{Page, PageRequest};
use log::info;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::auth_middleware;
use crate::error::{ApiError, NON_FIELD_ERRORS};
use crate::state::AppState;

pub mod checklist_items;
pub mod labels;
pub mod notes;
pub mod users;

pub fn create_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route(
            "/api/v1/users/me",
            get(users::current_user).delete(users::delete_current_user),
        )
        .route(
            "/api/v1/notes",
            get(notes::list_notes).post(notes::create_note),
        )
        .route("/api/v1/notes/reorder", post(notes::reorder_notes))
        .route("/api/v1/notes/empty_trash", post(notes::empty_trash))
        .route(
            "/api/v1/notes/:id",
            get(notes::get_note)
                .put(notes::update_note)
                .patch(notes::update_note)
                .delete(notes::delete_note),
        )
        .route("/api/v1/notes/:id/pin", post(notes::toggle_pin))
        .route("/api/v1/notes/:id/archive", post(notes::toggle_archive))
        .route("/api/v1/notes/:id/trash", post(notes::toggle_trash))
        .route(
            "/api/v1/labels",
            get(labels::list_labels).post(labels::create_label),
        )
        .route(
            "/api/v1/labels/:id",
            get(labels::get_label)
                .put(labels::update_label)
                .patch(labels::update_label)
                .delete(labels::delete_label),
        )
        .route(
            "/api/v1/checklist-items",
            get(checklist_items::list_items).post(checklist_items::create_item),
        )
        .route(
            "/api/v1/checklist-items/:id",
            get(checklist_items::get_item)
                .put(checklist_items::update_item)
                .patch(checklist_items::update_item)
                .delete(checklist_items::delete_item),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/users", post(users::register))
        .merge(protected)
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

/// GET /health
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": keepnote_core::core_version(),
    }))
}

async fn log_requests(request: Request, next: Next) -> Response {
    let started_at = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    info!(
        "event=http_request module=server method={} path={} status={} duration_ms={}",
        method,
        path,
        response.status().as_u16(),
        started_at.elapsed().as_millis()
    );
    response
}

/// Paginated list envelope: `{count, next, previous, results}`.
#[derive(Debug, Serialize)]
pub struct PageEnvelope<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> PageEnvelope<T> {
    /// Converts a core page; `next`/`previous` keep the other query params.
    pub fn from_page<S>(page: Page<S>, uri: &Uri, map: impl FnMut(S) -> T) -> Self {
        let next = page.has_next().then(|| page_link(uri, page.page + 1));
        let previous = page.has_previous().then(|| page_link(uri, page.page - 1));
        Self {
            count: page.count,
            next,
            previous,
            results: page.items.into_iter().map(map).collect(),
        }
    }
}

/// Relative link to `page`; page 1 drops the parameter.
fn page_link(uri: &Uri, page: u32) -> String {
    let mut params: Vec<String> = uri
        .query()
        .unwrap_or("")
        .split('&')
        .filter(|pair| !pair.is_empty() && !pair.starts_with("page="))
        .map(str::to_string)
        .collect();
    if page > 1 {
        params.push(format!("page={page}"));
    }
    if params.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), params.join("&"))
    }
}

/// Reads `page`/`page_size` query values.
///
/// A page that is not a positive integer is an invalid page (404); a bad
/// page size falls back to the default.
pub(crate) fn parse_page_request(
    page: Option<&str>,
    page_size: Option<&str>,
) -> Result<PageRequest, ApiError> {
    let page = match page.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => match value.parse::<u32>() {
            Ok(number) if number >= 1 => Some(number),
            _ => return Err(ApiError::InvalidPage),
        },
        None => None,
    };
    let page_size = page_size.and_then(|value| value.trim().parse::<u32>().ok());
    Ok(PageRequest::new(page, page_size))
}

/// Unwraps a JSON body, turning malformed payloads into a 400.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::validation(NON_FIELD_ERRORS, rejection.body_text()))
}

/// Parses a path id; anything that is not a UUID cannot name a record.
pub(crate) fn parse_path_id(value: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value).map_err(|_| ApiError::NotFound)
}
