//! Checklist item endpoints, scoped to items of the caller's notes.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use keepnote_core::{
    ChecklistItem, ChecklistItemInput, ChecklistService, NoteId, ServiceResult,
    SqliteChecklistRepository, ValidationError,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{json_body, parse_page_request, parse_path_id, PageEnvelope};
use crate::auth::Caller;
use crate::error::ApiError;
use crate::state::AppState;

/// Item descriptor accepted both nested in note payloads and by the item
/// endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ChecklistItemPayload {
    pub id: Option<String>,
    pub note: Option<String>,
    pub text: Option<String>,
    pub is_checked: Option<bool>,
    pub order: Option<u32>,
}

impl ChecklistItemPayload {
    /// An `id` that is not a UUID is treated like an unknown id (new row);
    /// a malformed `note` is reported on `note_field`.
    pub fn into_input(self, note_field: &str) -> Result<ChecklistItemInput, ValidationError> {
        let note = self
            .note
            .map(|raw| {
                Uuid::parse_str(raw.trim()).map_err(|_| {
                    ValidationError::new(
                        note_field,
                        format!("invalid note id `{raw}`: object does not exist"),
                    )
                })
            })
            .transpose()?;
        Ok(ChecklistItemInput {
            id: self.id.and_then(|raw| Uuid::parse_str(raw.trim()).ok()),
            note,
            text: self.text,
            is_checked: self.is_checked,
            order: self.order,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ChecklistItemResponse {
    pub id: Uuid,
    pub note: NoteId,
    pub text: String,
    pub is_checked: bool,
    pub order: u32,
}

impl From<ChecklistItem> for ChecklistItemResponse {
    fn from(item: ChecklistItem) -> Self {
        Self {
            id: item.id,
            note: item.note_id,
            text: item.text,
            is_checked: item.is_checked,
            order: item.order,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListItemsParams {
    pub note: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

fn checklist_service(
    conn: &mut Connection,
) -> ServiceResult<ChecklistService<SqliteChecklistRepository<'_>>> {
    Ok(ChecklistService::new(SqliteChecklistRepository::try_new(
        conn,
    )?))
}

/// GET /api/v1/checklist-items
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<ListItemsParams>,
) -> Result<Json<PageEnvelope<ChecklistItemResponse>>, ApiError> {
    let page_request = parse_page_request(params.page.as_deref(), params.page_size.as_deref())?;
    let note_id = match params.note.as_deref().map(str::trim) {
        Some("") | None => None,
        Some(raw) => Some(
            Uuid::parse_str(raw)
                .map_err(|_| ApiError::validation("note", format!("`{raw}` is not a valid UUID")))?,
        ),
    };

    let page = state
        .with_db(move |conn| {
            checklist_service(conn)?.list_items(caller.user_id, note_id, page_request)
        })
        .await?;
    Ok(Json(PageEnvelope::from_page(
        page,
        &uri,
        ChecklistItemResponse::from,
    )))
}

/// POST /api/v1/checklist-items
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<ChecklistItemPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<ChecklistItemResponse>), ApiError> {
    let input = json_body(payload)?.into_input("note")?;
    let item = state
        .with_db(move |conn| checklist_service(conn)?.create_item(caller.user_id, &input))
        .await?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

/// GET /api/v1/checklist-items/:id
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<ChecklistItemResponse>, ApiError> {
    let item_id = parse_path_id(&id)?;
    let item = state
        .with_db(move |conn| checklist_service(conn)?.get_item(caller.user_id, item_id))
        .await?;
    Ok(Json(item.into()))
}

/// PUT|PATCH /api/v1/checklist-items/:id
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    payload: Result<Json<ChecklistItemPayload>, JsonRejection>,
) -> Result<Json<ChecklistItemResponse>, ApiError> {
    let item_id = parse_path_id(&id)?;
    let input = json_body(payload)?.into_input("note")?;
    let item = state
        .with_db(move |conn| {
            checklist_service(conn)?.update_item(caller.user_id, item_id, &input)
        })
        .await?;
    Ok(Json(item.into()))
}

/// DELETE /api/v1/checklist-items/:id
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let item_id = parse_path_id(&id)?;
    state
        .with_db(move |conn| checklist_service(conn)?.delete_item(caller.user_id, item_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
