//! Note endpoints: CRUD, lifecycle toggles, empty-trash and reorder.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use keepnote_core::{
    from_epoch_ms, parse_reminder, FlagRequest, FlagToggle, LabelId, Note, NoteColor, NoteDraft,
    NoteFlags, NoteListQuery, NoteOrdering, NotePatch, NoteService, ServiceResult,
    SqliteNoteRepository, ValidationError,
};
use rusqlite::Connection;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::checklist_items::{ChecklistItemPayload, ChecklistItemResponse};
use super::labels::LabelResponse;
use super::{json_body, parse_page_request, parse_path_id, PageEnvelope};
use crate::auth::Caller;
use crate::error::ApiError;
use crate::state::AppState;

/// Create/update payload. Absent fields are left untouched on update;
/// `reminder_date: null` clears the reminder.
#[derive(Debug, Default, Deserialize)]
pub struct NoteWriteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub color: Option<String>,
    pub is_pinned: Option<bool>,
    pub is_archived: Option<bool>,
    pub is_trashed: Option<bool>,
    pub is_checklist: Option<bool>,
    pub order: Option<u32>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub reminder_date: Option<Option<String>>,
    pub label_ids: Option<Vec<String>>,
    pub checklist_items: Option<Vec<ChecklistItemPayload>>,
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl NoteWriteRequest {
    pub fn into_patch(self) -> Result<NotePatch, ValidationError> {
        let color = self
            .color
            .map(|raw| NoteColor::parse_input(&raw))
            .transpose()?;
        let reminder_at = match self.reminder_date {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) if raw.trim().is_empty() => Some(None),
            Some(Some(raw)) => Some(Some(parse_reminder(&raw)?)),
        };
        let label_ids = self.label_ids.map(parse_label_ids).transpose()?;
        let checklist_items = self
            .checklist_items
            .map(|items| {
                items
                    .into_iter()
                    .map(|item| item.into_input("checklist_items"))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        Ok(NotePatch {
            title: self.title,
            content: self.content,
            color,
            flags: FlagRequest {
                is_pinned: self.is_pinned,
                is_archived: self.is_archived,
                is_trashed: self.is_trashed,
            },
            is_checklist: self.is_checklist,
            order: self.order,
            reminder_at,
            label_ids,
            checklist_items,
        })
    }

    pub fn into_draft(self) -> Result<NoteDraft, ValidationError> {
        let patch = self.into_patch()?;
        Ok(NoteDraft {
            title: patch.title.unwrap_or_default(),
            content: patch.content.unwrap_or_default(),
            color: patch.color.unwrap_or_default(),
            flags: patch.flags,
            is_checklist: patch.is_checklist.unwrap_or(false),
            order: patch.order.unwrap_or(0),
            reminder_at: patch.reminder_at.flatten(),
            label_ids: patch.label_ids.unwrap_or_default(),
            checklist_items: patch.checklist_items.unwrap_or_default(),
        })
    }
}

fn parse_label_ids(values: Vec<String>) -> Result<Vec<LabelId>, ValidationError> {
    values
        .into_iter()
        .map(|raw| {
            Uuid::parse_str(raw.trim()).map_err(|_| {
                ValidationError::new(
                    "label_ids",
                    format!("invalid label id `{raw}`: object does not exist"),
                )
            })
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub color: NoteColor,
    pub is_pinned: bool,
    pub is_archived: bool,
    pub is_trashed: bool,
    pub is_checklist: bool,
    pub order: u32,
    pub reminder_date: Option<DateTime<Utc>>,
    pub labels: Vec<LabelResponse>,
    pub checklist_items: Vec<ChecklistItemResponse>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            color: note.color,
            is_pinned: note.is_pinned,
            is_archived: note.is_archived,
            is_trashed: note.is_trashed,
            is_checklist: note.is_checklist,
            order: note.order,
            reminder_date: note.reminder_at.and_then(from_epoch_ms),
            labels: note.labels.into_iter().map(LabelResponse::from).collect(),
            checklist_items: note
                .checklist_items
                .into_iter()
                .map(ChecklistItemResponse::from)
                .collect(),
            created_at: from_epoch_ms(note.created_at),
            updated_at: from_epoch_ms(note.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub status: &'static str,
    pub is_pinned: bool,
    pub is_archived: bool,
    pub is_trashed: bool,
}

impl ToggleResponse {
    fn new(toggle: FlagToggle, flags: NoteFlags) -> Self {
        let status = match toggle {
            FlagToggle::Pin if flags.is_pinned => "pinned",
            FlagToggle::Pin => "unpinned",
            FlagToggle::Archive if flags.is_archived => "archived",
            FlagToggle::Archive => "unarchived",
            FlagToggle::Trash if flags.is_trashed => "trashed",
            FlagToggle::Trash => "restored",
        };
        Self {
            status,
            is_pinned: flags.is_pinned,
            is_archived: flags.is_archived,
            is_trashed: flags.is_trashed,
        }
    }
}

/// Ids that are not strings holding UUIDs are dropped like foreign ids.
#[derive(Debug, Default, Deserialize)]
pub struct ReorderRequest {
    #[serde(default)]
    pub pinned_ids: Vec<Value>,
    #[serde(default)]
    pub other_ids: Vec<Value>,
}

fn uuids(values: &[Value]) -> Vec<Uuid> {
    values
        .iter()
        .filter_map(|value| value.as_str())
        .filter_map(|raw| Uuid::parse_str(raw.trim()).ok())
        .collect()
}

#[derive(Debug, Default, Deserialize)]
pub struct ListNotesParams {
    pub is_pinned: Option<String>,
    pub is_archived: Option<String>,
    pub is_trashed: Option<String>,
    pub is_checklist: Option<String>,
    pub color: Option<String>,
    pub label: Option<String>,
    pub label_name: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl ListNotesParams {
    pub fn into_query(self) -> Result<NoteListQuery, ApiError> {
        let label_id = match non_empty(self.label) {
            Some(raw) => Some(Uuid::parse_str(&raw).map_err(|_| {
                ApiError::validation("label", format!("`{raw}` is not a valid UUID"))
            })?),
            None => None,
        };
        Ok(NoteListQuery {
            is_pinned: parse_bool_param("is_pinned", self.is_pinned)?,
            is_archived: parse_bool_param("is_archived", self.is_archived)?,
            is_trashed: parse_bool_param("is_trashed", self.is_trashed)?,
            is_checklist: parse_bool_param("is_checklist", self.is_checklist)?,
            color: non_empty(self.color)
                .map(|raw| NoteColor::parse_input(&raw))
                .transpose()?,
            label_id,
            label_name: non_empty(self.label_name),
            search: non_empty(self.search),
            ordering: non_empty(self.ordering)
                .and_then(|raw| NoteOrdering::parse(&raw))
                .unwrap_or_default(),
            page: parse_page_request(self.page.as_deref(), self.page_size.as_deref())?,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

fn parse_bool_param(name: &str, value: Option<String>) -> Result<Option<bool>, ApiError> {
    let Some(raw) = non_empty(value) else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(Some(true)),
        "false" | "0" => Ok(Some(false)),
        _ => Err(ApiError::validation(name, "enter a valid boolean")),
    }
}

fn note_service(conn: &mut Connection) -> ServiceResult<NoteService<SqliteNoteRepository<'_>>> {
    Ok(NoteService::new(SqliteNoteRepository::try_new(conn)?))
}

/// GET /api/v1/notes
pub async fn list_notes(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<ListNotesParams>,
) -> Result<Json<PageEnvelope<NoteResponse>>, ApiError> {
    let query = params.into_query()?;
    let page = state
        .with_db(move |conn| note_service(conn)?.list_notes(caller.user_id, &query))
        .await?;
    Ok(Json(PageEnvelope::from_page(page, &uri, NoteResponse::from)))
}

/// POST /api/v1/notes
pub async fn create_note(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<NoteWriteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<NoteResponse>), ApiError> {
    let draft = json_body(payload)?.into_draft()?;
    let note = state
        .with_db(move |conn| note_service(conn)?.create_note(caller.user_id, draft))
        .await?;
    Ok((StatusCode::CREATED, Json(note.into())))
}

/// GET /api/v1/notes/:id
pub async fn get_note(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<NoteResponse>, ApiError> {
    let note_id = parse_path_id(&id)?;
    let note = state
        .with_db(move |conn| note_service(conn)?.get_note(caller.user_id, note_id))
        .await?;
    Ok(Json(note.into()))
}

/// PUT|PATCH /api/v1/notes/:id
pub async fn update_note(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    payload: Result<Json<NoteWriteRequest>, JsonRejection>,
) -> Result<Json<NoteResponse>, ApiError> {
    let note_id = parse_path_id(&id)?;
    let patch = json_body(payload)?.into_patch()?;
    let note = state
        .with_db(move |conn| note_service(conn)?.update_note(caller.user_id, note_id, patch))
        .await?;
    Ok(Json(note.into()))
}

/// DELETE /api/v1/notes/:id
pub async fn delete_note(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let note_id = parse_path_id(&id)?;
    state
        .with_db(move |conn| note_service(conn)?.delete_note(caller.user_id, note_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/notes/:id/pin
pub async fn toggle_pin(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<ToggleResponse>, ApiError> {
    toggle(&state, caller, &id, FlagToggle::Pin).await
}

/// POST /api/v1/notes/:id/archive
pub async fn toggle_archive(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<ToggleResponse>, ApiError> {
    toggle(&state, caller, &id, FlagToggle::Archive).await
}

/// POST /api/v1/notes/:id/trash
pub async fn toggle_trash(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<ToggleResponse>, ApiError> {
    toggle(&state, caller, &id, FlagToggle::Trash).await
}

async fn toggle(
    state: &AppState,
    caller: Caller,
    id: &str,
    action: FlagToggle,
) -> Result<Json<ToggleResponse>, ApiError> {
    let note_id = parse_path_id(id)?;
    let flags = state
        .with_db(move |conn| note_service(conn)?.toggle(caller.user_id, note_id, action))
        .await?;
    Ok(Json(ToggleResponse::new(action, flags)))
}

/// POST /api/v1/notes/empty_trash
pub async fn empty_trash(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Value>, ApiError> {
    let deleted = state
        .with_db(move |conn| note_service(conn)?.empty_trash(caller.user_id))
        .await?;
    Ok(Json(json!({
        "status": "trash emptied",
        "deleted_count": deleted,
    })))
}

/// POST /api/v1/notes/reorder
pub async fn reorder_notes(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<ReorderRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = json_body(payload)?;
    let pinned_ids = uuids(&request.pinned_ids);
    let other_ids = uuids(&request.other_ids);
    state
        .with_db(move |conn| {
            note_service(conn)?.reorder(caller.user_id, &pinned_ids, &other_ids)
        })
        .await?;
    Ok(Json(json!({ "status": "reordered" })))
}

#[cfg(test)]
mod tests {
    use super::{ListNotesParams, NoteWriteRequest};
    use crate::error::ApiError;
    use serde_json::json;

    fn request(value: serde_json::Value) -> NoteWriteRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn null_reminder_clears_while_absent_reminder_is_untouched() {
        let absent = request(json!({ "title": "x" })).into_patch().unwrap();
        assert_eq!(absent.reminder_at, None);

        let cleared = request(json!({ "reminder_date": null }))
            .into_patch()
            .unwrap();
        assert_eq!(cleared.reminder_at, Some(None));
    }

    #[test]
    fn absent_and_empty_checklist_items_differ() {
        let absent = request(json!({})).into_patch().unwrap();
        assert!(absent.checklist_items.is_none());

        let empty = request(json!({ "checklist_items": [] }))
            .into_patch()
            .unwrap();
        assert_eq!(empty.checklist_items, Some(Vec::new()));
    }

    #[test]
    fn unknown_color_is_reported_on_color() {
        let err = request(json!({ "color": "magenta" }))
            .into_draft()
            .unwrap_err();
        assert_eq!(err.field, "color");
    }

    #[test]
    fn malformed_label_id_is_reported_on_label_ids() {
        let err = request(json!({ "label_ids": ["nope"] }))
            .into_patch()
            .unwrap_err();
        assert_eq!(err.field, "label_ids");
    }

    #[test]
    fn list_params_parse_booleans_strictly() {
        let params = ListNotesParams {
            is_pinned: Some("1".to_string()),
            is_trashed: Some("False".to_string()),
            ..ListNotesParams::default()
        };
        let query = params.into_query().unwrap();
        assert_eq!(query.is_pinned, Some(true));
        assert_eq!(query.is_trashed, Some(false));

        let params = ListNotesParams {
            is_archived: Some("maybe".to_string()),
            ..ListNotesParams::default()
        };
        assert!(matches!(
            params.into_query(),
            Err(ApiError::Validation(err)) if err.field == "is_archived"
        ));
    }
}
