//! Label endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use keepnote_core::{Label, LabelService, ServiceResult, SqliteLabelRepository};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{json_body, parse_page_request, parse_path_id, PageEnvelope};
use crate::auth::Caller;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CreateLabelRequest {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateLabelRequest {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListLabelsParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelResponse {
    pub id: Uuid,
    pub name: String,
}

impl From<Label> for LabelResponse {
    fn from(label: Label) -> Self {
        Self {
            id: label.id,
            name: label.name,
        }
    }
}

fn label_service(conn: &Connection) -> ServiceResult<LabelService<SqliteLabelRepository<'_>>> {
    Ok(LabelService::new(SqliteLabelRepository::try_new(conn)?))
}

/// GET /api/v1/labels
pub async fn list_labels(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<ListLabelsParams>,
) -> Result<Json<PageEnvelope<LabelResponse>>, ApiError> {
    let page_request = parse_page_request(params.page.as_deref(), params.page_size.as_deref())?;
    let page = state
        .with_db(move |conn| label_service(conn)?.list_labels(caller.user_id, page_request))
        .await?;
    Ok(Json(PageEnvelope::from_page(page, &uri, LabelResponse::from)))
}

/// POST /api/v1/labels
pub async fn create_label(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<CreateLabelRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LabelResponse>), ApiError> {
    let name = json_body(payload)?
        .name
        .ok_or_else(|| ApiError::validation("name", "this field is required"))?;
    let label = state
        .with_db(move |conn| label_service(conn)?.create_label(caller.user_id, &name))
        .await?;
    Ok((StatusCode::CREATED, Json(label.into())))
}

/// GET /api/v1/labels/:id
pub async fn get_label(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<LabelResponse>, ApiError> {
    let label_id = parse_path_id(&id)?;
    let label = state
        .with_db(move |conn| label_service(conn)?.get_label(caller.user_id, label_id))
        .await?;
    Ok(Json(label.into()))
}

/// PUT|PATCH /api/v1/labels/:id
pub async fn update_label(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateLabelRequest>, JsonRejection>,
) -> Result<Json<LabelResponse>, ApiError> {
    let label_id = parse_path_id(&id)?;
    let request = json_body(payload)?;
    let label = state
        .with_db(move |conn| {
            let service = label_service(conn)?;
            match request.name {
                Some(name) => service.rename_label(caller.user_id, label_id, &name),
                None => service.get_label(caller.user_id, label_id),
            }
        })
        .await?;
    Ok(Json(label.into()))
}

/// DELETE /api/v1/labels/:id
pub async fn delete_label(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let label_id = parse_path_id(&id)?;
    state
        .with_db(move |conn| label_service(conn)?.delete_label(caller.user_id, label_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
