//! `presets` collection routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::AppState;
use crate::preset::validate_lights;
use crate::remote::{DEFAULT_PUBLIC_LIMIT, PresetDocument, PresetDraft};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

/// Effective listing size: the requested limit, never above the default cap.
pub(crate) fn clamp_limit(requested: Option<usize>) -> usize {
    requested.map_or(DEFAULT_PUBLIC_LIMIT, |limit| limit.min(DEFAULT_PUBLIC_LIMIT))
}

/// Whether a draft may be stored: named, non-empty, and within the grid.
pub(crate) fn is_publishable(draft: &PresetDraft) -> bool {
    !draft.name.trim().is_empty() && validate_lights(&draft.lights).is_ok()
}

/// `GET /api/presets?limit=N` — public presets, newest first.
pub async fn list_presets(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<Vec<PresetDocument>> {
    let limit = clamp_limit(params.limit);
    let docs = state.documents.query_public(limit).await;
    debug!(limit, count = docs.len(), "listed public presets");
    Json(docs)
}

/// `GET /api/presets/{id}` — fetch one preset.
pub async fn get_preset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PresetDocument>, StatusCode> {
    state
        .documents
        .get(&id)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// `POST /api/presets` — publish a preset. The service assigns the id and
/// creation time and marks the document public.
pub async fn create_preset(
    State(state): State<AppState>,
    Json(draft): Json<PresetDraft>,
) -> Result<(StatusCode, Json<CreatedResponse>), StatusCode> {
    if !is_publishable(&draft) {
        return Err(StatusCode::BAD_REQUEST);
    }
    let doc = state.documents.add(draft).await;
    info!(remote_id = %doc.id, lights = doc.lights.len(), "preset published");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: doc.id })))
}

#[cfg(test)]
#[path = "presets_test.rs"]
mod tests;
