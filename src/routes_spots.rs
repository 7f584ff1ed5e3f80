// --------------------------------------------------
// Handles API endpoints for spots of the active variant.
//
// Responsibilities:
// - Create / update / delete spots
// - Move a spot to another zone or position
// - Undo the most recent spot change
// --------------------------------------------------

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::AppStore;
use crate::models::Zone;
use crate::routes_plan::{parse_day, parse_id};
use crate::store::{SpotDraft, SpotPatch};

// -----------------------------
// POST /api/days/:day/spots
// Appends a spot at the end of its zone
// -----------------------------
pub async fn create_spot(
    State(store): State<AppStore>,
    Path(day): Path<String>,
    Json(input): Json<SpotDraft>,
) -> impl IntoResponse {
    if input.title.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "title required").into_response();
    }
    if input.duration_min <= 0 {
        return (StatusCode::BAD_REQUEST, "duration_min must be positive").into_response();
    }
    let date = match parse_day(&day) {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    let plan = store.ensure_day_plan(date);
    let Some(id) = store.add_spot(&plan.day_key, input) else {
        return (StatusCode::NOT_FOUND, "variant not found").into_response();
    };

    let spot = store
        .day_plan(&plan.day_key)
        .and_then(|p| p.active_variant().and_then(|v| v.spot(id)).cloned());
    match spot {
        Some(spot) => (StatusCode::CREATED, Json(spot)).into_response(),
        None => (StatusCode::NOT_FOUND, "spot not found").into_response(),
    }
}

// -----------------------------
// PUT /api/days/:day/spots/:id
// Partial update; duration never drops below 5 minutes
// -----------------------------
pub async fn update_spot(
    State(store): State<AppStore>,
    Path((day, id)): Path<(String, String)>,
    Json(patch): Json<SpotPatch>,
) -> impl IntoResponse {
    let id = match parse_id(&id) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return (StatusCode::BAD_REQUEST, "title required").into_response();
    }

    match store.update_spot(&day, id, patch) {
        Some(spot) => Json(spot).into_response(),
        None => (StatusCode::NOT_FOUND, "spot not found").into_response(),
    }
}

// -----------------------------
// DELETE /api/days/:day/spots/:id
// -----------------------------
pub async fn delete_spot(
    State(store): State<AppStore>,
    Path((day, id)): Path<(String, String)>,
) -> impl IntoResponse {
    let id = match parse_id(&id) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if !store.delete_spot(&day, id) {
        return (StatusCode::NOT_FOUND, "spot not found").into_response();
    }
    Json(serde_json::json!({ "ok": true })).into_response()
}

#[derive(Debug, Deserialize)]
pub struct MoveInput {
    pub zone: Zone,
    pub index: usize,
}

// -----------------------------
// POST /api/days/:day/spots/:id/move
// Places the spot at `index` inside `zone`
// -----------------------------
pub async fn move_spot(
    State(store): State<AppStore>,
    Path((day, id)): Path<(String, String)>,
    Json(input): Json<MoveInput>,
) -> impl IntoResponse {
    let id = match parse_id(&id) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if !store.move_spot(&day, id, input.zone, input.index) {
        return (StatusCode::NOT_FOUND, "spot not found").into_response();
    }
    match store.day_plan(&day) {
        Some(plan) => Json(plan).into_response(),
        None => (StatusCode::NOT_FOUND, "day plan not found").into_response(),
    }
}

// -----------------------------
// POST /api/undo
// Reverts the most recent undoable change
// -----------------------------
pub async fn undo(State(store): State<AppStore>) -> impl IntoResponse {
    if !store.undo() {
        return (StatusCode::CONFLICT, "nothing to undo").into_response();
    }
    Json(serde_json::json!({ "ok": true })).into_response()
}
