// --------------------------------------------------
// Handles API endpoints that act on the whole planner state.
//
// Responsibilities:
// - Get / update the planning config
// - Template CRUD and applying a template to a day
// - XP / streak recording
// - Export, reset and diagnostics
// --------------------------------------------------

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::AppStore;
use crate::models::{Config, Zone};
use crate::progress::{LevelInfo, Progress};
use crate::routes_plan::{parse_day, parse_id};
use crate::store::TemplateDraft;

// -----------------------------
// GET /api/config
// -----------------------------
pub async fn get_config(State(store): State<AppStore>) -> impl IntoResponse {
    Json(store.snapshot().config.clone())
}

// -----------------------------
// PUT /api/config
// Replaces the config; thresholds and budgets must not be negative
// -----------------------------
pub async fn put_config(State(store): State<AppStore>, Json(config): Json<Config>) -> impl IntoResponse {
    let budgets = [config.rhythms.light, config.rhythms.normal, config.rhythms.intense];
    if config.tight_threshold_min < 0
        || config.overload_threshold_min < 0
        || budgets.iter().any(|b| b.budget_min < 0)
    {
        return (StatusCode::BAD_REQUEST, "thresholds and budgets must be >= 0").into_response();
    }

    store.set_config(config.clone());
    Json(config).into_response()
}

// -----------------------------
// GET /api/templates
// -----------------------------
pub async fn get_templates(State(store): State<AppStore>) -> impl IntoResponse {
    Json(store.snapshot().templates.clone())
}

// -----------------------------
// POST /api/templates
// -----------------------------
pub async fn create_template(
    State(store): State<AppStore>,
    Json(input): Json<TemplateDraft>,
) -> impl IntoResponse {
    if input.title.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "title required").into_response();
    }
    (StatusCode::CREATED, Json(store.create_template(input))).into_response()
}

// -----------------------------
// PUT /api/templates/:id
// -----------------------------
pub async fn update_template(
    State(store): State<AppStore>,
    Path(id): Path<String>,
    Json(input): Json<TemplateDraft>,
) -> impl IntoResponse {
    let id = match parse_id(&id) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if input.title.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "title required").into_response();
    }
    match store.update_template(id, input) {
        Some(t) => Json(t).into_response(),
        None => (StatusCode::NOT_FOUND, "template not found").into_response(),
    }
}

// -----------------------------
// DELETE /api/templates/:id
// -----------------------------
pub async fn delete_template(State(store): State<AppStore>, Path(id): Path<String>) -> impl IntoResponse {
    let id = match parse_id(&id) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if !store.delete_template(id) {
        return (StatusCode::NOT_FOUND, "template not found").into_response();
    }
    Json(serde_json::json!({ "ok": true })).into_response()
}

#[derive(Debug, Deserialize, Default)]
pub struct ApplyTemplateInput {
    pub zone: Option<Zone>,
}

// -----------------------------
// POST /api/days/:day/templates/:id
// Adds a spot from the template to the day's active variant
// -----------------------------
pub async fn apply_template(
    State(store): State<AppStore>,
    Path((day, id)): Path<(String, String)>,
    input: Option<Json<ApplyTemplateInput>>,
) -> impl IntoResponse {
    let (date, id) = match (parse_day(&day), parse_id(&id)) {
        (Ok(d), Ok(id)) => (d, id),
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };
    let zone = input.and_then(|Json(i)| i.zone);

    let plan = store.ensure_day_plan(date);
    match store.apply_template(&plan.day_key, id, zone) {
        Some(spot_id) => (StatusCode::CREATED, Json(serde_json::json!({ "id": spot_id }))).into_response(),
        None => (StatusCode::NOT_FOUND, "template not found").into_response(),
    }
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub progress: Progress,
    pub level: LevelInfo,
}

impl From<Progress> for ProgressResponse {
    fn from(progress: Progress) -> Self {
        let level = progress.level();
        Self { progress, level }
    }
}

// -----------------------------
// GET /api/progress
// -----------------------------
pub async fn get_progress(State(store): State<AppStore>) -> impl IntoResponse {
    Json(ProgressResponse::from(store.snapshot().progress.clone()))
}

#[derive(Debug, Deserialize)]
pub struct XpInput {
    pub amount: u64,
    pub date: Option<String>, // "YYYY-MM-DD", defaults to today (UTC)
}

// -----------------------------
// POST /api/progress/xp
// Adds XP and advances the daily streak
// -----------------------------
pub async fn record_xp(State(store): State<AppStore>, Json(input): Json<XpInput>) -> impl IntoResponse {
    let date: NaiveDate = match input.date.as_deref() {
        Some(d) => match parse_day(d) {
            Ok(d) => d,
            Err(resp) => return resp,
        },
        None => Utc::now().date_naive(),
    };
    Json(ProgressResponse::from(store.record_xp(input.amount, date))).into_response()
}

// -----------------------------
// GET /api/export
// Full state in the on-disk document format
// -----------------------------
pub async fn export(State(store): State<AppStore>) -> impl IntoResponse {
    match store.export() {
        Ok(text) => ([(header::CONTENT_TYPE, "application/json")], text).into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "failed to export state").into_response(),
    }
}

// -----------------------------
// POST /api/reset
// Drops everything and starts from defaults
// -----------------------------
pub async fn reset(State(store): State<AppStore>) -> impl IntoResponse {
    store.reset();
    Json(serde_json::json!({ "ok": true }))
}

#[derive(Debug, Serialize)]
pub struct DiagnosticsResponse {
    pub data_path: String,
    pub file_size_bytes: u64,
    pub day_plans: usize,
    pub templates: usize,
    pub can_undo: bool,
}

// -----------------------------
// GET /api/diagnostics
// -----------------------------
pub async fn diagnostics(State(store): State<AppStore>) -> impl IntoResponse {
    let state = store.snapshot();
    Json(DiagnosticsResponse {
        data_path: store.path().display().to_string(),
        file_size_bytes: store.file_size(),
        day_plans: state.day_plans.len(),
        templates: state.templates.len(),
        can_undo: state.undo.is_some(),
    })
}
