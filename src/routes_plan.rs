// --------------------------------------------------
// Handles API endpoints for day plans and their variants.
//
// Responsibilities:
// - Get (lazily create) a day plan, copy it to another day
// - Budget insight and fix suggestions for the active variant
// - Variant create / update / select / delete / copy / compare
// --------------------------------------------------

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppStore;
use crate::error::PlannerError;
use crate::logic::{self, BudgetSummary, DensityCheck, FixSuggestion, Insight, OverheadBreakdown};
use crate::models::{Rhythm, Spot, Zone, parse_day_key};
use crate::store::VariantPatch;

const TOP_SPOTS: usize = 3;

pub(crate) fn parse_day(day: &str) -> Result<NaiveDate, Response> {
    parse_day_key(day).ok_or_else(|| (StatusCode::BAD_REQUEST, "invalid date").into_response())
}

pub(crate) fn parse_id(id: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(id).map_err(|_| (StatusCode::BAD_REQUEST, "invalid id").into_response())
}

fn not_found(what: &'static str) -> Response {
    (StatusCode::NOT_FOUND, what).into_response()
}

#[derive(Debug, Deserialize)]
pub struct CopyInput {
    pub to: String, // "YYYY-MM-DD"
}

#[derive(Debug, Serialize)]
pub struct ZoneSummaryResponse {
    pub zone: Zone,
    pub summary: BudgetSummary,
}

#[derive(Debug, Serialize)]
pub struct InsightResponse {
    pub day_key: String,
    pub variant_id: Uuid,
    pub insight: Insight,
    pub day: BudgetSummary,
    pub zones: Vec<ZoneSummaryResponse>,
    pub density: DensityCheck,
    pub overhead: OverheadBreakdown,
    pub top_spots: Vec<Spot>,
}

// -----------------------------
// GET /api/days/:day
// Returns the plan for a day, creating a blank one on first access
// -----------------------------
pub async fn get_day(State(store): State<AppStore>, Path(day): Path<String>) -> impl IntoResponse {
    let date = match parse_day(&day) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    Json(store.ensure_day_plan(date)).into_response()
}

// -----------------------------
// POST /api/days/:day/copy
// Copies the whole plan onto another day (fresh ids, replaces target)
// -----------------------------
pub async fn copy_day(
    State(store): State<AppStore>,
    Path(day): Path<String>,
    Json(input): Json<CopyInput>,
) -> impl IntoResponse {
    let to = match parse_day(&input.to) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    match store.copy_day_plan(&day, to) {
        Some(plan) => Json(plan).into_response(),
        None => not_found("day plan not found"),
    }
}

// -----------------------------
// GET /api/days/:day/insight
// Budget analysis of the active variant
// -----------------------------
pub async fn get_insight(State(store): State<AppStore>, Path(day): Path<String>) -> impl IntoResponse {
    let date = match parse_day(&day) {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    let plan = store.ensure_day_plan(date);
    let config = store.snapshot().config.clone();
    let Some(variant) = plan.active_variant() else {
        return not_found("variant not found");
    };

    let zones = Zone::ALL
        .iter()
        .map(|&zone| ZoneSummaryResponse {
            zone,
            summary: logic::zone_summary(variant, zone, &config),
        })
        .collect();

    Json(InsightResponse {
        day_key: plan.day_key.clone(),
        variant_id: variant.id,
        insight: logic::analyze(variant, &config),
        day: logic::day_summary(variant, &config),
        zones,
        density: logic::density_check(variant, &config),
        overhead: logic::overhead_breakdown(variant),
        top_spots: logic::top_spots_by_load(variant, TOP_SPOTS).into_iter().cloned().collect(),
    })
    .into_response()
}

// -----------------------------
// POST /api/days/:day/fixes
// Applies one suggestion from the insight to the active variant
// -----------------------------
pub async fn apply_fix(
    State(store): State<AppStore>,
    Path(day): Path<String>,
    Json(fix): Json<FixSuggestion>,
) -> impl IntoResponse {
    if !store.apply_fix(&day, &fix) {
        return not_found("fix target not found");
    }
    match store.day_plan(&day) {
        Some(plan) => Json(plan).into_response(),
        None => not_found("day plan not found"),
    }
}

#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    pub from: String,
    pub to: String,
}

// -----------------------------
// GET /api/days/:day/compare?from=<id>&to=<id>
// Title-based diff between two variants of the same day
// -----------------------------
pub async fn compare(
    State(store): State<AppStore>,
    Path(day): Path<String>,
    Query(q): Query<CompareQuery>,
) -> impl IntoResponse {
    let (from, to) = match (parse_id(&q.from), parse_id(&q.to)) {
        (Ok(f), Ok(t)) => (f, t),
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };

    let Some(plan) = store.day_plan(&day) else {
        return not_found("day plan not found");
    };
    match (plan.variant(from), plan.variant(to)) {
        (Some(a), Some(b)) => Json(logic::compare_variants(a, b)).into_response(),
        _ => not_found("variant not found"),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateVariantInput {
    pub title: String,
    pub rhythm: Option<Rhythm>,
    pub copy_from: Option<Uuid>,
}

// -----------------------------
// POST /api/days/:day/variants
// Adds a blank variant, or a copy of an existing one
// -----------------------------
pub async fn create_variant(
    State(store): State<AppStore>,
    Path(day): Path<String>,
    Json(input): Json<CreateVariantInput>,
) -> impl IntoResponse {
    if input.title.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "title required").into_response();
    }
    let date = match parse_day(&day) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let plan = store.ensure_day_plan(date);

    let id = match input.copy_from {
        Some(source) => store.duplicate_variant(&plan.day_key, source, Some(input.title), input.rhythm),
        None => {
            let rhythm = input.rhythm.unwrap_or(store.snapshot().config.default_rhythm);
            store.add_variant(&plan.day_key, &input.title, rhythm)
        }
    };

    match id {
        Some(id) => (StatusCode::CREATED, Json(serde_json::json!({ "id": id }))).into_response(),
        None => not_found("variant not found"),
    }
}

// -----------------------------
// PUT /api/days/:day/variants/:id
// Renames a variant or changes its rhythm
// -----------------------------
pub async fn update_variant(
    State(store): State<AppStore>,
    Path((day, id)): Path<(String, String)>,
    Json(patch): Json<VariantPatch>,
) -> impl IntoResponse {
    let id = match parse_id(&id) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if !store.update_variant(&day, id, patch) {
        return not_found("variant not found");
    }
    match store.day_plan(&day) {
        Some(plan) => Json(plan).into_response(),
        None => not_found("day plan not found"),
    }
}

// -----------------------------
// POST /api/days/:day/variants/:id/select
// -----------------------------
pub async fn select_variant(
    State(store): State<AppStore>,
    Path((day, id)): Path<(String, String)>,
) -> impl IntoResponse {
    let id = match parse_id(&id) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if !store.select_variant(&day, id) {
        return not_found("variant not found");
    }
    Json(serde_json::json!({ "ok": true })).into_response()
}

// -----------------------------
// POST /api/days/:day/variants/:id/primary
// Exactly one variant per day stays primary
// -----------------------------
pub async fn set_primary_variant(
    State(store): State<AppStore>,
    Path((day, id)): Path<(String, String)>,
) -> impl IntoResponse {
    let id = match parse_id(&id) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if !store.set_primary_variant(&day, id) {
        return not_found("variant not found");
    }
    Json(serde_json::json!({ "ok": true })).into_response()
}

// -----------------------------
// DELETE /api/days/:day/variants/:id
// The last variant of a day cannot be deleted
// -----------------------------
pub async fn delete_variant(
    State(store): State<AppStore>,
    Path((day, id)): Path<(String, String)>,
) -> impl IntoResponse {
    let id = match parse_id(&id) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    match store.delete_variant(&day, id) {
        Ok(true) => Json(serde_json::json!({ "ok": true })).into_response(),
        Ok(false) => not_found("variant not found"),
        Err(PlannerError::LastVariant) => {
            (StatusCode::CONFLICT, "cannot delete the last variant").into_response()
        }
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "failed to delete variant").into_response(),
    }
}

// -----------------------------
// POST /api/days/:day/variants/:id/copy
// Starts a new plan on another day from one variant
// -----------------------------
pub async fn copy_variant(
    State(store): State<AppStore>,
    Path((day, id)): Path<(String, String)>,
    Json(input): Json<CopyInput>,
) -> impl IntoResponse {
    let (id, to) = match (parse_id(&id), parse_day(&input.to)) {
        (Ok(id), Ok(to)) => (id, to),
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };
    match store.copy_variant_to_day(&day, id, to) {
        Some(plan) => Json(plan).into_response(),
        None => not_found("variant not found"),
    }
}
