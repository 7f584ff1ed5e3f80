//! Day planner core: domain records, the overload engine, the state store
//! and the HTTP API exposed to the presentation layer.

pub mod error;    // Crate error type
pub mod models;   // Data structures (Spot, Variant, DayPlan, Config, AppState, ...)
pub mod logic;    // Overload analysis, budgets and fix suggestions
pub mod undo;     // Single-slot undo log
pub mod progress; // XP, levels, streaks
pub mod persist;  // JSON document on disk + serial write worker
pub mod store;    // Single-writer state store
pub mod settings; // Process settings (paths, bind address)
pub mod routes_plan;  // HTTP handlers for day plans, variants and insight
pub mod routes_spots; // HTTP handlers for spots and undo
pub mod routes_state; // HTTP handlers for config, templates, progress, export

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};

pub use error::{PlannerError, Result};
pub use models::{AppState, Config, DayPlan, Rhythm, Spot, SpotKind, Variant, Zone};
pub use store::Store;

pub type AppStore = Arc<Store>;

/// All API routes, to be nested under `/api`.
pub fn api_router(store: AppStore) -> Router {
    Router::new()
        // day plans
        .route("/days/:day", get(routes_plan::get_day))
        .route("/days/:day/copy", post(routes_plan::copy_day))
        .route("/days/:day/insight", get(routes_plan::get_insight))
        .route("/days/:day/fixes", post(routes_plan::apply_fix))
        .route("/days/:day/compare", get(routes_plan::compare))
        // variants
        .route("/days/:day/variants", post(routes_plan::create_variant))
        .route(
            "/days/:day/variants/:id",
            put(routes_plan::update_variant).delete(routes_plan::delete_variant),
        )
        .route("/days/:day/variants/:id/select", post(routes_plan::select_variant))
        .route("/days/:day/variants/:id/primary", post(routes_plan::set_primary_variant))
        .route("/days/:day/variants/:id/copy", post(routes_plan::copy_variant))
        // spots
        .route("/days/:day/spots", post(routes_spots::create_spot))
        .route(
            "/days/:day/spots/:id",
            put(routes_spots::update_spot).delete(routes_spots::delete_spot),
        )
        .route("/days/:day/spots/:id/move", post(routes_spots::move_spot))
        .route("/undo", post(routes_spots::undo))
        // templates
        .route(
            "/templates",
            get(routes_state::get_templates).post(routes_state::create_template),
        )
        .route(
            "/templates/:id",
            put(routes_state::update_template).delete(routes_state::delete_template),
        )
        .route("/days/:day/templates/:id", post(routes_state::apply_template))
        // config, progress, whole state
        .route("/config", get(routes_state::get_config).put(routes_state::put_config))
        .route("/progress", get(routes_state::get_progress))
        .route("/progress/xp", post(routes_state::record_xp))
        .route("/export", get(routes_state::export))
        .route("/reset", post(routes_state::reset))
        .route("/diagnostics", get(routes_state::diagnostics))
        .with_state(store)
}
