/*
Overload analysis and budget logic.
Module is independent from the store and HTTP so it can be tested alone:
every function takes a variant and the config, and returns a value.
*/

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Config, Spot, SpotKind, Variant, Zone};

const COMPRESS_PRIORITY: u8 = 80;
const MOVE_ZONE_PRIORITY: u8 = 70;
const INSERT_BREAK_PRIORITY: u8 = 50;
const REMOVE_SPOT_PRIORITY: u8 = 40;
const CREATE_VARIANT_PRIORITY: u8 = 30;

// Spots at or below this duration are never offered for compression
const COMPRESS_MIN_DURATION: i64 = 20;
const COMPRESS_MAX_STEP: i64 = 15;
// Duration a compressed spot keeps at least
const COMPRESS_FLOOR: i64 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Comfortable,
    Tight,
    Overloaded,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FixKind {
    Compress,
    MoveZone,
    InsertBreak,
    RemoveSpot,
    CreateVariant,
}

// Engine-produced recommendation; regenerated on every analysis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixSuggestion {
    pub kind: FixKind,
    pub title: String,
    pub delta_min: i64,
    pub target_spot_id: Option<Uuid>,
    pub target_zone: Option<Zone>,
    pub priority: u8, // 0..=100, higher first
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BudgetSummary {
    pub planned_min: i64,
    pub budget_min: i64,
    pub delta_min: i64,     // >= 0
    pub remaining_min: i64, // >= 0
    pub status: LoadStatus,
    pub usage_percent: f64, // planned / budget, not clamped
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ZoneLoad {
    pub zone: Zone,
    pub planned_min: i64,
    pub budget_min: i64,
    pub delta_min: i64, // signed
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Insight {
    pub status: LoadStatus,
    pub planned_min: i64,
    pub budget_min: i64,
    pub delta_min: i64, // signed
    pub tight_delta_min: i64,
    pub zones: Vec<ZoneLoad>,
    pub primary_over_zone: Option<Zone>,
    pub total_duration_min: i64,
    pub total_buffer_min: i64,
    pub total_travel_min: i64,
    pub suggestions: Vec<FixSuggestion>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DensityCheck {
    pub actual: usize,
    pub recommended: usize,
    pub exceeded: bool,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OverheadBreakdown {
    pub duration_min: i64,
    pub buffer_min: i64,
    pub travel_min: i64,
    pub duration_pct: f64,
    pub buffer_pct: f64,
    pub travel_pct: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct VariantComparison {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub moved: Vec<String>,
    pub compressed: Vec<String>,
}

// Classify a delta (planned - budget) against the two thresholds.
// Both comparisons are strict: a delta equal to a threshold stays below it.
pub fn compute_status(delta: i64, tight_threshold: i64, overload_threshold: i64) -> LoadStatus {
    if delta > overload_threshold {
        LoadStatus::Overloaded
    } else if delta > tight_threshold {
        LoadStatus::Tight
    } else {
        LoadStatus::Comfortable
    }
}

// Zones are judged against half the day thresholds.
// Comparing 2*delta keeps odd thresholds exact (15 -> 7.5).
fn zone_status_for_delta(delta: i64, config: &Config) -> LoadStatus {
    compute_status(
        delta.saturating_mul(2),
        config.tight_threshold_min,
        config.overload_threshold_min,
    )
}

fn day_delta(variant: &Variant, config: &Config) -> i64 {
    variant.total_planned_min() - config.budget_min(variant.rhythm)
}

fn zone_load(variant: &Variant, zone: Zone, config: &Config) -> ZoneLoad {
    let planned_min = variant.planned_min_in(zone);
    let budget_min = config.zone_budget_min(variant.rhythm, zone);
    ZoneLoad {
        zone,
        planned_min,
        budget_min,
        delta_min: planned_min - budget_min,
    }
}

fn usage(planned: i64, budget: i64) -> f64 {
    if budget <= 0 {
        return 0.0;
    }
    planned as f64 / budget as f64
}

fn summary(planned: i64, budget: i64, status: LoadStatus) -> BudgetSummary {
    BudgetSummary {
        planned_min: planned,
        budget_min: budget,
        delta_min: (planned - budget).max(0),
        remaining_min: (budget - planned).max(0),
        status,
        usage_percent: usage(planned, budget),
    }
}

pub fn quick_status(variant: &Variant, config: &Config) -> LoadStatus {
    compute_status(
        day_delta(variant, config),
        config.tight_threshold_min,
        config.overload_threshold_min,
    )
}

pub fn zone_status(variant: &Variant, zone: Zone, config: &Config) -> LoadStatus {
    zone_status_for_delta(zone_load(variant, zone, config).delta_min, config)
}

pub fn day_summary(variant: &Variant, config: &Config) -> BudgetSummary {
    summary(
        variant.total_planned_min(),
        config.budget_min(variant.rhythm),
        quick_status(variant, config),
    )
}

pub fn zone_summary(variant: &Variant, zone: Zone, config: &Config) -> BudgetSummary {
    let load = zone_load(variant, zone, config);
    summary(
        load.planned_min,
        load.budget_min,
        zone_status_for_delta(load.delta_min, config),
    )
}

/// Full analysis of one variant.
///
/// Steps:
/// - day and per-zone planned/budget/delta for the variant's rhythm
/// - day status from the thresholds
/// - the zone with the largest positive delta, if any
/// - overhead totals across all spots
/// - fix suggestions, only when the day is not comfortable
pub fn analyze(variant: &Variant, config: &Config) -> Insight {
    let planned_min = variant.total_planned_min();
    let budget_min = config.budget_min(variant.rhythm);
    let delta_min = planned_min - budget_min;

    let zones: Vec<ZoneLoad> = Zone::ALL
        .iter()
        .map(|&z| zone_load(variant, z, config))
        .collect();

    let status = compute_status(
        delta_min,
        config.tight_threshold_min,
        config.overload_threshold_min,
    );

    let suggestions = if status == LoadStatus::Comfortable {
        Vec::new()
    } else {
        build_suggestions(variant, config, delta_min, &zones)
    };

    Insight {
        status,
        planned_min,
        budget_min,
        delta_min,
        tight_delta_min: (delta_min - config.tight_threshold_min).max(0),
        primary_over_zone: worst_zone(&zones).map(|z| z.zone),
        total_duration_min: variant.spots.iter().map(|s| s.duration_min).sum(),
        total_buffer_min: variant.spots.iter().map(|s| s.buffer_after_min).sum(),
        total_travel_min: variant.spots.iter().map(|s| s.travel_before_min).sum(),
        zones,
        suggestions,
    }
}

// Zone with the largest positive delta; earlier zone wins a tie.
fn worst_zone(zones: &[ZoneLoad]) -> Option<&ZoneLoad> {
    let mut worst: Option<&ZoneLoad> = None;
    for z in zones.iter().filter(|z| z.delta_min > 0) {
        if worst.is_none_or(|w| z.delta_min > w.delta_min) {
            worst = Some(z);
        }
    }
    worst
}

// Non-rest spot with the smallest load; first in zone order wins a tie.
fn lightest_movable<'a>(spots: impl Iterator<Item = &'a Spot>) -> Option<&'a Spot> {
    let mut best: Option<&Spot> = None;
    for s in spots.filter(|s| !s.is_rest()) {
        if best.is_none_or(|b| s.computed_load() < b.computed_load()) {
            best = Some(s);
        }
    }
    best
}

fn build_suggestions(
    variant: &Variant,
    config: &Config,
    delta_min: i64,
    zones: &[ZoneLoad],
) -> Vec<FixSuggestion> {
    let mut out: Vec<FixSuggestion> = Vec::new();

    // 1) compress the two heaviest long spots
    let mut long: Vec<&Spot> = variant
        .spots
        .iter()
        .filter(|s| !s.is_rest() && s.duration_min > COMPRESS_MIN_DURATION)
        .collect();
    long.sort_by(|a, b| b.computed_load().cmp(&a.computed_load()));
    for s in long.into_iter().take(2) {
        let cut = COMPRESS_MAX_STEP.min(s.duration_min - 10);
        if cut <= 0 {
            continue;
        }
        out.push(FixSuggestion {
            kind: FixKind::Compress,
            title: format!("Shorten \"{}\" by {} min", s.title, cut),
            delta_min: cut,
            target_spot_id: Some(s.id),
            target_zone: Some(s.zone),
            priority: COMPRESS_PRIORITY,
        });
    }

    // 2) move the lightest spot out of the worst zone
    if let Some(worst) = worst_zone(zones) {
        let target = zones
            .iter()
            .filter(|z| z.zone != worst.zone)
            .fold(None::<&ZoneLoad>, |best, z| match best {
                Some(b) if b.delta_min <= z.delta_min => Some(b),
                _ => Some(z),
            })
            .map(|z| z.zone)
            .unwrap_or(Zone::Evening);

        if let Some(s) = lightest_movable(variant.spots_in(worst.zone).into_iter()) {
            out.push(FixSuggestion {
                kind: FixKind::MoveZone,
                title: format!("Move \"{}\" to {}", s.title, zone_label(target)),
                delta_min: s.computed_load(),
                target_spot_id: Some(s.id),
                target_zone: Some(target),
                priority: MOVE_ZONE_PRIORITY,
            });
        }
    }

    // 3) at most one break, in the first over-budget zone without rest
    for z in zones.iter().filter(|z| z.delta_min > 0) {
        let has_rest = variant
            .spots
            .iter()
            .any(|s| s.zone == z.zone && s.kind == SpotKind::Rest);
        if !has_rest {
            out.push(FixSuggestion {
                kind: FixKind::InsertBreak,
                title: format!(
                    "Add a {} min break in the {}",
                    config.break_duration_min,
                    zone_label(z.zone)
                ),
                delta_min: 0,
                target_spot_id: None,
                target_zone: Some(z.zone),
                priority: INSERT_BREAK_PRIORITY,
            });
            break;
        }
    }

    // 4) too many spots: drop the shortest one, it disrupts the day least
    let recommended = config.recommended_spots(variant.rhythm);
    if variant.spots.len() > recommended.saturating_add(2) {
        if let Some(s) = lightest_movable(variant.spots.iter()) {
            out.push(FixSuggestion {
                kind: FixKind::RemoveSpot,
                title: format!("Remove \"{}\"", s.title),
                delta_min: s.computed_load(),
                target_spot_id: Some(s.id),
                target_zone: Some(s.zone),
                priority: REMOVE_SPOT_PRIORITY,
            });
        }
    }

    // 5) clearly overloaded: offer a lighter alternative
    if delta_min > config.overload_threshold_min {
        out.push(FixSuggestion {
            kind: FixKind::CreateVariant,
            title: "Create a lighter variant".to_string(),
            delta_min: 0,
            target_spot_id: None,
            target_zone: None,
            priority: CREATE_VARIANT_PRIORITY,
        });
    }

    // stable: equal priorities keep step order
    out.sort_by(|a, b| b.priority.cmp(&a.priority));
    out
}

fn zone_label(zone: Zone) -> &'static str {
    match zone {
        Zone::Morning => "morning",
        Zone::Daytime => "daytime",
        Zone::Evening => "evening",
    }
}

/// Applies a suggestion to a copy of `variant` and returns the copy.
///
/// Lookup misses leave the copy unchanged. `CreateVariant` is a no-op here:
/// creating variants belongs to the store.
pub fn apply_suggestion(suggestion: &FixSuggestion, variant: &Variant, config: &Config) -> Variant {
    let mut out = variant.clone();

    match suggestion.kind {
        FixKind::Compress => {
            if let Some(s) = suggestion.target_spot_id.and_then(|id| out.spot_mut(id)) {
                let cut = suggestion.delta_min.min(s.duration_min - COMPRESS_FLOOR).max(0);
                s.duration_min = (s.duration_min - cut).max(0);
            }
        }
        FixKind::MoveZone => {
            let (Some(id), Some(zone)) = (suggestion.target_spot_id, suggestion.target_zone) else {
                return out;
            };
            let next = out.next_sort_index(zone);
            if let Some(s) = out.spot_mut(id) {
                s.zone = zone;
                s.sort_index = next;
            }
        }
        FixKind::InsertBreak => {
            let zone = suggestion.target_zone.unwrap_or(Zone::Daytime);
            out.push_spot(Spot::new("Break", SpotKind::Rest, zone, config.break_duration_min));
        }
        FixKind::RemoveSpot => {
            if let Some(id) = suggestion.target_spot_id {
                out.spots.retain(|s| s.id != id);
            }
        }
        FixKind::CreateVariant => {}
    }

    out
}

pub fn density_check(variant: &Variant, config: &Config) -> DensityCheck {
    let actual = variant.spots.len();
    let recommended = config.recommended_spots(variant.rhythm);
    DensityCheck {
        actual,
        recommended,
        exceeded: actual > recommended,
        text: format!("{actual} of {recommended} recommended spots"),
    }
}

pub fn overhead_breakdown(variant: &Variant) -> OverheadBreakdown {
    let duration_min: i64 = variant.spots.iter().map(|s| s.duration_min).sum();
    let buffer_min: i64 = variant.spots.iter().map(|s| s.buffer_after_min).sum();
    let travel_min: i64 = variant.spots.iter().map(|s| s.travel_before_min).sum();
    let total = duration_min + buffer_min + travel_min;

    let pct = |part: i64| if total > 0 { part as f64 * 100.0 / total as f64 } else { 0.0 };

    OverheadBreakdown {
        duration_min,
        buffer_min,
        travel_min,
        duration_pct: pct(duration_min),
        buffer_pct: pct(buffer_min),
        travel_pct: pct(travel_min),
    }
}

// Heaviest spots first; ties keep collection order.
pub fn top_spots_by_load(variant: &Variant, n: usize) -> Vec<&Spot> {
    let mut spots: Vec<&Spot> = variant.spots.iter().collect();
    spots.sort_by(|a, b| b.computed_load().cmp(&a.computed_load()));
    spots.truncate(n);
    spots
}

/// Differences going from `from` to `to`.
///
/// Spots are matched by title only. Two unrelated spots sharing a title are
/// treated as the same spot; when a title repeats, its first spot is used.
pub fn compare_variants(from: &Variant, to: &Variant) -> VariantComparison {
    fn by_title(v: &Variant) -> (Vec<&str>, HashMap<&str, &Spot>) {
        let mut order = Vec::new();
        let mut map = HashMap::new();
        for s in &v.spots {
            if !map.contains_key(s.title.as_str()) {
                order.push(s.title.as_str());
                map.insert(s.title.as_str(), s);
            }
        }
        (order, map)
    }

    let (from_order, from_map) = by_title(from);
    let (to_order, to_map) = by_title(to);
    let from_titles: HashSet<&str> = from_map.keys().copied().collect();

    let mut cmp = VariantComparison::default();
    for title in &to_order {
        if !from_titles.contains(title) {
            cmp.added.push(title.to_string());
        }
    }
    for title in &from_order {
        let Some(after) = to_map.get(title) else {
            cmp.removed.push(title.to_string());
            continue;
        };
        let before = from_map[title];
        if before.zone != after.zone {
            cmp.moved.push(title.to_string());
        }
        if after.duration_min < before.duration_min {
            cmp.compressed.push(title.to_string());
        }
    }
    cmp
}
