use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::progress::Progress;
use crate::undo::UndoRecord;

// Canonical "YYYY-MM-DD" key for a calendar day.
// Derived from the naive date only, so it never depends on locale or timezone.
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_day_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Morning,
    Daytime,
    Evening,
}

impl Zone {
    pub const ALL: [Zone; 3] = [Zone::Morning, Zone::Daytime, Zone::Evening];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SpotKind {
    Generic,
    Work,
    Meeting,
    Sport,
    Errand,
    Rest,
    Travel,
}

// Cosmetic label shown next to a spot. Not part of any load math.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Rhythm {
    Light,
    Normal,
    Intense,
}

impl Rhythm {
    // One step towards a calmer day; light stays light.
    pub fn lighter(self) -> Rhythm {
        match self {
            Rhythm::Intense => Rhythm::Normal,
            Rhythm::Normal | Rhythm::Light => Rhythm::Light,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Spot {
    pub id: Uuid,
    pub title: String,
    pub kind: SpotKind,
    pub zone: Zone,
    pub sort_index: i64,
    pub duration_min: i64,
    pub travel_before_min: i64,
    pub buffer_after_min: i64,
    #[serde(default)]
    pub effort: Effort,
    #[serde(default)]
    pub note: String,
    pub icon: Option<String>,
    pub origin_template_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Spot {
    pub fn new(title: impl Into<String>, kind: SpotKind, zone: Zone, duration_min: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            kind,
            zone,
            sort_index: 0,
            duration_min,
            travel_before_min: 0,
            buffer_after_min: 0,
            effort: Effort::default(),
            note: String::new(),
            icon: None,
            origin_template_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    // duration + travel before + buffer after
    pub fn computed_load(&self) -> i64 {
        self.duration_min + self.travel_before_min + self.buffer_after_min
    }

    pub fn is_rest(&self) -> bool {
        self.kind == SpotKind::Rest
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Variant {
    pub id: Uuid,
    pub title: String,
    pub rhythm: Rhythm,
    pub is_primary: bool,
    pub spots: Vec<Spot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Variant {
    pub fn blank(title: impl Into<String>, rhythm: Rhythm, is_primary: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            rhythm,
            is_primary,
            spots: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn total_planned_min(&self) -> i64 {
        self.spots.iter().map(Spot::computed_load).sum()
    }

    pub fn planned_min_in(&self, zone: Zone) -> i64 {
        self.spots
            .iter()
            .filter(|s| s.zone == zone)
            .map(Spot::computed_load)
            .sum()
    }

    /// Spots of one zone ordered by `sort_index` ascending.
    pub fn spots_in(&self, zone: Zone) -> Vec<&Spot> {
        let mut spots: Vec<&Spot> = self.spots.iter().filter(|s| s.zone == zone).collect();
        spots.sort_by_key(|s| s.sort_index);
        spots
    }

    pub fn spot(&self, id: Uuid) -> Option<&Spot> {
        self.spots.iter().find(|s| s.id == id)
    }

    pub fn spot_mut(&mut self, id: Uuid) -> Option<&mut Spot> {
        self.spots.iter_mut().find(|s| s.id == id)
    }

    // Index a freshly appended spot gets in `zone`.
    pub fn next_sort_index(&self, zone: Zone) -> i64 {
        self.spots
            .iter()
            .filter(|s| s.zone == zone)
            .map(|s| s.sort_index + 1)
            .max()
            .unwrap_or(0)
    }

    /// Appends `spot` at the end of its zone and returns its id.
    pub fn push_spot(&mut self, mut spot: Spot) -> Uuid {
        spot.sort_index = self.next_sort_index(spot.zone);
        let id = spot.id;
        self.spots.push(spot);
        id
    }

    /// Rewrites the sort indices of `zone` into a dense 0..N-1 sequence,
    /// keeping the current relative order (ties keep collection order).
    pub fn normalize_zone(&mut self, zone: Zone) {
        let mut positions: Vec<usize> = self
            .spots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.zone == zone)
            .map(|(i, _)| i)
            .collect();
        positions.sort_by_key(|&i| self.spots[i].sort_index);

        for (index, pos) in positions.into_iter().enumerate() {
            self.spots[pos].sort_index = index as i64;
        }
    }

    /// Deep copy with a new identity for the variant and every spot.
    pub fn duplicate(&self) -> Variant {
        let now = Utc::now();
        let spots = self
            .spots
            .iter()
            .map(|s| Spot {
                id: Uuid::new_v4(),
                created_at: now,
                updated_at: now,
                ..s.clone()
            })
            .collect();

        Variant {
            id: Uuid::new_v4(),
            title: self.title.clone(),
            rhythm: self.rhythm,
            is_primary: self.is_primary,
            spots,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayPlan {
    pub id: Uuid,
    pub date: NaiveDate,
    pub day_key: String,
    pub selected_variant_id: Option<Uuid>,
    pub variants: Vec<Variant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DayPlan {
    /// A plan seeded with one primary variant named "Main".
    pub fn blank(date: NaiveDate, rhythm: Rhythm) -> Self {
        let now = Utc::now();
        let main = Variant::blank("Main", rhythm, true);
        Self {
            id: Uuid::new_v4(),
            date,
            day_key: day_key(date),
            selected_variant_id: Some(main.id),
            variants: vec![main],
            created_at: now,
            updated_at: now,
        }
    }

    fn active_index(&self) -> Option<usize> {
        self.selected_variant_id
            .and_then(|id| self.variants.iter().position(|v| v.id == id))
            .or_else(|| self.variants.iter().position(|v| v.is_primary))
            .or(if self.variants.is_empty() { None } else { Some(0) })
    }

    // selected -> primary -> first
    pub fn active_variant(&self) -> Option<&Variant> {
        self.active_index().map(|i| &self.variants[i])
    }

    pub fn active_variant_mut(&mut self) -> Option<&mut Variant> {
        self.active_index().map(move |i| &mut self.variants[i])
    }

    pub fn variant(&self, id: Uuid) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == id)
    }

    pub fn variant_mut(&mut self, id: Uuid) -> Option<&mut Variant> {
        self.variants.iter_mut().find(|v| v.id == id)
    }

    /// Deep copy onto another date. Plan, variants and spots all get fresh ids;
    /// the selection follows the copied variant.
    pub fn duplicate_for(&self, date: NaiveDate) -> DayPlan {
        let now = Utc::now();
        let selected_pos = self.active_index();
        let variants: Vec<Variant> = self.variants.iter().map(Variant::duplicate).collect();
        let selected_variant_id = selected_pos.map(|i| variants[i].id);

        DayPlan {
            id: Uuid::new_v4(),
            date,
            day_key: day_key(date),
            selected_variant_id,
            variants,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RhythmBudget {
    pub budget_min: i64,
    pub recommended_spots: usize,
}

/// Budget lookup table, one row per rhythm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RhythmTable {
    pub light: RhythmBudget,
    pub normal: RhythmBudget,
    pub intense: RhythmBudget,
}

impl RhythmTable {
    pub fn get(&self, rhythm: Rhythm) -> RhythmBudget {
        match rhythm {
            Rhythm::Light => self.light,
            Rhythm::Normal => self.normal,
            Rhythm::Intense => self.intense,
        }
    }

    pub fn get_mut(&mut self, rhythm: Rhythm) -> &mut RhythmBudget {
        match rhythm {
            Rhythm::Light => &mut self.light,
            Rhythm::Normal => &mut self.normal,
            Rhythm::Intense => &mut self.intense,
        }
    }
}

impl Default for RhythmTable {
    fn default() -> Self {
        Self {
            light: RhythmBudget { budget_min: 300, recommended_spots: 4 },
            normal: RhythmBudget { budget_min: 420, recommended_spots: 6 },
            intense: RhythmBudget { budget_min: 540, recommended_spots: 8 },
        }
    }
}

// Percent of the day budget given to each zone. Expected to add up to 100.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ZoneShares {
    pub morning: i64,
    pub daytime: i64,
    pub evening: i64,
}

impl ZoneShares {
    pub fn get(&self, zone: Zone) -> i64 {
        match zone {
            Zone::Morning => self.morning,
            Zone::Daytime => self.daytime,
            Zone::Evening => self.evening,
        }
    }
}

impl Default for ZoneShares {
    fn default() -> Self {
        Self { morning: 30, daytime: 45, evening: 25 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub default_rhythm: Rhythm,
    pub default_buffer_min: i64,
    pub default_travel_min: i64,
    pub overload_threshold_min: i64,
    pub tight_threshold_min: i64,
    pub break_duration_min: i64,
    pub zone_shares: ZoneShares,
    pub rhythms: RhythmTable,
}

impl Config {
    pub fn budget_min(&self, rhythm: Rhythm) -> i64 {
        self.rhythms.get(rhythm).budget_min
    }

    pub fn recommended_spots(&self, rhythm: Rhythm) -> usize {
        self.rhythms.get(rhythm).recommended_spots
    }

    pub fn zone_budget_min(&self, rhythm: Rhythm, zone: Zone) -> i64 {
        self.budget_min(rhythm).saturating_mul(self.zone_shares.get(zone)) / 100
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_rhythm: Rhythm::Normal,
            default_buffer_min: 10,
            default_travel_min: 0,
            overload_threshold_min: 15,
            tight_threshold_min: 5,
            break_duration_min: 15,
            zone_shares: ZoneShares::default(),
            rhythms: RhythmTable::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Template {
    pub id: Uuid,
    pub title: String,
    pub kind: SpotKind,
    pub zone: Zone,
    pub duration_min: i64,
    pub travel_before_min: i64,
    pub buffer_after_min: i64,
    #[serde(default)]
    pub effort: Effort,
    pub icon: Option<String>,
    pub usage_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Template {
    /// Spot instance built from this template, pointing back at it.
    pub fn instantiate(&self, zone: Zone) -> Spot {
        let mut spot = Spot::new(self.title.clone(), self.kind, zone, self.duration_min);
        spot.travel_before_min = self.travel_before_min;
        spot.buffer_after_min = self.buffer_after_min;
        spot.effort = self.effort;
        spot.icon = self.icon.clone();
        spot.origin_template_id = Some(self.id);
        spot
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Identity {
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pet {
    pub id: Uuid,
    pub name: String,
    pub species: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PetReaction {
    pub id: Uuid,
    pub pet_id: Uuid,
    pub day_key: String,
    pub reaction: String,
    pub note: Option<String>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PetCare {
    pub pets: Vec<Pet>,
    pub reactions: Vec<PetReaction>,
}

/// Root aggregate and the whole unit of persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppState {
    #[serde(default)]
    pub config: Config,
    #[serde(default)]
    pub day_plans: Vec<DayPlan>,
    #[serde(default)]
    pub templates: Vec<Template>,
    #[serde(default)]
    pub progress: Progress,
    #[serde(default)]
    pub identity: Identity,
    #[serde(default)]
    pub pet_care: PetCare,
    #[serde(default)]
    pub onboarding_done: bool,
    #[serde(default)]
    pub undo: Option<UndoRecord>,
}

impl AppState {
    pub fn plan(&self, day_key: &str) -> Option<&DayPlan> {
        self.day_plans.iter().find(|p| p.day_key == day_key)
    }

    pub fn plan_mut(&mut self, day_key: &str) -> Option<&mut DayPlan> {
        self.day_plans.iter_mut().find(|p| p.day_key == day_key)
    }

    /// Inserts `plan`, replacing whatever plan already owns its day key.
    pub fn put_plan(&mut self, plan: DayPlan) {
        match self.day_plans.iter().position(|p| p.day_key == plan.day_key) {
            Some(i) => self.day_plans[i] = plan,
            None => self.day_plans.push(plan),
        }
    }

    pub fn template_mut(&mut self, id: Uuid) -> Option<&mut Template> {
        self.templates.iter_mut().find(|t| t.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn spot(title: &str, zone: Zone, duration: i64) -> Spot {
        Spot::new(title, SpotKind::Work, zone, duration)
    }

    #[test]
    fn day_key_is_zero_padded() {
        assert_eq!(day_key(date(2026, 3, 7)), "2026-03-07");
        assert_eq!(parse_day_key("2026-03-07"), Some(date(2026, 3, 7)));
        assert_eq!(parse_day_key("07.03.2026"), None);
    }

    #[test]
    fn computed_load_sums_overhead() {
        let mut s = spot("Gym", Zone::Morning, 60);
        s.travel_before_min = 15;
        s.buffer_after_min = 10;
        assert_eq!(s.computed_load(), 85);
    }

    #[test]
    fn blank_plan_has_one_primary_main_variant() {
        let plan = DayPlan::blank(date(2026, 1, 2), Rhythm::Normal);
        assert_eq!(plan.day_key, "2026-01-02");
        assert_eq!(plan.variants.len(), 1);
        let main = plan.active_variant().unwrap();
        assert_eq!(main.title, "Main");
        assert!(main.is_primary);
        assert_eq!(plan.selected_variant_id, Some(main.id));
    }

    #[test]
    fn active_variant_falls_back_to_primary_then_first() {
        let mut plan = DayPlan::blank(date(2026, 1, 2), Rhythm::Normal);
        let mut alt = Variant::blank("Alt", Rhythm::Light, false);
        alt.spots.push(spot("x", Zone::Daytime, 30));
        let alt_id = alt.id;
        plan.variants.insert(0, alt);

        plan.selected_variant_id = Some(Uuid::new_v4());
        assert_eq!(plan.active_variant().unwrap().title, "Main");

        plan.variants[1].is_primary = false;
        assert_eq!(plan.active_variant().unwrap().id, alt_id);

        plan.selected_variant_id = Some(alt_id);
        assert_eq!(plan.active_variant().unwrap().id, alt_id);
    }

    #[test]
    fn zone_queries_filter_and_sort() {
        let mut v = Variant::blank("Main", Rhythm::Normal, true);
        v.push_spot(spot("a", Zone::Evening, 30));
        v.push_spot(spot("b", Zone::Morning, 20));
        v.push_spot(spot("c", Zone::Evening, 40));
        v.spots[0].sort_index = 5;

        let titles: Vec<&str> = v.spots_in(Zone::Evening).iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "a"]);
        assert_eq!(v.planned_min_in(Zone::Evening), 70);
        assert_eq!(v.total_planned_min(), 90);
        assert_eq!(v.next_sort_index(Zone::Evening), 6);
        assert_eq!(v.next_sort_index(Zone::Daytime), 0);
    }

    #[test]
    fn normalize_zone_is_dense_and_idempotent() {
        let mut v = Variant::blank("Main", Rhythm::Normal, true);
        for (title, idx) in [("a", 7), ("b", 2), ("c", 2), ("d", -1)] {
            let mut s = spot(title, Zone::Daytime, 30);
            s.sort_index = idx;
            v.spots.push(s);
        }
        let mut other = spot("m", Zone::Morning, 30);
        other.sort_index = 9;
        v.spots.push(other);

        v.normalize_zone(Zone::Daytime);
        let first: Vec<(String, i64)> = v
            .spots_in(Zone::Daytime)
            .iter()
            .map(|s| (s.title.clone(), s.sort_index))
            .collect();
        assert_eq!(
            first,
            vec![("d".into(), 0), ("b".into(), 1), ("c".into(), 2), ("a".into(), 3)]
        );

        v.normalize_zone(Zone::Daytime);
        let second: Vec<(String, i64)> = v
            .spots_in(Zone::Daytime)
            .iter()
            .map(|s| (s.title.clone(), s.sort_index))
            .collect();
        assert_eq!(first, second);
        assert_eq!(v.spots_in(Zone::Morning)[0].sort_index, 9);
    }

    #[test]
    fn duplicate_for_regenerates_every_identity() {
        let mut plan = DayPlan::blank(date(2026, 1, 2), Rhythm::Normal);
        plan.variants[0].push_spot(spot("a", Zone::Morning, 30));
        plan.variants[0].push_spot(spot("b", Zone::Evening, 30));
        let mut alt = Variant::blank("Alt", Rhythm::Light, false);
        alt.push_spot(spot("c", Zone::Daytime, 30));
        plan.selected_variant_id = Some(alt.id);
        plan.variants.push(alt);

        let copy = plan.duplicate_for(date(2026, 1, 3));
        assert_eq!(copy.day_key, "2026-01-03");
        assert_eq!(copy.variants.len(), 2);
        assert_eq!(copy.active_variant().unwrap().title, "Alt");

        let ids = |p: &DayPlan| -> HashSet<Uuid> {
            let mut ids = HashSet::from([p.id]);
            for v in &p.variants {
                ids.insert(v.id);
                ids.extend(v.spots.iter().map(|s| s.id));
            }
            ids
        };
        assert!(ids(&plan).is_disjoint(&ids(&copy)));
    }

    #[test]
    fn zone_budget_uses_shares() {
        let config = Config::default();
        assert_eq!(config.budget_min(Rhythm::Normal), 420);
        assert_eq!(config.zone_budget_min(Rhythm::Normal, Zone::Morning), 126);
        assert_eq!(config.zone_budget_min(Rhythm::Normal, Zone::Daytime), 189);
        assert_eq!(config.zone_budget_min(Rhythm::Normal, Zone::Evening), 105);
        assert_eq!(config.recommended_spots(Rhythm::Light), 4);
    }

    #[test]
    fn huge_budget_saturates_zone_budget() {
        let mut config = Config::default();
        config.rhythms.normal.budget_min = i64::MAX;
        assert_eq!(config.zone_budget_min(Rhythm::Normal, Zone::Daytime), i64::MAX / 100);
    }

    #[test]
    fn template_instantiates_with_origin_reference() {
        let template = Template {
            id: Uuid::new_v4(),
            title: "Run".into(),
            kind: SpotKind::Sport,
            zone: Zone::Morning,
            duration_min: 45,
            travel_before_min: 5,
            buffer_after_min: 10,
            effort: Effort::High,
            icon: Some("run".into()),
            usage_count: 0,
            created_at: Utc::now(),
        };
        let s = template.instantiate(Zone::Evening);
        assert_eq!(s.zone, Zone::Evening);
        assert_eq!(s.computed_load(), 60);
        assert_eq!(s.origin_template_id, Some(template.id));
    }

    #[test]
    fn put_plan_replaces_same_day() {
        let mut state = AppState::default();
        state.put_plan(DayPlan::blank(date(2026, 5, 1), Rhythm::Normal));
        let replacement = DayPlan::blank(date(2026, 5, 1), Rhythm::Light);
        let id = replacement.id;
        state.put_plan(replacement);
        assert_eq!(state.day_plans.len(), 1);
        assert_eq!(state.plan("2026-05-01").unwrap().id, id);
    }
}
