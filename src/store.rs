//! Single source of truth for everything the planner persists.
//!
//! All changes go through [`Store::commit`] / [`Store::try_commit`]: the
//! current state is cloned, the mutation runs on the clone, the clone is
//! queued for persistence and then published. The whole sequence runs under
//! one lock, so two commits issued back to back always see each other in
//! order, and the persistence queue receives snapshots in commit order.
//!
//! Readers get cheap immutable snapshots ([`Store::snapshot`]) or subscribe to
//! every published state ([`Store::subscribe`]).
//!
//! Helpers address day plans by day key and resolve the active variant at
//! call time. Lookup misses are silent no-ops (`None` / `false`).

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{PlannerError, Result};
use crate::logic::{self, FixKind, FixSuggestion};
use crate::models::{
    AppState, Config, DayPlan, Effort, Pet, PetReaction, Rhythm, Spot, SpotKind, Template,
    Variant, Zone, day_key,
};
use crate::persist::{Persister, encode_state, load_state};
use crate::progress::Progress;
use crate::undo::{UndoAction, UndoRecord};

// Floor for durations edited through `update_spot`
pub const MIN_SPOT_DURATION: i64 = 5;

/// Input for a new spot. Missing overheads fall back to the config defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotDraft {
    pub title: String,
    pub kind: SpotKind,
    pub zone: Zone,
    pub duration_min: i64,
    pub travel_before_min: Option<i64>,
    pub buffer_after_min: Option<i64>,
    #[serde(default)]
    pub effort: Effort,
    #[serde(default)]
    pub note: String,
    pub icon: Option<String>,
}

impl SpotDraft {
    pub fn new(title: impl Into<String>, kind: SpotKind, zone: Zone, duration_min: i64) -> Self {
        Self {
            title: title.into(),
            kind,
            zone,
            duration_min,
            travel_before_min: None,
            buffer_after_min: None,
            effort: Effort::default(),
            note: String::new(),
            icon: None,
        }
    }

    fn into_spot(self, config: &Config) -> Spot {
        let mut spot = Spot::new(self.title, self.kind, self.zone, self.duration_min);
        spot.travel_before_min = self.travel_before_min.unwrap_or(config.default_travel_min).max(0);
        spot.buffer_after_min = self.buffer_after_min.unwrap_or(config.default_buffer_min).max(0);
        spot.effort = self.effort;
        spot.note = self.note;
        spot.icon = self.icon;
        spot
    }
}

/// Partial edit of a spot. Zone and order change only through moves.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpotPatch {
    pub title: Option<String>,
    pub kind: Option<SpotKind>,
    pub duration_min: Option<i64>,
    pub travel_before_min: Option<i64>,
    pub buffer_after_min: Option<i64>,
    pub effort: Option<Effort>,
    pub note: Option<String>,
    // absent keeps the icon, `null` clears it
    #[serde(default, deserialize_with = "present")]
    pub icon: Option<Option<String>>,
}

// Distinguishes an explicit `null` from a missing field.
fn present<'de, D, T>(de: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

impl SpotPatch {
    fn apply(self, spot: &mut Spot) {
        if let Some(title) = self.title {
            spot.title = title;
        }
        if let Some(kind) = self.kind {
            spot.kind = kind;
        }
        if let Some(d) = self.duration_min {
            spot.duration_min = d.max(MIN_SPOT_DURATION);
        }
        if let Some(t) = self.travel_before_min {
            spot.travel_before_min = t.max(0);
        }
        if let Some(b) = self.buffer_after_min {
            spot.buffer_after_min = b.max(0);
        }
        if let Some(effort) = self.effort {
            spot.effort = effort;
        }
        if let Some(note) = self.note {
            spot.note = note;
        }
        if let Some(icon) = self.icon {
            spot.icon = icon;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariantPatch {
    pub title: Option<String>,
    pub rhythm: Option<Rhythm>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateDraft {
    pub title: String,
    pub kind: SpotKind,
    pub zone: Zone,
    pub duration_min: i64,
    #[serde(default)]
    pub travel_before_min: i64,
    #[serde(default)]
    pub buffer_after_min: i64,
    #[serde(default)]
    pub effort: Effort,
    pub icon: Option<String>,
}

impl TemplateDraft {
    fn write_into(self, t: &mut Template) {
        t.title = self.title;
        t.kind = self.kind;
        t.zone = self.zone;
        t.duration_min = self.duration_min.max(MIN_SPOT_DURATION);
        t.travel_before_min = self.travel_before_min.max(0);
        t.buffer_after_min = self.buffer_after_min.max(0);
        t.effort = self.effort;
        t.icon = self.icon;
    }
}

pub struct Store {
    current: watch::Sender<Arc<AppState>>,
    commit_lock: Mutex<()>,
    persister: Persister,
}

impl Store {
    /// Opens the store backed by `path`.
    ///
    /// A missing or unreadable file is replaced by a fresh default state,
    /// which is written back right away.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let persister = Persister::spawn(path.clone())?;

        let state = match load_state(&path) {
            Ok(state) => {
                info!("loaded planner state from {}", path.display());
                Arc::new(state)
            }
            Err(err) => {
                warn!(
                    "could not load state from {} ({err}), starting from defaults",
                    path.display()
                );
                let state = Arc::new(AppState::default());
                persister.submit(Arc::clone(&state));
                state
            }
        };

        let (current, _) = watch::channel(state);
        Ok(Self {
            current,
            commit_lock: Mutex::new(()),
            persister,
        })
    }

    pub fn path(&self) -> &Path {
        self.persister.path()
    }

    pub fn snapshot(&self) -> Arc<AppState> {
        Arc::clone(&self.current.borrow())
    }

    /// Receives every state published after this call.
    pub fn subscribe(&self) -> watch::Receiver<Arc<AppState>> {
        self.current.subscribe()
    }

    /// Waits until all queued writes reached the disk (or failed).
    pub fn flush(&self) -> Result<()> {
        self.persister.flush()
    }

    /// Runs `mutation` on a copy of the state and publishes the copy.
    ///
    /// Calling back into the store from inside `mutation` deadlocks.
    pub fn commit<T>(&self, mutation: impl FnOnce(&mut AppState) -> T) -> T {
        let _guard = self.commit_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = AppState::clone(&self.current.borrow());
        let out = mutation(&mut next);
        self.publish(next);
        out
    }

    /// Like [`Store::commit`], but an `Err` from `mutation` discards the copy
    /// and leaves the current state untouched.
    pub fn try_commit<T>(&self, mutation: impl FnOnce(&mut AppState) -> Result<T>) -> Result<T> {
        let _guard = self.commit_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = AppState::clone(&self.current.borrow());
        let out = mutation(&mut next)?;
        self.publish(next);
        Ok(out)
    }

    // caller holds commit_lock
    fn publish(&self, next: AppState) {
        let next = Arc::new(next);
        self.persister.submit(Arc::clone(&next));
        self.current.send_replace(next);
    }

    // Commit against one day plan. `None` from `edit` aborts the commit.
    fn edit_plan<T>(
        &self,
        day_key: &str,
        edit: impl FnOnce(&mut DayPlan, &mut Option<UndoRecord>, &Config) -> Option<T>,
    ) -> Option<T> {
        let result = self.try_commit(|state| {
            let AppState { config, day_plans, undo, .. } = state;
            let plan = day_plans
                .iter_mut()
                .find(|p| p.day_key == day_key)
                .ok_or(PlannerError::NotFound("day plan"))?;
            let out = edit(plan, undo, config).ok_or(PlannerError::NotFound("plan target"))?;
            plan.updated_at = Utc::now();
            Ok(out)
        });

        match result {
            Ok(out) => Some(out),
            Err(err) => {
                debug!(day_key, "no change: {err}");
                None
            }
        }
    }

    // ---------- day plans ----------

    pub fn day_plan(&self, day_key: &str) -> Option<DayPlan> {
        self.snapshot().plan(day_key).cloned()
    }

    /// Existing plan for `date`, or a blank one created and committed now.
    pub fn ensure_day_plan(&self, date: NaiveDate) -> DayPlan {
        let key = day_key(date);
        if let Some(plan) = self.snapshot().plan(&key) {
            return plan.clone();
        }

        self.commit(|state| {
            if let Some(plan) = state.plan(&key) {
                return plan.clone();
            }
            let plan = DayPlan::blank(date, state.config.default_rhythm);
            info!(day_key = %key, "created day plan");
            state.day_plans.push(plan.clone());
            plan
        })
    }

    /// Mutates the plan stored under `day_key`; no-op when there is none.
    pub fn update_day_plan<T>(&self, day_key: &str, mutation: impl FnOnce(&mut DayPlan) -> T) -> Option<T> {
        self.edit_plan(day_key, |plan, _, _| Some(mutation(plan)))
    }

    /// Copies a whole plan onto `to`, replacing any plan already there.
    /// Every identity in the copy is new.
    pub fn copy_day_plan(&self, from_key: &str, to: NaiveDate) -> Option<DayPlan> {
        self.try_commit(|state| {
            let copy = state
                .plan(from_key)
                .ok_or(PlannerError::NotFound("day plan"))?
                .duplicate_for(to);
            state.put_plan(copy.clone());
            Ok(copy)
        })
        .ok()
    }

    /// Starts a new plan on `to` holding only a fresh copy of one variant.
    pub fn copy_variant_to_day(&self, from_key: &str, variant_id: Uuid, to: NaiveDate) -> Option<DayPlan> {
        self.try_commit(|state| {
            let mut variant = state
                .plan(from_key)
                .and_then(|p| p.variant(variant_id))
                .ok_or(PlannerError::NotFound("variant"))?
                .duplicate();
            variant.is_primary = true;

            let mut plan = DayPlan::blank(to, variant.rhythm);
            plan.selected_variant_id = Some(variant.id);
            plan.variants = vec![variant];
            state.put_plan(plan.clone());
            Ok(plan)
        })
        .ok()
    }

    // ---------- variants ----------

    pub fn add_variant(&self, day_key: &str, title: &str, rhythm: Rhythm) -> Option<Uuid> {
        self.edit_plan(day_key, |plan, _, _| {
            let variant = Variant::blank(title, rhythm, false);
            let id = variant.id;
            plan.variants.push(variant);
            Some(id)
        })
    }

    /// Copies a variant within its plan. The copy is never primary.
    pub fn duplicate_variant(
        &self,
        day_key: &str,
        variant_id: Uuid,
        title: Option<String>,
        rhythm: Option<Rhythm>,
    ) -> Option<Uuid> {
        self.edit_plan(day_key, |plan, _, _| {
            let mut copy = plan.variant(variant_id)?.duplicate();
            copy.is_primary = false;
            if let Some(title) = title {
                copy.title = title;
            }
            if let Some(rhythm) = rhythm {
                copy.rhythm = rhythm;
            }
            let id = copy.id;
            plan.variants.push(copy);
            Some(id)
        })
    }

    /// Duplicates the active variant one rhythm step lighter and selects it.
    pub fn create_lighter_variant(&self, day_key: &str) -> Option<Uuid> {
        self.edit_plan(day_key, |plan, _, _| {
            let source = plan.active_variant()?;
            let mut copy = source.duplicate();
            copy.is_primary = false;
            copy.rhythm = source.rhythm.lighter();
            copy.title = format!("{} (lighter)", source.title);
            let id = copy.id;
            plan.variants.push(copy);
            plan.selected_variant_id = Some(id);
            Some(id)
        })
    }

    pub fn update_variant(&self, day_key: &str, variant_id: Uuid, patch: VariantPatch) -> bool {
        self.edit_plan(day_key, |plan, _, _| {
            let variant = plan.variant_mut(variant_id)?;
            if let Some(title) = patch.title {
                variant.title = title;
            }
            if let Some(rhythm) = patch.rhythm {
                variant.rhythm = rhythm;
            }
            variant.updated_at = Utc::now();
            Some(())
        })
        .is_some()
    }

    pub fn select_variant(&self, day_key: &str, variant_id: Uuid) -> bool {
        self.edit_plan(day_key, |plan, _, _| {
            plan.variant(variant_id)?;
            plan.selected_variant_id = Some(variant_id);
            Some(())
        })
        .is_some()
    }

    pub fn set_primary_variant(&self, day_key: &str, variant_id: Uuid) -> bool {
        self.edit_plan(day_key, |plan, _, _| {
            plan.variant(variant_id)?;
            for v in &mut plan.variants {
                v.is_primary = v.id == variant_id;
            }
            Some(())
        })
        .is_some()
    }

    /// Removes a variant. Refuses to remove the last one of a plan.
    ///
    /// Returns `Ok(false)` when the plan or the variant does not exist.
    pub fn delete_variant(&self, day_key: &str, variant_id: Uuid) -> Result<bool> {
        let result = self.try_commit(|state| {
            let plan = state
                .plan_mut(day_key)
                .ok_or(PlannerError::NotFound("day plan"))?;
            let pos = plan
                .variants
                .iter()
                .position(|v| v.id == variant_id)
                .ok_or(PlannerError::NotFound("variant"))?;
            if plan.variants.len() <= 1 {
                return Err(PlannerError::LastVariant);
            }

            let removed = plan.variants.remove(pos);
            if removed.is_primary && !plan.variants.iter().any(|v| v.is_primary) {
                plan.variants[0].is_primary = true;
            }
            if plan.selected_variant_id == Some(variant_id) {
                let fallback = plan.active_variant().map(|v| v.id);
                plan.selected_variant_id = fallback;
            }
            plan.updated_at = Utc::now();
            Ok(())
        });

        match result {
            Ok(()) => Ok(true),
            Err(PlannerError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    // ---------- spots ----------

    /// Appends a spot to the end of its zone in the active variant.
    pub fn add_spot(&self, day_key: &str, draft: SpotDraft) -> Option<Uuid> {
        self.edit_plan(day_key, |plan, undo, config| {
            let variant = plan.active_variant_mut()?;
            let variant_id = variant.id;
            let id = variant.push_spot(draft.into_spot(config));
            variant.updated_at = Utc::now();
            *undo = Some(UndoRecord::new(&plan.day_key, variant_id, UndoAction::AddSpot { spot_id: id }));
            Some(id)
        })
    }

    pub fn update_spot(&self, day_key: &str, spot_id: Uuid, patch: SpotPatch) -> Option<Spot> {
        self.edit_plan(day_key, |plan, undo, _| {
            let variant = plan.active_variant_mut()?;
            let variant_id = variant.id;
            let spot = variant.spot_mut(spot_id)?;
            let snapshot = spot.clone();
            patch.apply(spot);
            spot.updated_at = Utc::now();
            let updated = spot.clone();
            variant.updated_at = Utc::now();
            *undo = Some(UndoRecord::new(&plan.day_key, variant_id, UndoAction::EditSpot { snapshot }));
            Some(updated)
        })
    }

    pub fn delete_spot(&self, day_key: &str, spot_id: Uuid) -> bool {
        self.edit_plan(day_key, |plan, undo, _| {
            let variant = plan.active_variant_mut()?;
            let variant_id = variant.id;
            let pos = variant.spots.iter().position(|s| s.id == spot_id)?;
            let snapshot = variant.spots.remove(pos);
            variant.updated_at = Utc::now();
            *undo = Some(UndoRecord::new(&plan.day_key, variant_id, UndoAction::DeleteSpot { snapshot }));
            Some(())
        })
        .is_some()
    }

    /// Moves a spot to position `index` of `zone` (clamped to the zone's end),
    /// then renormalizes the source and target zones.
    pub fn move_spot(&self, day_key: &str, spot_id: Uuid, zone: Zone, index: usize) -> bool {
        self.edit_plan(day_key, |plan, undo, _| {
            let variant = plan.active_variant_mut()?;
            let variant_id = variant.id;
            let (from_zone, from_index) = {
                let spot = variant.spot(spot_id)?;
                (spot.zone, spot.sort_index)
            };

            let mut order: Vec<Uuid> = variant
                .spots_in(zone)
                .iter()
                .filter(|s| s.id != spot_id)
                .map(|s| s.id)
                .collect();
            order.insert(index.min(order.len()), spot_id);

            let now = Utc::now();
            for spot in variant.spots.iter_mut() {
                if let Some(pos) = order.iter().position(|id| *id == spot.id) {
                    spot.zone = zone;
                    spot.sort_index = pos as i64;
                }
                if spot.id == spot_id {
                    spot.updated_at = now;
                }
            }

            variant.normalize_zone(from_zone);
            variant.normalize_zone(zone);
            variant.updated_at = now;

            *undo = Some(UndoRecord::new(
                &plan.day_key,
                variant_id,
                UndoAction::MoveSpot { spot_id, zone: from_zone, sort_index: from_index },
            ));
            Some(())
        })
        .is_some()
    }

    /// Moves a spot within its own zone.
    pub fn reorder_spot(&self, day_key: &str, spot_id: Uuid, index: usize) -> bool {
        let zone = self
            .snapshot()
            .plan(day_key)
            .and_then(|p| p.active_variant())
            .and_then(|v| v.spot(spot_id))
            .map(|s| s.zone);
        match zone {
            Some(zone) => self.move_spot(day_key, spot_id, zone, index),
            None => false,
        }
    }

    /// Applies an engine suggestion to the active variant.
    ///
    /// `CreateVariant` creates and selects a lighter copy of the variant.
    pub fn apply_fix(&self, day_key: &str, fix: &FixSuggestion) -> bool {
        if fix.kind == FixKind::CreateVariant {
            return self.create_lighter_variant(day_key).is_some();
        }

        self.edit_plan(day_key, |plan, undo, config| {
            let variant = plan.active_variant_mut()?;
            let before = variant.clone();
            let mut after = logic::apply_suggestion(fix, &before, config);
            if after == before {
                return None;
            }

            let action = match fix.kind {
                FixKind::Compress | FixKind::MoveZone => {
                    let snapshot = before.spot(fix.target_spot_id?)?.clone();
                    UndoAction::ApplyFix { snapshot }
                }
                FixKind::RemoveSpot => {
                    let snapshot = before.spot(fix.target_spot_id?)?.clone();
                    UndoAction::DeleteSpot { snapshot }
                }
                FixKind::InsertBreak => UndoAction::AddSpot {
                    spot_id: after.spots.last()?.id,
                },
                FixKind::CreateVariant => return None,
            };

            if let (FixKind::MoveZone, Some(id)) = (fix.kind, fix.target_spot_id) {
                if let Some(old) = before.spot(id) {
                    after.normalize_zone(old.zone);
                }
            }

            after.updated_at = Utc::now();
            *variant = after;
            *undo = Some(UndoRecord::new(&plan.day_key, before.id, action));
            Some(())
        })
        .is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.snapshot().undo.is_some()
    }

    /// Reverses the last undo-eligible action and clears the slot.
    ///
    /// Returns false, changing nothing, when the slot is empty or its target
    /// no longer exists.
    pub fn undo(&self) -> bool {
        let result = self.try_commit(|state| {
            let record = state.undo.clone().ok_or(PlannerError::NothingToUndo)?;
            let plan = state
                .plan_mut(&record.day_key)
                .ok_or(PlannerError::NotFound("day plan"))?;
            if !record.reverse(plan) {
                return Err(PlannerError::NotFound("undo target"));
            }
            plan.updated_at = Utc::now();
            state.undo = None;
            Ok(())
        });

        match result {
            Ok(()) => true,
            Err(err) => {
                debug!("undo skipped: {err}");
                false
            }
        }
    }

    // ---------- templates ----------

    pub fn create_template(&self, draft: TemplateDraft) -> Template {
        self.commit(|state| {
            let mut template = Template {
                id: Uuid::new_v4(),
                title: String::new(),
                kind: draft.kind,
                zone: draft.zone,
                duration_min: 0,
                travel_before_min: 0,
                buffer_after_min: 0,
                effort: Effort::default(),
                icon: None,
                usage_count: 0,
                created_at: Utc::now(),
            };
            draft.write_into(&mut template);
            state.templates.push(template.clone());
            template
        })
    }

    pub fn update_template(&self, id: Uuid, draft: TemplateDraft) -> Option<Template> {
        self.try_commit(|state| {
            let template = state.template_mut(id).ok_or(PlannerError::NotFound("template"))?;
            draft.write_into(template);
            Ok(template.clone())
        })
        .ok()
    }

    pub fn delete_template(&self, id: Uuid) -> bool {
        self.try_commit(|state| {
            let before = state.templates.len();
            state.templates.retain(|t| t.id != id);
            if state.templates.len() == before {
                return Err(PlannerError::NotFound("template"));
            }
            Ok(())
        })
        .is_ok()
    }

    /// Adds a spot built from a template to the active variant and counts
    /// the use. `zone` overrides the template's own zone.
    pub fn apply_template(&self, day_key: &str, template_id: Uuid, zone: Option<Zone>) -> Option<Uuid> {
        self.try_commit(|state| {
            let AppState { day_plans, templates, undo, .. } = state;
            let template = templates
                .iter_mut()
                .find(|t| t.id == template_id)
                .ok_or(PlannerError::NotFound("template"))?;
            let plan = day_plans
                .iter_mut()
                .find(|p| p.day_key == day_key)
                .ok_or(PlannerError::NotFound("day plan"))?;
            let variant = plan
                .active_variant_mut()
                .ok_or(PlannerError::NotFound("variant"))?;

            let spot = template.instantiate(zone.unwrap_or(template.zone));
            let variant_id = variant.id;
            let id = variant.push_spot(spot);
            variant.updated_at = Utc::now();
            template.usage_count += 1;
            plan.updated_at = Utc::now();
            *undo = Some(UndoRecord::new(day_key, variant_id, UndoAction::AddSpot { spot_id: id }));
            Ok(id)
        })
        .ok()
    }

    // ---------- config, progress, identity ----------

    pub fn set_config(&self, config: Config) {
        self.commit(|state| state.config = config);
    }

    pub fn record_xp(&self, amount: u64, date: NaiveDate) -> Progress {
        self.commit(|state| {
            state.progress.record(amount, date);
            state.progress.clone()
        })
    }

    pub fn set_display_name(&self, name: &str) {
        self.commit(|state| state.identity.display_name = name.to_string());
    }

    pub fn complete_onboarding(&self) {
        self.commit(|state| state.onboarding_done = true);
    }

    // ---------- pet care ----------

    pub fn add_pet(&self, name: &str, species: &str) -> Uuid {
        self.commit(|state| {
            let pet = Pet {
                id: Uuid::new_v4(),
                name: name.to_string(),
                species: species.to_string(),
                created_at: Utc::now(),
            };
            let id = pet.id;
            state.pet_care.pets.push(pet);
            id
        })
    }

    /// Removes a pet together with its reaction log.
    pub fn remove_pet(&self, pet_id: Uuid) -> bool {
        self.try_commit(|state| {
            let care = &mut state.pet_care;
            let before = care.pets.len();
            care.pets.retain(|p| p.id != pet_id);
            if care.pets.len() == before {
                return Err(PlannerError::NotFound("pet"));
            }
            care.reactions.retain(|r| r.pet_id != pet_id);
            Ok(())
        })
        .is_ok()
    }

    pub fn log_pet_reaction(
        &self,
        pet_id: Uuid,
        date: NaiveDate,
        reaction: &str,
        note: Option<String>,
    ) -> Option<Uuid> {
        self.try_commit(|state| {
            if !state.pet_care.pets.iter().any(|p| p.id == pet_id) {
                return Err(PlannerError::NotFound("pet"));
            }
            let entry = PetReaction {
                id: Uuid::new_v4(),
                pet_id,
                day_key: day_key(date),
                reaction: reaction.to_string(),
                note,
                at: Utc::now(),
            };
            let id = entry.id;
            state.pet_care.reactions.push(entry);
            Ok(id)
        })
        .ok()
    }

    // ---------- whole state ----------

    /// Current state in the on-disk document format.
    pub fn export(&self) -> Result<String> {
        encode_state(&self.snapshot())
    }

    pub fn reset(&self) {
        info!("resetting planner state to defaults");
        self.commit(|state| *state = AppState::default());
    }

    /// Size in bytes of the persisted document, 0 when not written yet.
    pub fn file_size(&self) -> u64 {
        fs::metadata(self.path()).map(|m| m.len()).unwrap_or(0)
    }
}
