/*
Single-slot undo log.
The store records at most one entry; a newer undo-eligible mutation
overwrites it, and a successful reversal clears it.
*/

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{DayPlan, Spot, Zone};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UndoAction {
    AddSpot { spot_id: Uuid },
    DeleteSpot { snapshot: Spot },
    MoveSpot { spot_id: Uuid, zone: Zone, sort_index: i64 },
    EditSpot { snapshot: Spot },
    ApplyFix { snapshot: Spot },
}

/// Where the action happened plus what is needed to reverse it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UndoRecord {
    pub day_key: String,
    pub variant_id: Uuid,
    pub action: UndoAction,
}

impl UndoRecord {
    pub fn new(day_key: &str, variant_id: Uuid, action: UndoAction) -> Self {
        Self {
            day_key: day_key.to_string(),
            variant_id,
            action,
        }
    }

    /// Reverses the recorded action on `plan`.
    ///
    /// Returns false without touching the plan when the variant or the spot
    /// the record points at no longer exists. Moves are restored verbatim,
    /// no re-normalization happens here.
    pub fn reverse(&self, plan: &mut DayPlan) -> bool {
        let Some(variant) = plan.variant_mut(self.variant_id) else {
            return false;
        };

        match &self.action {
            UndoAction::AddSpot { spot_id } => {
                let before = variant.spots.len();
                variant.spots.retain(|s| s.id != *spot_id);
                variant.spots.len() != before
            }
            UndoAction::DeleteSpot { snapshot } => {
                if variant.spot(snapshot.id).is_some() {
                    return false;
                }
                variant.spots.push(snapshot.clone());
                true
            }
            UndoAction::MoveSpot { spot_id, zone, sort_index } => {
                let Some(spot) = variant.spot_mut(*spot_id) else {
                    return false;
                };
                spot.zone = *zone;
                spot.sort_index = *sort_index;
                true
            }
            UndoAction::EditSpot { snapshot } | UndoAction::ApplyFix { snapshot } => {
                let Some(spot) = variant.spot_mut(snapshot.id) else {
                    return false;
                };
                *spot = snapshot.clone();
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Rhythm, SpotKind};
    use chrono::NaiveDate;

    fn plan_with_spot() -> (DayPlan, Uuid, Spot) {
        let mut plan = DayPlan::blank(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(), Rhythm::Normal);
        let variant_id = plan.variants[0].id;
        let spot = Spot::new("Write report", SpotKind::Work, Zone::Morning, 90);
        let id = plan.variants[0].push_spot(spot);
        let spot = plan.variants[0].spot(id).unwrap().clone();
        (plan, variant_id, spot)
    }

    #[test]
    fn reverse_add_removes_spot() {
        let (mut plan, variant_id, spot) = plan_with_spot();
        let record = UndoRecord::new(&plan.day_key, variant_id, UndoAction::AddSpot { spot_id: spot.id });
        assert!(record.reverse(&mut plan));
        assert!(plan.variants[0].spots.is_empty());
        assert!(!record.reverse(&mut plan));
    }

    #[test]
    fn reverse_delete_reappends_snapshot() {
        let (mut plan, variant_id, spot) = plan_with_spot();
        plan.variants[0].spots.clear();
        let record = UndoRecord::new(
            &plan.day_key,
            variant_id,
            UndoAction::DeleteSpot { snapshot: spot.clone() },
        );
        assert!(record.reverse(&mut plan));
        assert_eq!(plan.variants[0].spots, vec![spot]);
    }

    #[test]
    fn reverse_move_restores_zone_and_index() {
        let (mut plan, variant_id, spot) = plan_with_spot();
        {
            let s = plan.variants[0].spot_mut(spot.id).unwrap();
            s.zone = Zone::Evening;
            s.sort_index = 4;
        }
        let record = UndoRecord::new(
            &plan.day_key,
            variant_id,
            UndoAction::MoveSpot { spot_id: spot.id, zone: Zone::Morning, sort_index: 0 },
        );
        assert!(record.reverse(&mut plan));
        let s = plan.variants[0].spot(spot.id).unwrap();
        assert_eq!((s.zone, s.sort_index), (Zone::Morning, 0));
    }

    #[test]
    fn reverse_edit_replaces_by_id() {
        let (mut plan, variant_id, spot) = plan_with_spot();
        plan.variants[0].spot_mut(spot.id).unwrap().duration_min = 30;
        let record = UndoRecord::new(&plan.day_key, variant_id, UndoAction::EditSpot { snapshot: spot.clone() });
        assert!(record.reverse(&mut plan));
        assert_eq!(plan.variants[0].spot(spot.id).unwrap().duration_min, 90);
    }

    #[test]
    fn reverse_fails_when_variant_is_gone() {
        let (mut plan, _, spot) = plan_with_spot();
        let record = UndoRecord::new(&plan.day_key, Uuid::new_v4(), UndoAction::ApplyFix { snapshot: spot });
        assert!(!record.reverse(&mut plan));
    }
}
