//! Integration tests for the store: persistence, recovery and ordering.

use std::{fs, sync::Arc, thread};

use chrono::NaiveDate;
use day_planner::{
    AppState, Store, SpotKind, Zone,
    logic::{self, FixKind, LoadStatus},
    persist::load_state,
    store::SpotDraft,
};

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 9, d).unwrap()
}

fn draft(title: &str, zone: Zone, duration: i64) -> SpotDraft {
    SpotDraft {
        travel_before_min: Some(0),
        buffer_after_min: Some(0),
        ..SpotDraft::new(title, SpotKind::Work, zone, duration)
    }
}

#[test]
fn corrupt_file_falls_back_to_defaults_and_heals() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    fs::write(&path, "\u{0}\u{1} definitely not json").unwrap();

    let store = Store::open(&path).unwrap();
    assert_eq!(*store.snapshot(), AppState::default());

    store.flush().unwrap();
    assert_eq!(load_state(&path).unwrap(), AppState::default());
}

#[test]
fn missing_file_is_created_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sub").join("state.json");

    let store = Store::open(&path).unwrap();
    store.flush().unwrap();
    assert!(path.exists());
    assert!(store.file_size() > 0);
}

#[test]
fn state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let key = {
        let store = Store::open(&path).unwrap();
        let key = store.ensure_day_plan(date(1)).day_key;
        store.add_spot(&key, draft("Dentist", Zone::Morning, 45)).unwrap();
        store.set_display_name("Robin");
        key
        // dropping the store drains the write queue
    };

    let store = Store::open(&path).unwrap();
    let state = store.snapshot();
    assert_eq!(state.identity.display_name, "Robin");
    let plan = state.plan(&key).unwrap();
    assert_eq!(plan.active_variant().unwrap().spots[0].title, "Dentist");
    assert!(state.undo.is_some());
}

#[test]
fn export_matches_the_persisted_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let store = Store::open(&path).unwrap();
    let key = store.ensure_day_plan(date(2)).day_key;
    store.add_spot(&key, draft("Swim", Zone::Evening, 40)).unwrap();
    store.flush().unwrap();

    assert_eq!(store.export().unwrap(), fs::read_to_string(&path).unwrap());
}

#[test]
fn concurrent_commits_are_serialized_and_persisted_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let store = Arc::new(Store::open(&path).unwrap());
    let key = store.ensure_day_plan(date(3)).day_key;

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = Arc::clone(&store);
            let key = key.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    store
                        .add_spot(&key, draft(&format!("t{t}-{i}"), Zone::Daytime, 10))
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let in_memory = store.snapshot();
    let variant = in_memory.plan(&key).unwrap().active_variant().unwrap();
    assert_eq!(variant.spots.len(), 200);

    store.flush().unwrap();
    assert_eq!(load_state(&path).unwrap(), *in_memory);
}

#[test]
fn overloaded_day_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path().join("state.json")).unwrap();

    let mut config = store.snapshot().config.clone();
    config.overload_threshold_min = 15;
    config.tight_threshold_min = 5;
    config.rhythms.normal.budget_min = 420;
    store.set_config(config);

    let key = store.ensure_day_plan(date(4)).day_key;
    store.add_spot(&key, draft("Project", Zone::Daytime, 300)).unwrap();
    store.add_spot(&key, draft("Gym", Zone::Evening, 90)).unwrap();
    store.add_spot(&key, draft("Emails", Zone::Morning, 60)).unwrap();

    let state = store.snapshot();
    let variant = state.plan(&key).unwrap().active_variant().unwrap();
    assert_eq!(variant.total_planned_min(), 450);

    let insight = logic::analyze(variant, &state.config);
    assert_eq!(insight.delta_min, 30);
    assert_eq!(insight.status, LoadStatus::Overloaded);
    assert!(insight.suggestions.iter().any(|s| s.kind == FixKind::CreateVariant));
    assert!(insight.suggestions.iter().any(|s| s.kind == FixKind::Compress));

    // applying every compress suggestion eases the day
    for fix in insight.suggestions.iter().filter(|s| s.kind == FixKind::Compress) {
        assert!(store.apply_fix(&key, fix));
    }
    let state = store.snapshot();
    let variant = state.plan(&key).unwrap().active_variant().unwrap();
    assert_eq!(variant.total_planned_min(), 420);
    assert_eq!(logic::quick_status(variant, &state.config), LoadStatus::Comfortable);
}

#[test]
fn ensure_then_add_sees_the_new_plan() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path().join("state.json")).unwrap();

    let plan = store.ensure_day_plan(date(5));
    let seen = store.commit(|state| state.plan(&plan.day_key).map(|p| p.id));
    assert_eq!(seen, Some(plan.id));
    assert!(store.add_spot(&plan.day_key, draft("Walk", Zone::Evening, 20)).is_some());
}
